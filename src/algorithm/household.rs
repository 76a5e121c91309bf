//! Household reducer
//!
//! Groups person rows by household identity and reduces each group to one
//! `HouseholdRecord`. Household-level fields that every member row carries
//! (weight, multigenerational status) are checked for agreement; the
//! configured policy decides whether disagreement aborts the run or is
//! resolved by mean / logical OR.

use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::algorithm::classifier::{PersonFlags, RowClassifier};
use crate::algorithm::median::median;
use crate::config::{PipelineConfig, ReconcilePolicy};
use crate::error::{MultigenError, Result};
use crate::models::household::{HeadFlags, HouseholdRecord};
use crate::models::person::{HouseholdKey, PersonRecord};

/// Member rows of one household; most households have few members
pub type Members = SmallVec<[PersonRecord; 8]>;

/// Disagreements found while reducing one household
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Member rows carried different household weights
    pub weight_disagreement: bool,
    /// Member rows disagreed on multigenerational status
    pub multigen_disagreement: bool,
    /// More than one member row is coded as head
    pub multiple_heads: bool,
}

impl Reconciliation {
    fn is_clean(&self) -> bool {
        !(self.weight_disagreement || self.multigen_disagreement || self.multiple_heads)
    }
}

/// Counts collected over a reduction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReductionStats {
    /// Person rows consumed
    pub persons: usize,
    /// Households produced
    pub households: usize,
    /// Households whose member weights disagreed
    pub weight_disagreements: usize,
    /// Households whose member multigenerational flags disagreed
    pub multigen_disagreements: usize,
    /// Households with more than one head row
    pub multiple_heads: usize,
    /// Households with no head row
    pub headless: usize,
}

/// Group person rows by household identity, sorted by key
///
/// Consumes the person table so it is released once grouped.
#[must_use]
pub fn group_households(persons: Vec<PersonRecord>) -> Vec<(HouseholdKey, Members)> {
    let mut groups: FxHashMap<HouseholdKey, Members> = FxHashMap::default();
    for person in persons {
        groups.entry(person.household).or_default().push(person);
    }
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_unstable_by_key(|(key, _)| *key);
    groups
}

/// Reduces person rows to household records
#[derive(Debug, Clone, Copy, Default)]
pub struct HouseholdReducer {
    classifier: RowClassifier,
    policy: ReconcilePolicy,
}

impl HouseholdReducer {
    #[must_use]
    pub fn new(classifier: RowClassifier, policy: ReconcilePolicy) -> Self {
        Self { classifier, policy }
    }

    /// Reducer configured from a pipeline configuration
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            RowClassifier::new(config.multigen_definition),
            config.reconcile_policy,
        )
    }

    /// Reduce the member rows of one household
    ///
    /// `members` must be non-empty and share `key`.
    pub fn reduce_household(
        &self,
        key: HouseholdKey,
        members: &[PersonRecord],
    ) -> Result<(HouseholdRecord, Reconciliation)> {
        let Some(first) = members.first() else {
            return Err(MultigenError::InconsistentHousehold {
                key: key.to_string(),
                detail: "household has no member rows".to_string(),
            });
        };

        let flags: SmallVec<[PersonFlags; 8]> =
            members.iter().map(|p| self.classifier.classify(p)).collect();
        let any = |f: fn(&PersonFlags) -> bool| flags.iter().any(f);

        let reconciliation = Reconciliation {
            weight_disagreement: members.iter().any(|p| p.hh_weight != first.hh_weight),
            multigen_disagreement: any(|f| f.is_multi_gen) && !flags.iter().all(|f| f.is_multi_gen),
            multiple_heads: flags.iter().filter(|f| f.is_head).count() > 1,
        };
        if !reconciliation.is_clean() {
            if self.policy == ReconcilePolicy::Strict {
                return Err(MultigenError::InconsistentHousehold {
                    key: key.to_string(),
                    detail: format!("{reconciliation:?}"),
                });
            }
            debug!("Reconciling household {key}: {reconciliation:?}");
        }

        let hh_weight = members.iter().map(|p| p.hh_weight).sum::<f64>() / members.len() as f64;
        let is_multi_gen = any(|f| f.is_multi_gen);

        // Extra head rows are ignored so the categories stay exclusive
        let head_row = flags.iter().find(|f| f.is_head).copied().unwrap_or_default();
        let head = HeadFlags {
            black: head_row.black_head,
            asian: head_row.asian_head,
            hispanic: head_row.hispanic_head && !head_row.black_head && !head_row.asian_head,
            white: head_row.white_head,
            non_white: head_row.non_white_head,
        };

        let record = HouseholdRecord {
            key,
            hh_weight,
            hh_size: members.len() as u32,
            is_multi_gen,
            head,
            head_multigen: head.and(is_multi_gen),
            median_age: median(members.iter().map(|p| p.age.map(f64::from))),
            median_income: median(members.iter().map(|p| p.hh_income.map(|i| i as f64))),
        };
        Ok((record, reconciliation))
    }

    /// Group and reduce a whole person table
    pub fn reduce(
        &self,
        persons: Vec<PersonRecord>,
        parallel: bool,
    ) -> Result<(Vec<HouseholdRecord>, ReductionStats)> {
        let person_count = persons.len();
        let groups = group_households(persons);
        info!(
            "Reducing {person_count} person rows into {} households",
            groups.len()
        );

        let headless = groups
            .iter()
            .filter(|(_, members)| !members.iter().any(|p| p.relationship.is_head()))
            .count();

        let reduce_one = |(key, members): &(HouseholdKey, Members)| {
            self.reduce_household(*key, members)
        };
        let reduced: Vec<(HouseholdRecord, Reconciliation)> = if parallel {
            groups.par_iter().map(reduce_one).collect::<Result<_>>()?
        } else {
            groups.iter().map(reduce_one).collect::<Result<_>>()?
        };
        drop(groups);

        let mut stats = ReductionStats {
            persons: person_count,
            households: reduced.len(),
            headless,
            ..ReductionStats::default()
        };
        let mut households = Vec::with_capacity(reduced.len());
        for (household, reconciliation) in reduced {
            stats.weight_disagreements += usize::from(reconciliation.weight_disagreement);
            stats.multigen_disagreements += usize::from(reconciliation.multigen_disagreement);
            stats.multiple_heads += usize::from(reconciliation.multiple_heads);
            households.push(household);
        }

        if stats.weight_disagreements > 0
            || stats.multigen_disagreements > 0
            || stats.multiple_heads > 0
        {
            warn!(
                "Reconciled inconsistent households: {} weight, {} multigenerational, {} multiple heads",
                stats.weight_disagreements, stats.multigen_disagreements, stats.multiple_heads
            );
        }
        if stats.headless > 0 {
            warn!("{} households have no head row", stats.headless);
        }

        Ok((households, stats))
    }
}
