//! PUMA aggregator
//!
//! Sums household contributions per (state, PUMA) and takes weighted medians
//! of the household medians. Household weights are survey replication
//! weights here and must be non-negative integers.

use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::algorithm::median::{replicated_median, replication_weight, weighted_median};
use crate::error::Result;
use crate::models::geo::{PumaAggregate, WeightedTotals};
use crate::models::household::HouseholdRecord;
use crate::models::person::PumaKey;

/// Aggregate the households of one PUMA
///
/// Income uses the guarded weighted median (degenerate input gives a missing
/// median). Age uses the unguarded replication median, so a length mismatch
/// there is an error rather than a missing value.
pub fn aggregate_puma(key: PumaKey, households: &[HouseholdRecord]) -> Result<PumaAggregate> {
    let mut totals = WeightedTotals::default();
    let mut weights = Vec::with_capacity(households.len());
    let mut incomes = Vec::with_capacity(households.len());
    let mut ages = Vec::with_capacity(households.len());

    for household in households {
        let weight = replication_weight(
            household.hh_weight,
            &format!("household weight of {}", household.key),
        )?;
        totals += &WeightedTotals::from_household(household);
        weights.push(weight);
        incomes.push(household.median_income);
        ages.push(household.median_age);
    }

    Ok(PumaAggregate {
        key,
        totals,
        median_hh_income: weighted_median(&incomes, &weights)?,
        median_hh_age: replicated_median(&ages, &weights)?,
    })
}

/// Group households by PUMA and aggregate each group, sorted by PUMA
///
/// Consumes the household table so it is released once aggregated.
pub fn aggregate_pumas(
    households: Vec<HouseholdRecord>,
    parallel: bool,
) -> Result<Vec<PumaAggregate>> {
    let household_count = households.len();
    let mut groups: FxHashMap<PumaKey, Vec<HouseholdRecord>> = FxHashMap::default();
    for household in households {
        groups.entry(household.key.puma).or_default().push(household);
    }
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_unstable_by_key(|(key, _)| *key);

    info!(
        "Aggregating {household_count} households into {} PUMAs",
        groups.len()
    );

    let aggregate_one = |(key, members): &(PumaKey, Vec<HouseholdRecord>)| {
        aggregate_puma(*key, members)
    };
    if parallel {
        groups.par_iter().map(aggregate_one).collect()
    } else {
        groups.iter().map(aggregate_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MultigenError;
    use crate::models::household::HeadFlags;
    use crate::models::person::HouseholdKey;

    fn household(serial: u64, weight: f64, size: u32, multi_gen: bool) -> HouseholdRecord {
        let head = HeadFlags {
            white: true,
            ..HeadFlags::default()
        };
        HouseholdRecord {
            key: HouseholdKey::new(6, 100, serial),
            hh_weight: weight,
            hh_size: size,
            is_multi_gen: multi_gen,
            head,
            head_multigen: head.and(multi_gen),
            median_age: Some(30.0 + serial as f64),
            median_income: Some(10_000.0 * serial as f64),
        }
    }

    #[test]
    fn test_two_household_puma() {
        let households = vec![household(1, 5.0, 4, true), household(2, 3.0, 2, false)];
        let aggregate = aggregate_puma(PumaKey::new(6, 100), &households).unwrap();

        assert_eq!(aggregate.totals.total_hh, 8.0);
        assert_eq!(aggregate.totals.total_population, 26.0);
        assert_eq!(aggregate.totals.total_multi_gen, 5.0);
        assert_eq!(aggregate.totals.total_white_hoh, 8.0);
        assert_eq!(aggregate.totals.total_white_multigen, 5.0);
        assert_eq!(aggregate.rates().multi_gen_pct, Some(0.625));
        // {10k x5, 20k x3}
        assert_eq!(aggregate.median_hh_income, Some(10_000.0));
        assert_eq!(aggregate.median_hh_age, Some(31.0));
    }

    #[test]
    fn test_fractional_weight_is_fatal() {
        let households = vec![household(1, 2.5, 1, false)];
        assert!(matches!(
            aggregate_puma(PumaKey::new(6, 100), &households),
            Err(MultigenError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_all_missing_medians() {
        let mut h = household(1, 4.0, 1, false);
        h.median_income = None;
        h.median_age = None;
        let aggregate = aggregate_puma(PumaKey::new(6, 100), &[h]).unwrap();
        assert_eq!(aggregate.median_hh_income, None);
        assert_eq!(aggregate.median_hh_age, None);
        assert_eq!(aggregate.totals.total_hh, 4.0);
    }

    #[test]
    fn test_grouping_by_puma() {
        let mut other = household(3, 2.0, 1, true);
        other.key = HouseholdKey::new(6, 50, 3);
        let households = vec![household(1, 5.0, 4, true), other, household(2, 3.0, 2, false)];

        let pumas = aggregate_pumas(households, true).unwrap();
        assert_eq!(pumas.len(), 2);
        assert_eq!(pumas[0].key, PumaKey::new(6, 50));
        assert_eq!(pumas[0].totals.total_hh, 2.0);
        assert_eq!(pumas[1].totals.total_hh, 8.0);
    }
}
