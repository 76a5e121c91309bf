//! Geographic re-aggregation
//!
//! Redistributes PUMA aggregates onto a target geography. Every source
//! aggregate is split across its targets by allocation factor, each share of
//! the weighted totals is scaled by that factor, and shares are summed per
//! target. Sources without any target contribute nothing; their weight is
//! reported instead of silently disappearing.

use std::fmt::Display;
use std::hash::Hash;

use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::{SmallVec, smallvec};

use crate::algorithm::median::weighted_median_real;
use crate::models::crosswalk::Crosswalk;
use crate::models::geo::{CountyAggregate, GeoAggregate, PumaAggregate, StateAggregate, WeightedTotals};

/// Allocation of one source unit: `(target, factor)` pairs
pub type Allocation<T> = SmallVec<[(T, f64); 4]>;

/// Diagnostics of one re-aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReaggregationReport {
    /// Source units seen
    pub source_units: usize,
    /// Source units with at least one target
    pub matched_units: usize,
    /// Source units with no target
    pub unmatched_units: usize,
    /// Identifiers of unmatched source units
    pub unmatched_keys: Vec<String>,
    /// Weighted households of all source units
    pub source_hh: f64,
    /// Weighted households summed over all targets
    pub allocated_hh: f64,
    /// Weighted households of unmatched source units
    pub unmatched_hh: f64,
    /// Weighted population of unmatched source units
    pub unmatched_population: f64,
    /// Weighted households lost (or gained, if negative) because a matched
    /// unit's factors do not sum to 1
    pub shortfall_hh: f64,
}

impl ReaggregationReport {
    /// `allocated + unmatched + shortfall - source`; zero up to rounding
    #[must_use]
    pub fn conservation_error(&self) -> f64 {
        self.allocated_hh + self.unmatched_hh + self.shortfall_hh - self.source_hh
    }
}

#[derive(Default)]
struct Accumulator {
    totals: WeightedTotals,
    incomes: Vec<(f64, f64)>,
    ages: Vec<(f64, f64)>,
}

/// Re-aggregate `sources` onto the targets returned by `allocate`
///
/// Target medians are weighted medians of the source medians, weighted by
/// the allocated household total of each share.
pub fn reaggregate<K, T, F>(
    sources: &[GeoAggregate<K>],
    allocate: F,
) -> (Vec<GeoAggregate<T>>, ReaggregationReport)
where
    K: Display,
    T: Copy + Eq + Hash + Ord,
    F: Fn(&K) -> Allocation<T>,
{
    let mut report = ReaggregationReport {
        source_units: sources.len(),
        ..ReaggregationReport::default()
    };
    let mut groups: FxHashMap<T, Accumulator> = FxHashMap::default();

    for source in sources {
        report.source_hh += source.totals.total_hh;
        let targets = allocate(&source.key);
        if targets.is_empty() {
            report.unmatched_units += 1;
            report.unmatched_keys.push(source.key.to_string());
            report.unmatched_hh += source.totals.total_hh;
            report.unmatched_population += source.totals.total_population;
            continue;
        }

        report.matched_units += 1;
        let factor_sum: f64 = targets.iter().map(|(_, afact)| afact).sum();
        report.shortfall_hh += source.totals.total_hh * (1.0 - factor_sum);

        for (target, afact) in targets {
            let share = source.totals.scaled(afact);
            let accumulator = groups.entry(target).or_default();
            accumulator.totals += &share;
            if let Some(income) = source.median_hh_income {
                accumulator.incomes.push((income, share.total_hh));
            }
            if let Some(age) = source.median_hh_age {
                accumulator.ages.push((age, share.total_hh));
            }
        }
    }

    let mut aggregates: Vec<GeoAggregate<T>> = groups
        .into_iter()
        .map(|(key, mut accumulator)| GeoAggregate {
            key,
            totals: accumulator.totals,
            median_hh_income: weighted_median_real(&mut accumulator.incomes),
            median_hh_age: weighted_median_real(&mut accumulator.ages),
        })
        .collect();
    aggregates.sort_unstable_by_key(|aggregate| aggregate.key);

    report.allocated_hh = aggregates.iter().map(|a| a.totals.total_hh).sum();

    if report.unmatched_units > 0 {
        warn!(
            "{} of {} source units had no allocation target; dropped {:.1} weighted households ({:.1} persons)",
            report.unmatched_units,
            report.source_units,
            report.unmatched_hh,
            report.unmatched_population
        );
    }

    (aggregates, report)
}

/// Re-aggregate PUMA aggregates onto counties through a crosswalk
#[must_use]
pub fn aggregate_counties(
    pumas: &[PumaAggregate],
    crosswalk: &Crosswalk,
) -> (Vec<CountyAggregate>, ReaggregationReport) {
    let (counties, report) = reaggregate(pumas, |key| {
        SmallVec::from_slice(crosswalk.targets(key))
    });
    info!(
        "Re-aggregated {} PUMAs onto {} counties",
        report.matched_units,
        counties.len()
    );
    (counties, report)
}

/// Aggregate PUMA aggregates to their states; every PUMA maps to its own
/// state with factor 1
#[must_use]
pub fn aggregate_states(pumas: &[PumaAggregate]) -> (Vec<StateAggregate>, ReaggregationReport) {
    let (states, report) = reaggregate(pumas, |key| smallvec![(key.state, 1.0)]);
    info!("Aggregated {} PUMAs into {} states", pumas.len(), states.len());
    (states, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crosswalk::CrosswalkEntry;
    use crate::models::geo::CountyFips;
    use crate::models::person::PumaKey;

    fn puma(state: u16, code: u32, total_hh: f64, multi_gen: f64) -> PumaAggregate {
        PumaAggregate {
            key: PumaKey::new(state, code),
            totals: WeightedTotals {
                total_hh,
                total_population: total_hh * 2.5,
                total_multi_gen: multi_gen,
                ..WeightedTotals::default()
            },
            median_hh_income: Some(f64::from(code) * 100.0),
            median_hh_age: Some(40.0),
        }
    }

    fn entry(state: u16, code: u32, county: u16, afact: f64) -> CrosswalkEntry {
        CrosswalkEntry::new(PumaKey::new(state, code), CountyFips::new(state, county), afact)
            .unwrap()
    }

    #[test]
    fn test_split_puma() {
        let pumas = vec![puma(6, 100, 100.0, 20.0), puma(6, 200, 50.0, 0.0)];
        let crosswalk = Crosswalk::new(vec![
            entry(6, 100, 1, 0.25),
            entry(6, 100, 3, 0.75),
            entry(6, 200, 3, 1.0),
        ]);

        let (counties, report) = aggregate_counties(&pumas, &crosswalk);
        assert_eq!(counties.len(), 2);
        assert_eq!(counties[0].key, CountyFips::new(6, 1));
        assert_eq!(counties[0].totals.total_hh, 25.0);
        assert_eq!(counties[0].totals.total_multi_gen, 5.0);
        assert_eq!(counties[1].totals.total_hh, 125.0);
        assert_eq!(counties[1].totals.total_multi_gen, 15.0);
        assert_eq!(counties[1].rates().multi_gen_pct, Some(0.12));
        // 75 households at 10k, 50 at 20k
        assert_eq!(counties[1].median_hh_income, Some(10_000.0));

        assert_eq!(report.unmatched_units, 0);
        assert!(report.conservation_error().abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_puma_is_reported() {
        let pumas = vec![puma(6, 100, 100.0, 20.0), puma(6, 999, 40.0, 4.0)];
        let crosswalk = Crosswalk::new(vec![entry(6, 100, 1, 1.0)]);

        let (counties, report) = aggregate_counties(&pumas, &crosswalk);
        assert_eq!(counties.len(), 1);
        assert_eq!(report.unmatched_units, 1);
        assert_eq!(report.unmatched_keys, vec!["06-00999".to_string()]);
        assert_eq!(report.unmatched_hh, 40.0);
        assert_eq!(report.unmatched_population, 100.0);
        assert_eq!(report.allocated_hh + report.unmatched_hh, report.source_hh);
    }

    #[test]
    fn test_shortfall_keeps_conservation() {
        let pumas = vec![puma(6, 100, 100.0, 20.0)];
        let crosswalk = Crosswalk::new(vec![entry(6, 100, 1, 0.6)]);
        let (_, report) = aggregate_counties(&pumas, &crosswalk);
        assert!((report.shortfall_hh - 40.0).abs() < 1e-9);
        assert!(report.conservation_error().abs() < 1e-9);
    }

    #[test]
    fn test_states_use_unit_factor() {
        let pumas = vec![
            puma(6, 100, 100.0, 20.0),
            puma(6, 200, 50.0, 10.0),
            puma(41, 100, 10.0, 0.0),
        ];
        let (states, report) = aggregate_states(&pumas);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].key, 6);
        assert_eq!(states[0].totals.total_hh, 150.0);
        assert_eq!(states[0].rates().multi_gen_pct, Some(0.2));
        assert_eq!(states[1].rates().multi_gen_pct, Some(0.0));
        assert_eq!(states[1].rates().black_multigen_pct, None);
        assert_eq!(report.unmatched_units, 0);
        assert_eq!(report.shortfall_hh, 0.0);
    }
}
