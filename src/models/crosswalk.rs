//! PUMA to county allocation crosswalk

use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{MultigenError, Result};
use crate::models::geo::CountyFips;
use crate::models::person::PumaKey;

/// One crosswalk row: a share of a source PUMA allocated to a county
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrosswalkEntry {
    /// Source PUMA
    pub source: PumaKey,
    /// Target county
    pub county: CountyFips,
    /// Fraction of the PUMA falling in the county
    pub afact: f64,
}

impl CrosswalkEntry {
    /// Create an entry, rejecting allocation factors outside [0, 1]
    pub fn new(source: PumaKey, county: CountyFips, afact: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&afact) {
            return Err(MultigenError::InvalidWeight {
                context: format!("allocation factor of PUMA {source} to county {county}"),
                weight: afact,
            });
        }
        Ok(Self {
            source,
            county,
            afact,
        })
    }
}

/// Allocation targets of one PUMA; most PUMAs touch only a few counties
pub type Targets = SmallVec<[(CountyFips, f64); 4]>;

/// Crosswalk indexed by source PUMA
#[derive(Debug, Clone, Default)]
pub struct Crosswalk {
    by_puma: FxHashMap<PumaKey, Targets>,
    entry_count: usize,
}

impl Crosswalk {
    /// Index a list of entries by source PUMA
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = CrosswalkEntry>) -> Self {
        let mut by_puma: FxHashMap<PumaKey, Targets> = FxHashMap::default();
        let mut entry_count = 0;
        for entry in entries {
            by_puma
                .entry(entry.source)
                .or_default()
                .push((entry.county, entry.afact));
            entry_count += 1;
        }
        Self {
            by_puma,
            entry_count,
        }
    }

    /// Counties a PUMA is allocated to, with their factors; empty if the
    /// PUMA is not in the crosswalk
    #[must_use]
    pub fn targets(&self, puma: &PumaKey) -> &[(CountyFips, f64)] {
        self.by_puma.get(puma).map_or(&[], |targets| targets.as_slice())
    }

    /// Number of crosswalk rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.entry_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Number of distinct source PUMAs
    #[must_use]
    pub fn puma_count(&self) -> usize {
        self.by_puma.len()
    }

    /// Sum of allocation factors of one PUMA
    #[must_use]
    pub fn factor_sum(&self, puma: &PumaKey) -> f64 {
        self.targets(puma).iter().map(|(_, afact)| afact).sum()
    }

    /// PUMAs whose factors do not sum to 1 within `tolerance`, sorted by key
    #[must_use]
    pub fn unbalanced_pumas(&self, tolerance: f64) -> Vec<(PumaKey, f64)> {
        let unbalanced = self
            .by_puma
            .keys()
            .map(|puma| (*puma, self.factor_sum(puma)))
            .filter(|(_, sum)| (sum - 1.0).abs() > tolerance)
            .sorted_by_key(|(puma, _)| *puma)
            .collect::<Vec<_>>();

        if !unbalanced.is_empty() {
            warn!(
                "{} crosswalk PUMAs have allocation factors not summing to 1 (first: {})",
                unbalanced.len(),
                unbalanced
                    .iter()
                    .take(5)
                    .map(|(puma, sum)| format!("{puma}={sum:.4}"))
                    .join(", ")
            );
        }
        unbalanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(puma: u32, county: u16, afact: f64) -> CrosswalkEntry {
        CrosswalkEntry::new(PumaKey::new(6, puma), CountyFips::new(6, county), afact).unwrap()
    }

    #[test]
    fn test_targets_and_sums() {
        let crosswalk = Crosswalk::new(vec![
            entry(100, 1, 0.25),
            entry(100, 3, 0.75),
            entry(200, 5, 1.0),
        ]);

        assert_eq!(crosswalk.len(), 3);
        assert_eq!(crosswalk.puma_count(), 2);
        assert_eq!(crosswalk.targets(&PumaKey::new(6, 100)).len(), 2);
        assert!(crosswalk.targets(&PumaKey::new(6, 300)).is_empty());
        assert!((crosswalk.factor_sum(&PumaKey::new(6, 100)) - 1.0).abs() < 1e-12);
        assert!(crosswalk.unbalanced_pumas(1e-6).is_empty());
    }

    #[test]
    fn test_unbalanced_detection() {
        let crosswalk = Crosswalk::new(vec![entry(100, 1, 0.5), entry(200, 5, 1.0)]);
        let unbalanced = crosswalk.unbalanced_pumas(1e-3);
        assert_eq!(unbalanced, vec![(PumaKey::new(6, 100), 0.5)]);
    }

    #[test]
    fn test_factor_out_of_range() {
        let result = CrosswalkEntry::new(PumaKey::new(1, 1), CountyFips::new(1, 1), 1.5);
        assert!(matches!(result, Err(MultigenError::InvalidWeight { .. })));
    }
}
