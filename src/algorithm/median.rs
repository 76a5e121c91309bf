//! Median and weighted-median helpers
//!
//! The weighted median follows the replication rule: each value is repeated
//! as many times as its weight and the ordinary median of the resulting
//! multiset is taken. The multiset is never materialized; the two middle
//! positions are located on the cumulative weight instead, which gives the
//! same answer for integer weights and extends naturally to fractional
//! allocation weights.

use crate::error::{MultigenError, Result};

/// Relative tolerance for comparing a cumulative weight with the midpoint
const MIDPOINT_TOLERANCE: f64 = 1e-9;

/// Median of the non-missing values, or `None` if every value is missing
#[must_use]
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(f64::total_cmp);

    let mid = present.len() / 2;
    if present.len() % 2 == 1 {
        Some(present[mid])
    } else {
        Some((present[mid - 1] + present[mid]) / 2.0)
    }
}

/// Weighted median over `(value, weight)` pairs with non-negative real weights
///
/// Returns the midpoint of the lower and upper weighted medians, which is the
/// ordinary median of the replicated multiset when weights are integers.
/// Returns `None` when the total weight is zero.
#[must_use]
pub fn weighted_median_real(pairs: &mut [(f64, f64)]) -> Option<f64> {
    let total: f64 = pairs.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let half = total / 2.0;
    // Allocated shares carry rounding error; a cumulative weight this close
    // to the midpoint is treated as reaching it exactly
    let tolerance = total * MIDPOINT_TOLERANCE;
    let mut cumulative = 0.0;
    let mut lower = None;
    for &(value, weight) in pairs.iter().filter(|(_, w)| *w > 0.0) {
        cumulative += weight;
        if lower.is_none() && cumulative >= half - tolerance {
            lower = Some(value);
        }
        if cumulative > half + tolerance {
            return lower.map(|low| (low + value) / 2.0);
        }
    }
    lower
}

/// Validate a survey weight used as a replication count
pub fn replication_weight(weight: f64, context: &str) -> Result<f64> {
    if weight.is_finite() && weight >= 0.0 && weight.fract() == 0.0 {
        Ok(weight)
    } else {
        Err(MultigenError::InvalidWeight {
            context: context.to_string(),
            weight,
        })
    }
}

/// Weighted median by replication, without a guard for degenerate input
///
/// Value and weight lists of different length are an error. Missing values
/// are dropped together with their weights. Every weight must be a
/// non-negative integer.
pub fn replicated_median(values: &[Option<f64>], weights: &[f64]) -> Result<Option<f64>> {
    if values.len() != weights.len() {
        return Err(MultigenError::LengthMismatch {
            values: values.len(),
            weights: weights.len(),
        });
    }

    let mut pairs = Vec::with_capacity(values.len());
    for (value, &weight) in values.iter().zip(weights) {
        let weight = replication_weight(weight, "weighted median")?;
        if let Some(value) = value {
            pairs.push((*value, weight));
        }
    }
    Ok(weighted_median_real(&mut pairs))
}

/// Weighted median by replication with a guard for degenerate input
///
/// Empty input or value and weight lists of different length give `None`
/// instead of an error; otherwise identical to [`replicated_median`].
pub fn weighted_median(values: &[Option<f64>], weights: &[f64]) -> Result<Option<f64>> {
    if values.is_empty() || weights.is_empty() || values.len() != weights.len() {
        return Ok(None);
    }
    replicated_median(values, weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_median_ignores_missing() {
        assert_eq!(median([Some(3.0), None, Some(1.0), Some(2.0)]), Some(2.0));
        assert_eq!(median([Some(4.0), Some(1.0), None, Some(3.0), Some(2.0)]), Some(2.5));
        assert_eq!(median([None, None]), None);
        assert_eq!(median(std::iter::empty()), None);
    }

    #[test]
    fn test_weighted_median_uniform_weights() {
        let values = some(&[10.0, 20.0, 30.0]);
        assert_eq!(weighted_median(&values, &[1.0, 1.0, 1.0]).unwrap(), Some(20.0));
    }

    #[test]
    fn test_weighted_median_replication() {
        let values = some(&[10.0, 20.0, 30.0]);
        // Multiset {10, 10, 10, 20, 30}
        assert_eq!(weighted_median(&values, &[3.0, 1.0, 1.0]).unwrap(), Some(10.0));
        // Multiset {10, 20, 30, 30}
        assert_eq!(weighted_median(&values, &[1.0, 1.0, 2.0]).unwrap(), Some(25.0));
    }

    #[test]
    fn test_weighted_median_matches_explicit_replication() {
        let values = [7.0, 3.0, 12.0, 5.0];
        let weights = [2.0, 5.0, 1.0, 4.0];

        let mut replicated = Vec::new();
        for (v, w) in values.iter().zip(weights) {
            for _ in 0..w as usize {
                replicated.push(Some(*v));
            }
        }
        let expected = median(replicated);

        assert_eq!(weighted_median(&some(&values), &weights).unwrap(), expected);
    }

    #[test]
    fn test_weighted_median_degenerate_guard() {
        assert_eq!(weighted_median(&some(&[1.0, 2.0]), &[1.0, 2.0, 3.0]).unwrap(), None);
        assert_eq!(weighted_median(&[], &[]).unwrap(), None);
        assert_eq!(weighted_median(&some(&[1.0]), &[]).unwrap(), None);
    }

    #[test]
    fn test_replicated_median_has_no_length_guard() {
        let result = replicated_median(&some(&[1.0, 2.0]), &[1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(MultigenError::LengthMismatch { values: 2, weights: 3 })
        ));
        assert_eq!(replicated_median(&[], &[]).unwrap(), None);
    }

    #[test]
    fn test_missing_values_and_zero_weights() {
        let values = vec![None, Some(5.0), Some(9.0)];
        assert_eq!(weighted_median(&values, &[10.0, 1.0, 1.0]).unwrap(), Some(7.0));
        assert_eq!(weighted_median(&[None, None], &[1.0, 1.0]).unwrap(), None);
        assert_eq!(weighted_median(&some(&[5.0, 9.0]), &[0.0, 0.0]).unwrap(), None);
    }

    #[test]
    fn test_fractional_or_negative_weight_fails() {
        let values = some(&[1.0, 2.0]);
        assert!(matches!(
            weighted_median(&values, &[1.5, 1.0]),
            Err(MultigenError::InvalidWeight { .. })
        ));
        assert!(replicated_median(&values, &[-1.0, 1.0]).is_err());
        assert!(replication_weight(f64::NAN, "test").is_err());
    }

    #[test]
    fn test_real_weights() {
        let mut pairs = vec![(1.0, 0.2), (2.0, 0.2), (3.0, 0.6)];
        assert_eq!(weighted_median_real(&mut pairs), Some(3.0));

        let mut even = vec![(1.0, 0.5), (2.0, 0.5)];
        assert_eq!(weighted_median_real(&mut even), Some(1.5));
    }

    #[test]
    fn test_real_weight_midpoint_tie_survives_rounding() {
        // 0.1 + 0.1 + 0.1 and 0.3 differ in the last bit
        let mut split_low = vec![(1.0, 0.1), (1.0, 0.1), (1.0, 0.1), (2.0, 0.3)];
        let mut split_high = vec![(1.0, 0.3), (2.0, 0.1), (2.0, 0.1), (2.0, 0.1)];
        assert_eq!(weighted_median_real(&mut split_low), Some(1.5));
        assert_eq!(weighted_median_real(&mut split_high), Some(1.5));

        let mut allocated = vec![(40_000.0, 3.0 * 0.1), (90_000.0, 0.3)];
        assert_eq!(weighted_median_real(&mut allocated), Some(65_000.0));
    }
}
