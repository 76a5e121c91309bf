//! Geographic aggregates
//!
//! Weighted totals are additive and can be rescaled by an allocation factor;
//! rates are derived from totals after the final summation and are never
//! summed themselves.

use std::fmt;
use std::iter::Sum;
use std::ops::AddAssign;

use serde::Serialize;

use crate::models::household::{HeadCategory, HouseholdRecord};
use crate::models::person::PumaKey;

/// Divide two weighted totals; a zero denominator has no defined rate
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Horvitz-Thompson weighted totals for one geographic unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WeightedTotals {
    pub total_hh: f64,
    pub total_population: f64,
    pub total_multi_gen: f64,
    pub total_black_hoh: f64,
    pub total_asian_hoh: f64,
    pub total_hispanic_hoh: f64,
    pub total_white_hoh: f64,
    pub total_non_white_hoh: f64,
    pub total_black_multigen: f64,
    pub total_asian_multigen: f64,
    pub total_hispanic_multigen: f64,
    pub total_white_multigen: f64,
    pub total_non_white_multigen: f64,
}

impl WeightedTotals {
    /// Contribution of a single household
    #[must_use]
    pub fn from_household(household: &HouseholdRecord) -> Self {
        let w = household.hh_weight;
        let weigh = |flag: bool| if flag { w } else { 0.0 };

        Self {
            total_hh: w,
            total_population: f64::from(household.hh_size) * w,
            total_multi_gen: weigh(household.is_multi_gen),
            total_black_hoh: weigh(household.head.black),
            total_asian_hoh: weigh(household.head.asian),
            total_hispanic_hoh: weigh(household.head.hispanic),
            total_white_hoh: weigh(household.head.white),
            total_non_white_hoh: weigh(household.head.non_white),
            total_black_multigen: weigh(household.head_multigen.black),
            total_asian_multigen: weigh(household.head_multigen.asian),
            total_hispanic_multigen: weigh(household.head_multigen.hispanic),
            total_white_multigen: weigh(household.head_multigen.white),
            total_non_white_multigen: weigh(household.head_multigen.non_white),
        }
    }

    /// Every total multiplied by `factor`
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            total_hh: self.total_hh * factor,
            total_population: self.total_population * factor,
            total_multi_gen: self.total_multi_gen * factor,
            total_black_hoh: self.total_black_hoh * factor,
            total_asian_hoh: self.total_asian_hoh * factor,
            total_hispanic_hoh: self.total_hispanic_hoh * factor,
            total_white_hoh: self.total_white_hoh * factor,
            total_non_white_hoh: self.total_non_white_hoh * factor,
            total_black_multigen: self.total_black_multigen * factor,
            total_asian_multigen: self.total_asian_multigen * factor,
            total_hispanic_multigen: self.total_hispanic_multigen * factor,
            total_white_multigen: self.total_white_multigen * factor,
            total_non_white_multigen: self.total_non_white_multigen * factor,
        }
    }

    /// Weighted count of households headed by `category`
    #[must_use]
    pub fn head_total(&self, category: HeadCategory) -> f64 {
        match category {
            HeadCategory::Black => self.total_black_hoh,
            HeadCategory::Asian => self.total_asian_hoh,
            HeadCategory::Hispanic => self.total_hispanic_hoh,
            HeadCategory::White => self.total_white_hoh,
            HeadCategory::NonWhite => self.total_non_white_hoh,
        }
    }

    /// Weighted count of multigenerational households headed by `category`
    #[must_use]
    pub fn multigen_total(&self, category: HeadCategory) -> f64 {
        match category {
            HeadCategory::Black => self.total_black_multigen,
            HeadCategory::Asian => self.total_asian_multigen,
            HeadCategory::Hispanic => self.total_hispanic_multigen,
            HeadCategory::White => self.total_white_multigen,
            HeadCategory::NonWhite => self.total_non_white_multigen,
        }
    }

    /// Derive the multigenerational rates from these totals
    #[must_use]
    pub fn rates(&self) -> MultigenRates {
        let category = |c: HeadCategory| ratio(self.multigen_total(c), self.head_total(c));
        MultigenRates {
            multi_gen_pct: ratio(self.total_multi_gen, self.total_hh),
            black_multigen_pct: category(HeadCategory::Black),
            asian_multigen_pct: category(HeadCategory::Asian),
            hispanic_multigen_pct: category(HeadCategory::Hispanic),
            white_multigen_pct: category(HeadCategory::White),
            non_white_multigen_pct: category(HeadCategory::NonWhite),
        }
    }
}

impl AddAssign<&WeightedTotals> for WeightedTotals {
    fn add_assign(&mut self, other: &WeightedTotals) {
        self.total_hh += other.total_hh;
        self.total_population += other.total_population;
        self.total_multi_gen += other.total_multi_gen;
        self.total_black_hoh += other.total_black_hoh;
        self.total_asian_hoh += other.total_asian_hoh;
        self.total_hispanic_hoh += other.total_hispanic_hoh;
        self.total_white_hoh += other.total_white_hoh;
        self.total_non_white_hoh += other.total_non_white_hoh;
        self.total_black_multigen += other.total_black_multigen;
        self.total_asian_multigen += other.total_asian_multigen;
        self.total_hispanic_multigen += other.total_hispanic_multigen;
        self.total_white_multigen += other.total_white_multigen;
        self.total_non_white_multigen += other.total_non_white_multigen;
    }
}

impl<'a> Sum<&'a WeightedTotals> for WeightedTotals {
    fn sum<I: Iterator<Item = &'a WeightedTotals>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, totals| {
            acc += totals;
            acc
        })
    }
}

/// Multigenerational rates as fractions in [0, 1]; `None` where the
/// denominator is zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MultigenRates {
    pub multi_gen_pct: Option<f64>,
    pub black_multigen_pct: Option<f64>,
    pub asian_multigen_pct: Option<f64>,
    pub hispanic_multigen_pct: Option<f64>,
    pub white_multigen_pct: Option<f64>,
    pub non_white_multigen_pct: Option<f64>,
}

/// County identified by state and county FIPS codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountyFips {
    pub state: u16,
    pub county: u16,
}

impl CountyFips {
    #[must_use]
    pub fn new(state: u16, county: u16) -> Self {
        Self { state, county }
    }

    /// Parse a five-digit state+county code such as `"06037"`
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.is_empty() || code.len() > 5 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u32 = code.parse().ok()?;
        Some(Self {
            state: u16::try_from(value / 1000).ok()?,
            county: u16::try_from(value % 1000).ok()?,
        })
    }
}

impl fmt::Display for CountyFips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:03}", self.state, self.county)
    }
}

/// Aggregate over one geographic unit
#[derive(Debug, Clone, PartialEq)]
pub struct GeoAggregate<K> {
    /// Geographic unit
    pub key: K,
    /// Additive weighted totals
    pub totals: WeightedTotals,
    /// Weighted median household income
    pub median_hh_income: Option<f64>,
    /// Weighted median household age
    pub median_hh_age: Option<f64>,
}

impl<K> GeoAggregate<K> {
    /// Rates derived from the totals
    #[must_use]
    pub fn rates(&self) -> MultigenRates {
        self.totals.rates()
    }
}

/// PUMA-level aggregate
pub type PumaAggregate = GeoAggregate<PumaKey>;
/// County-level aggregate
pub type CountyAggregate = GeoAggregate<CountyFips>;
/// State-level aggregate
pub type StateAggregate = GeoAggregate<u16>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_denominator_is_undefined() {
        assert_eq!(ratio(0.0, 0.0), None);
        assert_eq!(ratio(0.0, 5.0), Some(0.0));
        assert_ne!(ratio(0.0, 0.0), ratio(0.0, 5.0));
    }

    #[test]
    fn test_rates_for_empty_category() {
        let totals = WeightedTotals {
            total_hh: 8.0,
            total_multi_gen: 5.0,
            total_white_hoh: 8.0,
            total_white_multigen: 5.0,
            ..WeightedTotals::default()
        };
        let rates = totals.rates();
        assert_eq!(rates.multi_gen_pct, Some(0.625));
        assert_eq!(rates.white_multigen_pct, Some(0.625));
        assert_eq!(rates.hispanic_multigen_pct, None);
    }

    #[test]
    fn test_scale_and_sum() {
        let a = WeightedTotals {
            total_hh: 10.0,
            total_population: 25.0,
            total_black_hoh: 4.0,
            ..WeightedTotals::default()
        };
        let b = a.scaled(0.5);
        assert_eq!(b.total_hh, 5.0);
        assert_eq!(b.total_population, 12.5);

        let sum: WeightedTotals = [a, b].iter().sum();
        assert_eq!(sum.total_hh, 15.0);
        assert_eq!(sum.total_black_hoh, 6.0);
    }

    #[test]
    fn test_county_fips_parse() {
        let fips = CountyFips::parse("06037").unwrap();
        assert_eq!(fips, CountyFips::new(6, 37));
        assert_eq!(fips.to_string(), "06037");
        assert_eq!(CountyFips::parse("1001"), Some(CountyFips::new(1, 1)));
        assert_eq!(CountyFips::parse("County code"), None);
        assert_eq!(CountyFips::parse(""), None);
    }
}
