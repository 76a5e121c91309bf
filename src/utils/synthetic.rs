//! Seeded synthetic microdata
//!
//! Generates coded person rows and a matching crosswalk for demos and
//! property tests. Households are internally consistent: every member
//! shares the household weight, income and multigenerational code, and
//! the first member is always the head.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::models::crosswalk::{Crosswalk, CrosswalkEntry};
use crate::models::geo::CountyFips;
use crate::models::person::{PersonRecord, PumaKey, RawPersonRow, decode_rows};
use crate::models::types::MISSING_SENTINEL;

const MULTIGEN_CODES: [i64; 4] = [22, 23, 31, 32];
const OTHER_CODES: [i64; 3] = [10, 20, 21];
const HISPANIC_CODES: [i64; 4] = [1, 2, 3, 4];

/// Shape of a synthetic population
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Number of states, numbered from 1
    pub states: u16,
    pub pumas_per_state: u32,
    pub households_per_puma: usize,
    /// Probability that a household is multigenerational
    pub multigen_share: f64,
    /// Probability that a household's income is the missing sentinel
    pub income_missing_share: f64,
    /// Number of PUMAs, counted from the end, left out of the crosswalk
    pub unmatched_pumas: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            states: 2,
            pumas_per_state: 3,
            households_per_puma: 50,
            multigen_share: 0.2,
            income_missing_share: 0.05,
            unmatched_pumas: 0,
        }
    }
}

/// Generated rows and crosswalk entries
#[derive(Debug, Clone)]
pub struct SyntheticMicrodata {
    pub rows: Vec<RawPersonRow>,
    pub crosswalk: Vec<CrosswalkEntry>,
}

impl SyntheticMicrodata {
    /// Decode the generated rows
    pub fn persons(&self) -> Result<Vec<PersonRecord>> {
        decode_rows(self.rows.clone())
    }

    /// Index the generated crosswalk entries
    #[must_use]
    pub fn crosswalk(&self) -> Crosswalk {
        Crosswalk::new(self.crosswalk.iter().copied())
    }
}

/// Generate a synthetic population
pub fn generate(config: &SyntheticConfig) -> Result<SyntheticMicrodata> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let multigen_share = config.multigen_share.clamp(0.0, 1.0);
    let income_missing_share = config.income_missing_share.clamp(0.0, 1.0);

    let pumas: Vec<PumaKey> = (1..=config.states)
        .flat_map(|state| {
            (1..=config.pumas_per_state).map(move |p| PumaKey::new(state, p * 100))
        })
        .collect();

    let mut rows = Vec::new();
    let mut serial: i64 = 0;
    for key in &pumas {
        for _ in 0..config.households_per_puma {
            serial += 1;
            push_household(
                &mut rng,
                &mut rows,
                *key,
                serial,
                multigen_share,
                income_missing_share,
            );
        }
    }

    let matched = pumas.len().saturating_sub(config.unmatched_pumas);
    let mut crosswalk = Vec::new();
    for key in &pumas[..matched] {
        let counties = rng.random_range(1..=3_u32);
        let shares: Vec<f64> = (0..counties).map(|_| f64::from(rng.random_range(1..=10_u32))).collect();
        let total: f64 = shares.iter().sum();

        let mut remaining = 1.0_f64;
        for (j, share) in shares.iter().enumerate() {
            let afact = if j + 1 == shares.len() {
                remaining.max(0.0)
            } else {
                share / total
            };
            remaining -= afact;
            // Neighbouring PUMAs overlap on counties
            let county = 2 * ((key.puma / 100 - 1 + j as u32) % (config.pumas_per_state + 1)) + 1;
            let county = u16::try_from(county).unwrap_or(u16::MAX);
            crosswalk.push(CrosswalkEntry::new(
                *key,
                CountyFips::new(key.state, county),
                afact.min(1.0),
            )?);
        }
    }

    Ok(SyntheticMicrodata { rows, crosswalk })
}

fn push_household(
    rng: &mut StdRng,
    rows: &mut Vec<RawPersonRow>,
    key: PumaKey,
    serial: i64,
    multigen_share: f64,
    income_missing_share: f64,
) {
    let hhwt = f64::from(rng.random_range(1..=200_u32));
    let multgend = if rng.random_bool(multigen_share) {
        MULTIGEN_CODES[rng.random_range(0..MULTIGEN_CODES.len())]
    } else {
        OTHER_CODES[rng.random_range(0..OTHER_CODES.len())]
    };
    let hhincome = if rng.random_bool(income_missing_share) {
        Some(MISSING_SENTINEL)
    } else {
        Some(rng.random_range(0..=300_000))
    };
    let race = rng.random_range(1..=9);
    let hispan = if rng.random_bool(0.2) {
        HISPANIC_CODES[rng.random_range(0..HISPANIC_CODES.len())]
    } else {
        0
    };

    let size = rng.random_range(1..=6_usize);
    for member in 0..size {
        let (relate, age) = if member == 0 {
            (1, rng.random_range(18..=90))
        } else {
            (rng.random_range(2..=13), rng.random_range(0..=95))
        };
        rows.push(RawPersonRow {
            statefip: i64::from(key.state),
            puma: i64::from(key.puma),
            serial,
            hhwt,
            perwt: f64::from(rng.random_range(1..=300_u32)),
            age: Some(age),
            hhincome,
            race,
            hispan,
            relate,
            multgend,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let config = SyntheticConfig::default();
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.crosswalk.len(), b.crosswalk.len());
    }

    #[test]
    fn test_rows_decode_and_every_household_has_a_head() {
        let data = generate(&SyntheticConfig::default()).unwrap();
        let persons = data.persons().unwrap();
        let heads = persons.iter().filter(|p| p.relationship.is_head()).count();
        assert_eq!(heads, 2 * 3 * 50);
    }

    #[test]
    fn test_crosswalk_factors_sum_to_one() {
        let config = SyntheticConfig {
            unmatched_pumas: 1,
            ..SyntheticConfig::default()
        };
        let crosswalk = generate(&config).unwrap().crosswalk();
        assert_eq!(crosswalk.puma_count(), 5);
        assert!(crosswalk.unbalanced_pumas(1e-9).is_empty());
        assert!(crosswalk.targets(&PumaKey::new(2, 300)).is_empty());
    }
}
