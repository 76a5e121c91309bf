//! Shared builders for integration tests
#![allow(dead_code)]

use multigen_pums::models::RawPersonRow;

/// A household described by its shared fields
pub struct HouseholdSpec {
    pub state: i64,
    pub puma: i64,
    pub serial: i64,
    pub hhwt: f64,
    pub multgend: i64,
    pub hhincome: Option<i64>,
    /// `(race, hispan)` of the head
    pub head: (i64, i64),
    /// Member ages, head first
    pub ages: Vec<i64>,
}

impl HouseholdSpec {
    /// Coded rows for every member; non-head members are children
    pub fn rows(&self) -> Vec<RawPersonRow> {
        self.ages
            .iter()
            .enumerate()
            .map(|(i, &age)| RawPersonRow {
                statefip: self.state,
                puma: self.puma,
                serial: self.serial,
                hhwt: self.hhwt,
                perwt: self.hhwt,
                age: Some(age),
                hhincome: self.hhincome,
                race: if i == 0 { self.head.0 } else { 1 },
                hispan: if i == 0 { self.head.1 } else { 0 },
                relate: if i == 0 { 1 } else { 3 },
                multgend: self.multgend,
            })
            .collect()
    }
}

/// Two households in PUMA 06-00100 and one in 06-00200
///
/// * serial 1: weight 5, three generations, Black head, ages 70/45/10
/// * serial 2: weight 3, two generations, White Hispanic head, ages 35/33
/// * serial 3: weight 2, one generation, Chinese head, age 50
pub fn sample_rows() -> Vec<RawPersonRow> {
    [
        HouseholdSpec {
            state: 6,
            puma: 100,
            serial: 1,
            hhwt: 5.0,
            multgend: 31,
            hhincome: Some(60_000),
            head: (2, 0),
            ages: vec![70, 45, 10],
        },
        HouseholdSpec {
            state: 6,
            puma: 100,
            serial: 2,
            hhwt: 3.0,
            multgend: 20,
            hhincome: Some(40_000),
            head: (1, 1),
            ages: vec![35, 33],
        },
        HouseholdSpec {
            state: 6,
            puma: 200,
            serial: 3,
            hhwt: 2.0,
            multgend: 10,
            hhincome: Some(70_000),
            head: (4, 0),
            ages: vec![50],
        },
    ]
    .iter()
    .flat_map(HouseholdSpec::rows)
    .collect()
}

/// Crosswalk splitting 06-00100 between two counties; 06-00200 is absent
pub const SAMPLE_CROSSWALK: &str = "state\tpuma12\tcounty\tafact\n\
    State code\tPUMA (2012)\tCounty code\tPUMA to county allocation factor\n\
    06\t00100\t06037\t0.6\n\
    06\t00100\t06059\t0.4\n";

pub const SAMPLE_FIPS: &str = "state,state_code,state_name,county_code,county\n\
    CA,06,California,037,Los Angeles County\n\
    CA,06,California,059,Orange County\n";

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
