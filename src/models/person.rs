//! Person-level microdata rows
//!
//! `RawPersonRow` mirrors the coded survey columns as they arrive in a
//! record batch; `PersonRecord` is the decoded, typed row the pipeline
//! consumes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MultigenError, Result};
use crate::models::types::{
    HispanicOrigin, MultigenCode, Race, Relationship, normalize_missing,
};

/// Microdata column names, in the order the loader projects them
pub const MICRODATA_COLUMNS: [&str; 11] = [
    "STATEFIP", "PUMA", "SERIAL", "HHWT", "PERWT", "AGE", "HHINCOME", "RACE", "HISPAN",
    "RELATE", "MULTGEND",
];

/// Geographic unit: state plus PUMA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PumaKey {
    /// State FIPS code
    pub state: u16,
    /// PUMA code within the state
    pub puma: u32,
}

impl PumaKey {
    #[must_use]
    pub fn new(state: u16, puma: u32) -> Self {
        Self { state, puma }
    }
}

impl fmt::Display for PumaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:05}", self.state, self.puma)
    }
}

/// Household identity: state, PUMA and household serial number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HouseholdKey {
    /// Geographic unit of the household
    pub puma: PumaKey,
    /// Household serial number
    pub serial: u64,
}

impl HouseholdKey {
    #[must_use]
    pub fn new(state: u16, puma: u32, serial: u64) -> Self {
        Self {
            puma: PumaKey::new(state, puma),
            serial,
        }
    }
}

impl fmt::Display for HouseholdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.puma, self.serial)
    }
}

/// A microdata row with coded fields, as stored in the source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPersonRow {
    #[serde(rename = "STATEFIP")]
    pub statefip: i64,
    #[serde(rename = "PUMA")]
    pub puma: i64,
    #[serde(rename = "SERIAL")]
    pub serial: i64,
    #[serde(rename = "HHWT")]
    pub hhwt: f64,
    #[serde(rename = "PERWT")]
    pub perwt: f64,
    #[serde(rename = "AGE")]
    pub age: Option<i64>,
    #[serde(rename = "HHINCOME")]
    pub hhincome: Option<i64>,
    #[serde(rename = "RACE")]
    pub race: i64,
    #[serde(rename = "HISPAN")]
    pub hispan: i64,
    #[serde(rename = "RELATE")]
    pub relate: i64,
    #[serde(rename = "MULTGEND")]
    pub multgend: i64,
}

/// One surveyed individual, decoded
#[derive(Debug, Clone, PartialEq)]
pub struct PersonRecord {
    /// Household the person belongs to
    pub household: HouseholdKey,
    /// Household weight, shared by all members of the household
    pub hh_weight: f64,
    /// Person weight
    pub person_weight: f64,
    /// Age in years
    pub age: Option<u32>,
    /// Total household income
    pub hh_income: Option<i64>,
    pub race: Race,
    pub hispanic: HispanicOrigin,
    pub relationship: Relationship,
    pub multigen: MultigenCode,
}

impl TryFrom<RawPersonRow> for PersonRecord {
    type Error = MultigenError;

    fn try_from(row: RawPersonRow) -> Result<Self> {
        let state = u16::try_from(row.statefip).map_err(|_| MultigenError::UnknownCode {
            field: "STATEFIP",
            code: row.statefip,
        })?;
        let puma = u32::try_from(row.puma).map_err(|_| MultigenError::UnknownCode {
            field: "PUMA",
            code: row.puma,
        })?;
        let serial = u64::try_from(row.serial).map_err(|_| MultigenError::UnknownCode {
            field: "SERIAL",
            code: row.serial,
        })?;
        let household = HouseholdKey::new(state, puma, serial);

        if !row.hhwt.is_finite() || row.hhwt <= 0.0 {
            return Err(MultigenError::InvalidWeight {
                context: format!("HHWT of household {household}"),
                weight: row.hhwt,
            });
        }
        if !row.perwt.is_finite() || row.perwt < 0.0 {
            return Err(MultigenError::InvalidWeight {
                context: format!("PERWT of a person in household {household}"),
                weight: row.perwt,
            });
        }

        let age = normalize_missing(row.age)
            .map(|age| {
                u32::try_from(age).map_err(|_| MultigenError::UnknownCode { field: "AGE", code: age })
            })
            .transpose()?;

        Ok(Self {
            household,
            hh_weight: row.hhwt,
            person_weight: row.perwt,
            age,
            hh_income: normalize_missing(row.hhincome),
            race: Race::try_from(row.race)?,
            hispanic: HispanicOrigin::try_from(row.hispan)?,
            relationship: Relationship::try_from(row.relate)?,
            multigen: MultigenCode::try_from(row.multgend)?,
        })
    }
}

/// Decode a batch of raw rows, failing on the first undecodable row
pub fn decode_rows(rows: Vec<RawPersonRow>) -> Result<Vec<PersonRecord>> {
    rows.into_iter().map(PersonRecord::try_from).collect()
}
