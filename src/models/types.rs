//! Survey category code tables
//!
//! Closed enumerations for the coded person fields. Codes are decoded once,
//! at ingestion; a code outside its table is rejected rather than carried
//! forward as an unknown label.

use crate::error::{MultigenError, Result};

/// Sentinel the survey uses for "not applicable" numeric values
pub const MISSING_SENTINEL: i64 = 9_999_999;

/// Normalize a sentinel-coded numeric value to `None`
#[must_use]
pub fn normalize_missing(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != MISSING_SENTINEL)
}

/// General race category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Race {
    /// White
    White,
    /// Black/African American
    Black,
    /// American Indian or Alaska Native
    AmericanIndian,
    /// Chinese
    Chinese,
    /// Japanese
    Japanese,
    /// Other Asian or Pacific Islander
    OtherAsianPacific,
    /// Other race
    Other,
    /// Two major races
    TwoMajorRaces,
    /// Three or more major races
    ThreeOrMoreMajorRaces,
}

impl Race {
    /// Whether the race belongs to the Asian/Pacific Islander group
    #[must_use]
    pub fn is_asian(self) -> bool {
        matches!(self, Self::Chinese | Self::Japanese | Self::OtherAsianPacific)
    }
}

impl TryFrom<i64> for Race {
    type Error = MultigenError;

    fn try_from(code: i64) -> Result<Self> {
        Ok(match code {
            1 => Self::White,
            2 => Self::Black,
            3 => Self::AmericanIndian,
            4 => Self::Chinese,
            5 => Self::Japanese,
            6 => Self::OtherAsianPacific,
            7 => Self::Other,
            8 => Self::TwoMajorRaces,
            9 => Self::ThreeOrMoreMajorRaces,
            _ => return Err(MultigenError::UnknownCode { field: "RACE", code }),
        })
    }
}

/// Hispanic origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HispanicOrigin {
    /// Not Hispanic
    NotHispanic,
    /// Mexican
    Mexican,
    /// Puerto Rican
    PuertoRican,
    /// Cuban
    Cuban,
    /// Other Hispanic
    Other,
    /// Not reported
    NotReported,
}

impl HispanicOrigin {
    /// Anything other than "not Hispanic", including "not reported"
    #[must_use]
    pub fn is_hispanic(self) -> bool {
        self != Self::NotHispanic
    }
}

impl TryFrom<i64> for HispanicOrigin {
    type Error = MultigenError;

    fn try_from(code: i64) -> Result<Self> {
        Ok(match code {
            0 => Self::NotHispanic,
            1 => Self::Mexican,
            2 => Self::PuertoRican,
            3 => Self::Cuban,
            4 => Self::Other,
            9 => Self::NotReported,
            _ => return Err(MultigenError::UnknownCode { field: "HISPAN", code }),
        })
    }
}

/// Relationship to the household head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// Head/householder
    Head,
    /// Spouse
    Spouse,
    /// Child
    Child,
    /// Child-in-law
    ChildInLaw,
    /// Parent
    Parent,
    /// Parent-in-law
    ParentInLaw,
    /// Sibling
    Sibling,
    /// Sibling-in-law
    SiblingInLaw,
    /// Grandchild
    Grandchild,
    /// Other relatives
    OtherRelative,
    /// Partner, friend, visitor
    PartnerFriendVisitor,
    /// Other non-relatives
    OtherNonRelative,
    /// Institutional inmate
    InstitutionalInmate,
}

impl Relationship {
    /// Whether the person is the household reference person
    #[must_use]
    pub fn is_head(self) -> bool {
        self == Self::Head
    }
}

impl TryFrom<i64> for Relationship {
    type Error = MultigenError;

    fn try_from(code: i64) -> Result<Self> {
        Ok(match code {
            1 => Self::Head,
            2 => Self::Spouse,
            3 => Self::Child,
            4 => Self::ChildInLaw,
            5 => Self::Parent,
            6 => Self::ParentInLaw,
            7 => Self::Sibling,
            8 => Self::SiblingInLaw,
            9 => Self::Grandchild,
            10 => Self::OtherRelative,
            11 => Self::PartnerFriendVisitor,
            12 => Self::OtherNonRelative,
            13 => Self::InstitutionalInmate,
            _ => return Err(MultigenError::UnknownCode { field: "RELATE", code }),
        })
    }
}

/// Detailed multigenerational-household code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultigenCode {
    /// 0: not applicable (group quarters, vacant)
    NotApplicable,
    /// 10: one generation
    OneGeneration,
    /// 20: two generations
    TwoGenerations,
    /// 21
    TwoAdjacentAdults,
    /// 22
    TwoAdjacentWithChildren,
    /// 23
    TwoNonAdjacent,
    /// 31
    ThreeGenerations,
    /// 32
    ThreePlusGenerations,
}

impl MultigenCode {
    /// Numeric survey code
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::NotApplicable => 0,
            Self::OneGeneration => 10,
            Self::TwoGenerations => 20,
            Self::TwoAdjacentAdults => 21,
            Self::TwoAdjacentWithChildren => 22,
            Self::TwoNonAdjacent => 23,
            Self::ThreeGenerations => 31,
            Self::ThreePlusGenerations => 32,
        }
    }
}

impl TryFrom<i64> for MultigenCode {
    type Error = MultigenError;

    fn try_from(code: i64) -> Result<Self> {
        Ok(match code {
            0 => Self::NotApplicable,
            10 => Self::OneGeneration,
            20 => Self::TwoGenerations,
            21 => Self::TwoAdjacentAdults,
            22 => Self::TwoAdjacentWithChildren,
            23 => Self::TwoNonAdjacent,
            31 => Self::ThreeGenerations,
            32 => Self::ThreePlusGenerations,
            _ => return Err(MultigenError::UnknownCode { field: "MULTGEND", code }),
        })
    }
}
