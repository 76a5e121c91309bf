//! Household-level records derived from person rows

use crate::models::person::HouseholdKey;

/// Race/ethnicity category of the household head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadCategory {
    Black,
    Asian,
    Hispanic,
    White,
    /// Superset indicator: head is not White or is Hispanic
    NonWhite,
}

impl HeadCategory {
    /// All categories, in output column order
    pub const ALL: [Self; 5] = [
        Self::Black,
        Self::Asian,
        Self::Hispanic,
        Self::White,
        Self::NonWhite,
    ];
}

/// One boolean per head-of-household category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadFlags {
    pub black: bool,
    pub asian: bool,
    pub hispanic: bool,
    pub white: bool,
    pub non_white: bool,
}

impl HeadFlags {
    /// Flag for a single category
    #[must_use]
    pub fn get(&self, category: HeadCategory) -> bool {
        match category {
            HeadCategory::Black => self.black,
            HeadCategory::Asian => self.asian,
            HeadCategory::Hispanic => self.hispanic,
            HeadCategory::White => self.white,
            HeadCategory::NonWhite => self.non_white,
        }
    }

    /// Keep only the flags that are also set in `mask`
    #[must_use]
    pub fn and(&self, mask: bool) -> Self {
        Self {
            black: self.black && mask,
            asian: self.asian && mask,
            hispanic: self.hispanic && mask,
            white: self.white && mask,
            non_white: self.non_white && mask,
        }
    }

    /// Number of set flags among the mutually exclusive categories
    /// (black, asian, hispanic, white)
    #[must_use]
    pub fn exclusive_count(&self) -> usize {
        [self.black, self.asian, self.hispanic, self.white]
            .into_iter()
            .filter(|flag| *flag)
            .count()
    }
}

/// One household, reduced from its member rows
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdRecord {
    /// Household identity
    pub key: HouseholdKey,
    /// Household weight
    pub hh_weight: f64,
    /// Number of member rows
    pub hh_size: u32,
    /// Whether the household is multigenerational
    pub is_multi_gen: bool,
    /// Head-of-household race/ethnicity flags
    pub head: HeadFlags,
    /// Head flags restricted to multigenerational households
    pub head_multigen: HeadFlags,
    /// Median age over members with a known age
    pub median_age: Option<f64>,
    /// Median household income over members with a known income
    pub median_income: Option<f64>,
}
