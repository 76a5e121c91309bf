//! Row classifier
//!
//! Pure predicates over a single person row. Nothing here looks at other
//! members of the household; combining member flags is the reducer's job.

use crate::config::MultigenDefinition;
use crate::models::person::PersonRecord;
use crate::models::types::{MultigenCode, Race};

/// Multigenerational under the default definition: codes 22, 23, 31, 32
#[must_use]
pub fn is_multi_gen(code: MultigenCode) -> bool {
    matches!(code.code(), 22 | 23 | 31 | 32)
}

/// Multigenerational excluding code 23: codes 22, 31, 32
#[must_use]
pub fn is_multi_gen_adjacent_only(code: MultigenCode) -> bool {
    matches!(code.code(), 22 | 31 | 32)
}

/// Flags derived from one person row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersonFlags {
    /// Household multigenerational status as reported on this row
    pub is_multi_gen: bool,
    /// Row is the household head
    pub is_head: bool,
    /// Head whose race is Black
    pub black_head: bool,
    /// Head whose race is Chinese, Japanese or other Asian/Pacific Islander
    pub asian_head: bool,
    /// Head of any Hispanic origin, before precedence is applied
    pub hispanic_head: bool,
    /// Head who is not White or is Hispanic
    pub non_white_head: bool,
    /// Head who is White and not Hispanic
    pub white_head: bool,
}

/// Classify person rows under a chosen multigenerational definition
#[derive(Debug, Clone, Copy, Default)]
pub struct RowClassifier {
    definition: MultigenDefinition,
}

impl RowClassifier {
    #[must_use]
    pub fn new(definition: MultigenDefinition) -> Self {
        Self { definition }
    }

    /// Whether a code counts as multigenerational under this classifier
    #[must_use]
    pub fn multi_gen(&self, code: MultigenCode) -> bool {
        match self.definition {
            MultigenDefinition::Any => is_multi_gen(code),
            MultigenDefinition::AdjacentOnly => is_multi_gen_adjacent_only(code),
        }
    }

    /// Derive the household-level candidate flags carried by one row
    #[must_use]
    pub fn classify(&self, person: &PersonRecord) -> PersonFlags {
        let is_head = person.relationship.is_head();
        let hispanic = person.hispanic.is_hispanic();
        let white = person.race == Race::White;

        PersonFlags {
            is_multi_gen: self.multi_gen(person.multigen),
            is_head,
            black_head: is_head && person.race == Race::Black,
            asian_head: is_head && person.race.is_asian(),
            hispanic_head: is_head && hispanic,
            non_white_head: is_head && (!white || hispanic),
            white_head: is_head && white && !hispanic,
        }
    }
}
