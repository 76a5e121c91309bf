//! County FIPS reference labels

use rustc_hash::FxHashMap;

use crate::models::geo::CountyFips;

/// Human-readable labels for one county
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyLabel {
    /// State postal abbreviation, e.g. `CA`
    pub state_postal: String,
    /// State name
    pub state_name: String,
    /// County name
    pub county_name: String,
}

/// Human-readable labels for one state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLabel {
    pub state_postal: String,
    pub state_name: String,
}

/// Lookup of county and state labels by FIPS code
#[derive(Debug, Clone, Default)]
pub struct FipsTable {
    counties: FxHashMap<CountyFips, CountyLabel>,
    states: FxHashMap<u16, StateLabel>,
}

impl FipsTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a county; the state label is taken from the first county seen
    pub fn insert(&mut self, fips: CountyFips, label: CountyLabel) {
        self.states.entry(fips.state).or_insert_with(|| StateLabel {
            state_postal: label.state_postal.clone(),
            state_name: label.state_name.clone(),
        });
        self.counties.insert(fips, label);
    }

    #[must_use]
    pub fn county(&self, fips: &CountyFips) -> Option<&CountyLabel> {
        self.counties.get(fips)
    }

    #[must_use]
    pub fn state(&self, state: u16) -> Option<&StateLabel> {
        self.states.get(&state)
    }

    /// Number of counties
    #[must_use]
    pub fn len(&self) -> usize {
        self.counties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}
