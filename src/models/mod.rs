//! Domain models for the aggregation pipeline
//!
//! Person rows are the input, household records the intermediate table,
//! and geographic aggregates plus their flat rows the output.

pub mod crosswalk;
pub mod fips;
pub mod geo;
pub mod household;
pub mod person;
pub mod rows;
pub mod types;

pub use crosswalk::{Crosswalk, CrosswalkEntry};
pub use fips::{CountyLabel, FipsTable, StateLabel};
pub use geo::{
    CountyAggregate, CountyFips, GeoAggregate, MultigenRates, PumaAggregate, StateAggregate,
    WeightedTotals, ratio,
};
pub use household::{HeadCategory, HeadFlags, HouseholdRecord};
pub use person::{HouseholdKey, PersonRecord, PumaKey, RawPersonRow};
pub use rows::{CountyRow, PumaRow, StateRow};
pub use types::{HispanicOrigin, MultigenCode, Race, Relationship};
