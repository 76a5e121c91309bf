//! Aggregation algorithms
//!
//! Stage order: classifier → household reducer → PUMA aggregator →
//! {county re-aggregation, state aggregation}.

pub mod classifier;
pub mod household;
pub mod median;
pub mod pipeline;
pub mod puma;
pub mod reaggregate;

pub use classifier::{RowClassifier, is_multi_gen, is_multi_gen_adjacent_only};
pub use household::{HouseholdReducer, ReductionStats};
pub use median::{median, replicated_median, weighted_median};
pub use pipeline::{Diagnostics, PipelineOutput, run_pipeline};
pub use puma::{aggregate_puma, aggregate_pumas};
pub use reaggregate::{ReaggregationReport, aggregate_counties, aggregate_states, reaggregate};
