//! Logging and progress reporting

pub mod log;
pub mod progress;

pub use log::{log_operation_complete, log_operation_start, log_warning};
pub use progress::{create_spinner, create_stage_progress_bar, finish_progress_bar};
