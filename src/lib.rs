//! Multigenerational household estimates from person-level census
//! microdata.
//!
//! Person rows are classified, reduced to one record per household,
//! aggregated per PUMA with weighted totals and medians, and re-aggregated
//! to counties through a weighted crosswalk and to states directly.

pub mod algorithm;
pub mod async_io;
pub mod config;
pub mod error;
pub mod geography;
pub mod loader;
pub mod models;
pub mod output;
pub mod utils;

// Core types
pub use config::{MultigenDefinition, PipelineConfig, ReconcilePolicy};
pub use error::{MultigenError, Result};

// Pipeline
pub use algorithm::{Diagnostics, PipelineOutput, run_pipeline};

// Reading and writing
pub use async_io::{load_microdata_async, load_microdata_files_async};
pub use geography::{load_crosswalk, load_fips_table, read_crosswalk, read_fips_table};
pub use loader::{find_parquet_files, load_microdata, load_microdata_parallel};
pub use output::{rows_to_record_batch, write_csv, write_json, write_rows_csv};

// Arrow types
pub use arrow::record_batch::RecordBatch;
