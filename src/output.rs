//! Output serialization
//!
//! Rows become Arrow record batches through `serde_arrow` and are written as
//! CSV; run diagnostics are written as JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use arrow_schema::FieldRef;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;
use crate::utils::logging::log_operation_complete;

/// Convert output rows into a record batch with one column per field
pub fn rows_to_record_batch<T>(rows: &[T]) -> Result<RecordBatch>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default())?;
    Ok(serde_arrow::to_record_batch(&fields, &rows)?)
}

/// Write a record batch as CSV with a header row; nulls are written as
/// `null_marker`
pub fn write_csv<W: Write>(writer: W, batch: &RecordBatch, null_marker: &str) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .with_header(true)
        .with_null(null_marker.to_string())
        .build(writer);
    csv.write(batch)?;
    csv.into_inner().flush()?;
    Ok(())
}

/// Write rows to a CSV file
pub fn write_rows_csv<T>(path: &Path, rows: &[T], null_marker: &str) -> Result<()>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let batch = rows_to_record_batch(rows)?;
    let writer = BufWriter::new(File::create(path)?);
    write_csv(writer, &batch, null_marker)?;
    log_operation_complete("wrote", path, rows.len(), None);
    Ok(())
}

/// Write any serializable report as pretty-printed JSON
pub fn write_json<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
