//! Microdata loading from Parquet files

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::schema::types::SchemaDescriptor;
use rayon::prelude::*;

use crate::error::{MultigenError, Result};
use crate::models::person::{MICRODATA_COLUMNS, PersonRecord, RawPersonRow, decode_rows};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Projection mask selecting the microdata columns
///
/// Every microdata column must be present in the file.
pub fn microdata_projection(
    file_schema: &Schema,
    parquet_schema: &SchemaDescriptor,
) -> Result<ProjectionMask> {
    let indices = MICRODATA_COLUMNS
        .iter()
        .map(|column| {
            file_schema
                .index_of(column)
                .map_err(|_| MultigenError::ColumnNotFound {
                    column: (*column).to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ProjectionMask::roots(parquet_schema, indices))
}

/// Decode the person rows of one record batch
pub fn persons_from_batch(batch: &RecordBatch) -> Result<Vec<PersonRecord>> {
    let rows: Vec<RawPersonRow> = serde_arrow::from_record_batch(batch)?;
    decode_rows(rows)
}

/// Read the microdata columns of a Parquet file into record batches
pub fn read_microdata_batches(path: &Path, batch_size: usize) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let projection = microdata_projection(builder.schema(), builder.parquet_schema())?;
    let reader = builder
        .with_projection(projection)
        .with_batch_size(batch_size)
        .build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(batches)
}

/// Load and decode every person row of a Parquet file
pub fn load_microdata(path: &Path, batch_size: usize) -> Result<Vec<PersonRecord>> {
    let start = Instant::now();
    log_operation_start("Loading microdata from", path);

    let batches = read_microdata_batches(path, batch_size)?;
    let mut persons = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    for batch in &batches {
        persons.extend(persons_from_batch(batch)?);
    }

    log_operation_complete("loaded", path, persons.len(), Some(start.elapsed()));
    Ok(persons)
}

/// Expand a list of paths into Parquet files; directories contribute their
/// `.parquet` entries, sorted by name
pub fn find_parquet_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = fs::read_dir(path)?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?;
            entries.retain(|p| p.extension().is_some_and(|ext| ext == "parquet"));
            entries.sort();
            if entries.is_empty() {
                log_warning("No Parquet files found in directory", Some(path));
            }
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Load several Parquet files in parallel and concatenate their person rows
/// in file order
pub fn load_microdata_parallel(paths: &[PathBuf], batch_size: usize) -> Result<Vec<PersonRecord>> {
    let per_file = paths
        .par_iter()
        .map(|path| load_microdata(path, batch_size))
        .collect::<Result<Vec<_>>>()?;
    Ok(per_file.into_iter().flatten().collect())
}
