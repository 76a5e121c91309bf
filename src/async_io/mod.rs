//! Async microdata loading
//!
//! Streams Parquet files with the async reader so several files can be
//! read concurrently on the tokio runtime.

use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use futures::{StreamExt, TryStreamExt};
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use tokio::fs::File;

use crate::error::Result;
use crate::loader::{microdata_projection, persons_from_batch};
use crate::models::person::PersonRecord;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Read the microdata columns of a Parquet file asynchronously
pub async fn read_microdata_batches_async(
    path: &Path,
    batch_size: usize,
) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).await?;
    let builder = ParquetRecordBatchStreamBuilder::new(file).await?;
    let projection = microdata_projection(builder.schema(), builder.parquet_schema())?;

    let stream = builder
        .with_projection(projection)
        .with_batch_size(batch_size)
        .build()?;

    let batches = stream.try_collect::<Vec<_>>().await?;
    Ok(batches)
}

/// Load and decode every person row of a Parquet file asynchronously
pub async fn load_microdata_async(path: &Path, batch_size: usize) -> Result<Vec<PersonRecord>> {
    let start = Instant::now();
    log_operation_start("Loading microdata asynchronously from", path);

    let batches = read_microdata_batches_async(path, batch_size).await?;
    let mut persons = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    for batch in &batches {
        persons.extend(persons_from_batch(batch)?);
    }

    log_operation_complete("loaded", path, persons.len(), Some(start.elapsed()));
    Ok(persons)
}

/// Load several Parquet files concurrently, at most `concurrency` at a time,
/// and concatenate their person rows in file order
pub async fn load_microdata_files_async(
    paths: &[PathBuf],
    batch_size: usize,
    concurrency: usize,
) -> Result<Vec<PersonRecord>> {
    let per_file: Vec<Vec<PersonRecord>> = futures::stream::iter(paths)
        .map(|path| load_microdata_async(path, batch_size))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    Ok(per_file.into_iter().flatten().collect())
}
