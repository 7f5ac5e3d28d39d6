#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bulk import of fare submissions from CSV.
//!
//! The expected header is `place_key,amount[,submitter_id]`. Each row goes
//! through [`FareStore::append`] exactly like an interactive submission,
//! so the same validation applies. Rows that fail to parse or validate are
//! logged and skipped; a storage failure aborts the import.

pub mod progress;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use campus_fares_fare_models::NewFareRecord;
use campus_fares_store::{FareStore, StoreError};
use serde::Deserialize;

use crate::progress::ProgressCallback;

/// Errors that abort an import.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The input file could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV header could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The store rejected a write for reasons other than validation.
    #[error(transparent)]
    Store(StoreError),
}

/// Counts from a finished import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Data rows read (excluding the header).
    pub rows: u64,
    /// Rows stored.
    pub imported: u64,
    /// Rows skipped because they failed to parse or validate.
    pub skipped: u64,
}

#[derive(Debug, Deserialize)]
struct CsvFareRow {
    place_key: String,
    amount: f64,
    #[serde(default)]
    submitter_id: Option<String>,
}

/// Imports fare rows from `reader` into `store`.
///
/// # Errors
///
/// * [`IngestError::Csv`] if the header row cannot be read.
/// * [`IngestError::Store`] if the store becomes unavailable. Rows already
///   imported stay imported.
pub fn import_csv<R: Read>(
    reader: R,
    store: &dyn FareStore,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportStats, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.headers()?;
    progress.set_message("Reading fares".to_string());

    // Read everything up front so the progress total is known.
    let rows: Vec<csv::Result<CsvFareRow>> = csv_reader.deserialize().collect();
    progress.set_total(rows.len() as u64);
    progress.set_message("Importing fares".to_string());

    let mut stats = ImportStats::default();

    for (i, row) in rows.into_iter().enumerate() {
        stats.rows += 1;
        progress.inc(1);
        // Header is line 1.
        let line = i + 2;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping line {line}: {e}");
                stats.skipped += 1;
                continue;
            }
        };

        let mut input = NewFareRecord::new(row.place_key, row.amount);
        if let Some(submitter) = row.submitter_id {
            input = input.with_submitter(submitter);
        }

        match store.append(input) {
            Ok(_) => stats.imported += 1,
            Err(StoreError::InvalidRecord(e)) => {
                log::warn!("Skipping line {line}: {e}");
                stats.skipped += 1;
            }
            Err(e) => return Err(IngestError::Store(e)),
        }
    }

    log::info!(
        "Imported {} of {} fare row(s) ({} skipped)",
        stats.imported,
        stats.rows,
        stats.skipped
    );
    progress.finish(format!(
        "Imported {} fare(s), skipped {}",
        stats.imported, stats.skipped
    ));

    Ok(stats)
}

/// Imports fare rows from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be opened, otherwise the
/// same errors as [`import_csv`].
pub fn import_csv_file(
    path: &Path,
    store: &dyn FareStore,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportStats, IngestError> {
    let file = std::fs::File::open(path)?;
    log::info!("Importing fares from {}", path.display());
    import_csv(std::io::BufReader::new(file), store, progress)
}
