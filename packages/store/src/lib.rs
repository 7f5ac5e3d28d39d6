#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Append-only fare record storage.
//!
//! Records are kept per identity partition. A [`FareStore`] is one
//! partition: it validates and appends submissions, lists them back in
//! insertion order, and can be cleared. Two backends are provided:
//!
//! * [`memory::MemoryFareStore`] keeps records for the life of the process.
//! * [`fare_db::DuckDbFareStore`] persists each partition to its own
//!   `DuckDB` file under the data directory.
//!
//! [`partitions::FarePartitions`] hands out one store per identity.
//!
//! Stores never compute anything over the records. Aggregation lives in
//! `campus_fares_analytics`.

pub mod fare_db;
pub mod memory;
pub mod partitions;
pub mod paths;

use std::collections::BTreeMap;

use campus_fares_fare_models::{FareRecord, InvalidFareRecord, NewFareRecord, PlaceActivity};
use chrono::Utc;

/// Errors that can occur during fare storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The submission failed validation and was not stored.
    #[error("Invalid fare record: {0}")]
    InvalidRecord(#[from] InvalidFareRecord),

    /// The persistence medium could not be read or written.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Description of what went wrong.
        message: String,
    },
}

impl StoreError {
    /// Builds a [`StoreError::StorageUnavailable`] from any displayable cause.
    pub fn unavailable(cause: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable {
            message: cause.to_string(),
        }
    }
}

impl From<duckdb::Error> for StoreError {
    fn from(e: duckdb::Error) -> Self {
        Self::unavailable(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::unavailable(e)
    }
}

/// One partition of fare records.
///
/// Implementations serialize `append` so concurrent submissions are never
/// lost, and return records in the order they were appended.
pub trait FareStore: Send + Sync {
    /// Validates and persists a submission, returning the stored record.
    ///
    /// The record is durable within the partition before this returns.
    ///
    /// # Errors
    ///
    /// * [`StoreError::InvalidRecord`] if the amount is not positive or the
    ///   place key is empty. Nothing is stored.
    /// * [`StoreError::StorageUnavailable`] if the backend fails.
    fn append(&self, input: NewFareRecord) -> Result<FareRecord, StoreError>;

    /// Returns every record for `place_key` in insertion order.
    ///
    /// An unknown place yields an empty vector, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the backend fails.
    fn list_by_place(&self, place_key: &str) -> Result<Vec<FareRecord>, StoreError>;

    /// Returns every record in the partition in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the backend fails.
    fn list_all(&self) -> Result<Vec<FareRecord>, StoreError>;

    /// Removes every record in the partition. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the backend fails.
    fn clear(&self) -> Result<(), StoreError>;

    /// Lists the places that have at least one submission, in the order
    /// each place first appeared.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the backend fails.
    fn list_places(&self) -> Result<Vec<PlaceActivity>, StoreError> {
        let mut order: Vec<String> = Vec::new();
        let mut by_place: BTreeMap<String, PlaceActivity> = BTreeMap::new();

        for record in self.list_all()? {
            if let Some(activity) = by_place.get_mut(&record.place_key) {
                activity.fare_count += 1;
                if record.submitted_at > activity.last_submitted_at {
                    activity.last_submitted_at = record.submitted_at;
                }
                continue;
            }

            order.push(record.place_key.clone());
            by_place.insert(
                record.place_key.clone(),
                PlaceActivity {
                    place_key: record.place_key,
                    fare_count: 1,
                    last_submitted_at: record.submitted_at,
                },
            );
        }

        Ok(order
            .into_iter()
            .filter_map(|key| by_place.remove(&key))
            .collect())
    }
}

/// Validates a submission and stamps it with a fresh id and timestamp.
///
/// Shared by every backend so that all of them accept and reject exactly
/// the same inputs.
///
/// # Errors
///
/// Returns [`StoreError::InvalidRecord`] if validation fails.
pub fn prepare_record(input: NewFareRecord) -> Result<FareRecord, StoreError> {
    input.validate()?;

    let submitter_id = input.submitter_id().to_string();

    Ok(FareRecord {
        id: uuid::Uuid::new_v4().to_string(),
        place_key: input.place_key,
        amount: input.amount,
        submitter_id,
        submitted_at: Utc::now(),
    })
}
