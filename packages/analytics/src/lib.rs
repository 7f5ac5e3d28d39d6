#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fare aggregation and distribution analysis.
//!
//! The pipeline for one place is:
//!
//! 1. [`aggregate`] pulls the place's records from a
//!    [`FareStore`](campus_fares_store::FareStore), buckets the amounts and
//!    computes exact summary statistics.
//! 2. [`smooth`] expands the bucket histogram into a Gaussian-smoothed
//!    curve for charts. The curve never feeds back into the statistics.
//! 3. [`classify`] labels consensus and reliability from the statistics.
//!
//! Every step after the store read is a pure, synchronous function over
//! already-loaded data, so results are recomputed on every call and are
//! safe to produce concurrently. [`summary::summarize`] runs the whole
//! pipeline.

pub mod aggregate;
pub mod config;
pub mod insight;
pub mod smooth;
pub mod summary;

pub use aggregate::{aggregate, aggregate_records};
pub use insight::{assess_fare, classify};
pub use smooth::smooth;

use campus_fares_store::StoreError;
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The fare store failed. Passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The analytics configuration is unreadable or out of range.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
