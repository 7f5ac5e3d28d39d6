//! Import progress reporting.
//!
//! [`import_csv`](crate::import_csv) reports one unit per CSV row through
//! [`ProgressCallback`]. Terminal front ends render it as a bar; library
//! callers and tests pass [`null_progress`].

use std::sync::Arc;

/// Receives progress updates while rows are imported.
///
/// Shared behind an `Arc`, hence `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Announces how many rows to expect, when that is known up front.
    fn set_total(&self, total: u64);

    /// Records `delta` more rows processed.
    fn inc(&self, delta: u64);

    /// Replaces the status text.
    fn set_message(&self, msg: String);

    /// Marks the import done with a closing status.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// A shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
