#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the fare data directory.
//!
//! The data directory defaults to `data/` under the project root and can be
//! moved with the `CAMPUS_FARES_DATA_DIR` environment variable.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CAMPUS_FARES_DATA_DIR";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// manifest directory itself if it has fewer than two ancestors.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.ancestors().nth(2).unwrap_or(manifest).to_path_buf()
}

/// Returns the data directory, honouring [`DATA_DIR_ENV`].
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the directory holding one `DuckDB` file per partition.
#[must_use]
pub fn partitions_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("partitions")
}

/// Returns the `DuckDB` file path for a partition.
#[must_use]
pub fn partition_db_path(data_dir: &Path, partition: &str) -> PathBuf {
    partitions_dir(data_dir).join(format!("{}.duckdb", file_stem(partition)))
}

/// Maps an arbitrary identity string onto a safe file stem.
///
/// ASCII alphanumerics, `-` and `_` pass through; everything else becomes
/// `_`. An identity that maps to nothing becomes `anonymous`.
#[must_use]
pub fn file_stem(partition: &str) -> String {
    let stem: String = partition
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        campus_fares_fare_models::ANONYMOUS_SUBMITTER.to_string()
    } else {
        stem
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
