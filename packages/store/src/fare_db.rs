//! Per-partition `DuckDB` fare storage.
//!
//! Each partition gets its own `DuckDB` file at
//! `data/partitions/{partition}.duckdb`, holding a single `fare_records`
//! table. A sequence-backed `seq` column preserves insertion order.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use campus_fares_fare_models::{FareRecord, NewFareRecord};
use chrono::{DateTime, Utc};
use duckdb::Connection;

use crate::{FareStore, StoreError, prepare_record};

const SELECT_COLUMNS: &str = "SELECT id, place_key, amount, submitter_id, submitted_at \
                              FROM fare_records";

/// A [`FareStore`] persisted to a `DuckDB` file.
///
/// `duckdb::Connection` is `Send` but not `Sync`, so the connection sits
/// behind a `Mutex`. Holding the lock for the whole statement is what
/// serializes appends within the partition.
pub struct DuckDbFareStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl DuckDbFareStore {
    /// Opens (or creates) the partition database at `path` and ensures the
    /// schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the directory cannot be
    /// created or the connection or schema creation fails.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        log::debug!("Opened fare database at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a throwaway in-memory `DuckDB` database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the connection or schema
    /// creation fails.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::unavailable("fare database mutex poisoned"))
    }
}

fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE SEQUENCE IF NOT EXISTS fare_record_seq START 1;

        CREATE TABLE IF NOT EXISTS fare_records (
            seq BIGINT NOT NULL DEFAULT nextval('fare_record_seq') PRIMARY KEY,
            id TEXT NOT NULL UNIQUE,
            place_key TEXT NOT NULL,
            amount DOUBLE NOT NULL,
            submitter_id TEXT NOT NULL,
            submitted_at TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn read_records(
    conn: &Connection,
    sql: &str,
    params: &[&dyn duckdb::ToSql],
) -> Result<Vec<FareRecord>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let submitted_at: String = row.get(4)?;
        let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
            .map_err(|e| {
                StoreError::unavailable(format!("Corrupt timestamp '{submitted_at}': {e}"))
            })?
            .with_timezone(&Utc);

        records.push(FareRecord {
            id: row.get(0)?,
            place_key: row.get(1)?,
            amount: row.get(2)?,
            submitter_id: row.get(3)?,
            submitted_at,
        });
    }

    Ok(records)
}

impl FareStore for DuckDbFareStore {
    fn append(&self, input: NewFareRecord) -> Result<FareRecord, StoreError> {
        let record = prepare_record(input)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO fare_records (id, place_key, amount, submitter_id, submitted_at)
             VALUES (?, ?, ?, ?, ?)",
            duckdb::params![
                record.id,
                record.place_key,
                record.amount,
                record.submitter_id,
                record.submitted_at.to_rfc3339(),
            ],
        )?;

        log::debug!(
            "Stored fare {} for place '{}' ({})",
            record.id,
            record.place_key,
            self.path
                .as_deref()
                .map_or_else(|| "in-memory".to_string(), |p| p.display().to_string())
        );

        Ok(record)
    }

    fn list_by_place(&self, place_key: &str) -> Result<Vec<FareRecord>, StoreError> {
        let conn = self.lock()?;
        read_records(
            &conn,
            &format!("{SELECT_COLUMNS} WHERE place_key = ? ORDER BY seq"),
            &[&place_key],
        )
    }

    fn list_all(&self) -> Result<Vec<FareRecord>, StoreError> {
        let conn = self.lock()?;
        read_records(&conn, &format!("{SELECT_COLUMNS} ORDER BY seq"), &[])
    }

    fn clear(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM fare_records", [])?;
        log::info!("Cleared {removed} fare record(s)");
        Ok(())
    }
}
