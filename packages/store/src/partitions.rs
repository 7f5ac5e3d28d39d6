//! Per-identity partition registry.
//!
//! Every identity context (a signed-in user, a browser session, or the
//! shared `anonymous` bucket) gets its own [`FareStore`]. Stores are
//! opened lazily on first use and cached for the life of the registry.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use campus_fares_fare_models::ANONYMOUS_SUBMITTER;

use crate::fare_db::DuckDbFareStore;
use crate::memory::MemoryFareStore;
use crate::{FareStore, StoreError};

/// Where partitions keep their records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-lifetime storage, lost on exit.
    Memory,
    /// One `DuckDB` file per partition under `data_dir/partitions/`.
    DuckDb {
        /// Root data directory.
        data_dir: PathBuf,
    },
}

impl StoreBackend {
    /// `DuckDB` storage under the default data directory.
    #[must_use]
    pub fn default_duckdb() -> Self {
        Self::DuckDb {
            data_dir: crate::paths::data_dir(),
        }
    }

    /// Parses a backend name (`memory` or `duckdb`), using the default data
    /// directory for `duckdb`. Returns `None` for anything else.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "duckdb" | "" => Some(Self::default_duckdb()),
            _ => None,
        }
    }

    fn open(&self, partition: &str) -> Result<Arc<dyn FareStore>, StoreError> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryFareStore::new())),
            Self::DuckDb { data_dir } => {
                let path = crate::paths::partition_db_path(data_dir, partition);
                Ok(Arc::new(DuckDbFareStore::open(&path)?))
            }
        }
    }
}

/// Normalizes an identity into a partition name.
///
/// Missing or blank identities share the `anonymous` partition.
#[must_use]
pub fn partition_name(identity: Option<&str>) -> String {
    identity
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS_SUBMITTER)
        .to_string()
}

/// Lazily opened map of partition name to store.
pub struct FarePartitions {
    backend: StoreBackend,
    stores: Mutex<BTreeMap<String, Arc<dyn FareStore>>>,
}

impl FarePartitions {
    /// Creates an empty registry using `backend` for new partitions.
    #[must_use]
    pub fn new(backend: StoreBackend) -> Self {
        Self {
            backend,
            stores: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the store for `identity`, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageUnavailable`] if the partition cannot be
    /// opened.
    pub fn store_for(&self, identity: Option<&str>) -> Result<Arc<dyn FareStore>, StoreError> {
        let name = partition_name(identity);

        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StoreError::unavailable("partition registry mutex poisoned"))?;

        if let Some(store) = stores.get(&name) {
            return Ok(Arc::clone(store));
        }

        let store = self.backend.open(&name)?;
        log::info!("Opened fare partition '{name}'");
        stores.insert(name, Arc::clone(&store));

        Ok(store)
    }
}
