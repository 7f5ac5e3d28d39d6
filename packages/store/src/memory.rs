//! In-process fare storage.
//!
//! Records live until the store is dropped or cleared. Used for demos,
//! tests, and servers started without a data directory.

use std::sync::{Mutex, MutexGuard};

use campus_fares_fare_models::{FareRecord, NewFareRecord};

use crate::{FareStore, StoreError, prepare_record};

/// A [`FareStore`] backed by a `Vec` behind a `Mutex`.
#[derive(Debug, Default)]
pub struct MemoryFareStore {
    records: Mutex<Vec<FareRecord>>,
}

impl MemoryFareStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<FareRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::unavailable("memory store mutex poisoned"))
    }
}

impl FareStore for MemoryFareStore {
    fn append(&self, input: NewFareRecord) -> Result<FareRecord, StoreError> {
        let record = prepare_record(input)?;
        self.lock()?.push(record.clone());
        log::debug!(
            "Stored fare {} for place '{}' in memory",
            record.id,
            record.place_key
        );
        Ok(record)
    }

    fn list_by_place(&self, place_key: &str) -> Result<Vec<FareRecord>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| r.place_key == place_key)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<FareRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn lists_by_place_in_insertion_order() {
        let store = MemoryFareStore::new();
        store.append(NewFareRecord::new("sangam", 45.0)).unwrap();
        store.append(NewFareRecord::new("library", 10.0)).unwrap();
        store.append(NewFareRecord::new("sangam", 50.0)).unwrap();

        let amounts: Vec<f64> = store
            .list_by_place("sangam")
            .unwrap()
            .iter()
            .map(|r| r.amount)
            .collect();
        assert_eq!(amounts, vec![45.0, 50.0]);
    }

    #[test]
    fn unknown_place_is_empty() {
        let store = MemoryFareStore::new();
        assert!(store.list_by_place("nowhere").unwrap().is_empty());
    }

    #[test]
    fn rejected_append_leaves_store_unchanged() {
        let store = MemoryFareStore::new();
        store.append(NewFareRecord::new("sangam", 45.0)).unwrap();

        let err = store.append(NewFareRecord::new("sangam", 0.0)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));

        let err = store.append(NewFareRecord::new("", 30.0)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));

        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = MemoryFareStore::new();
        store.append(NewFareRecord::new("sangam", 45.0)).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryFareStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let amount = f64::from(t * 100 + i + 1);
                        store.append(NewFareRecord::new("sangam", amount)).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.list_by_place("sangam").unwrap().len(), 200);
    }
}
