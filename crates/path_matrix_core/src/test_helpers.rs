//! Test helpers shared by unit tests, integration tests and downstream crates.
//!
//! [`InMemoryTableStore`] implements [`DistanceTableStore`] over a mutex-guarded
//! map of tables, with knobs for injecting the failure modes the handler has
//! to survive.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::contract::{DistanceRow, RowKey};
use crate::store::{
    DistanceTableStore, StoreError, TableHandle, TableProvision, DEFAULT_MAX_BATCH_SIZE,
};

/// The fixture graph used across test files.
pub const FIXTURE_GRAPH: &str = "Chicago->Urbana,Urbana->Springfield,Chicago->Lafayette";

#[derive(Debug, Default)]
struct StoreState {
    tables: HashMap<String, BTreeMap<RowKey, i64>>,
    put_batch_sizes: Vec<usize>,
    delete_batch_sizes: Vec<usize>,
    ensure_calls: usize,
    successful_put_batches: usize,
}

#[derive(Debug)]
pub struct InMemoryTableStore {
    state: Mutex<StoreState>,
    max_batch_size: usize,
    ensure_failure: Option<String>,
    fail_puts_after_batches: Option<usize>,
}

impl Default for InMemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            ensure_failure: None,
            fail_puts_after_batches: None,
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Every `ensure_table` call fails as if the table could not be created.
    pub fn with_ensure_failure(mut self, message: impl Into<String>) -> Self {
        self.ensure_failure = Some(message.into());
        self
    }

    /// `batch_put` succeeds `batches` times and fails from then on.
    pub fn with_put_failure_after(mut self, batches: usize) -> Self {
        self.fail_puts_after_batches = Some(batches);
        self
    }

    /// Rows of `table` in key order; empty when the table does not exist.
    pub fn rows(&self, table: &str) -> Vec<DistanceRow> {
        self.lock()
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .map(|(key, distance)| DistanceRow {
                        source: key.source.clone(),
                        destination: key.destination.clone(),
                        distance: *distance,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn distance(&self, table: &str, source: &str, destination: &str) -> Option<i64> {
        let key = RowKey {
            source: source.to_string(),
            destination: destination.to_string(),
        };
        self.lock()
            .tables
            .get(table)
            .and_then(|rows| rows.get(&key).copied())
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.lock().tables.contains_key(table)
    }

    pub fn put_batch_sizes(&self) -> Vec<usize> {
        self.lock().put_batch_sizes.clone()
    }

    pub fn delete_batch_sizes(&self) -> Vec<usize> {
        self.lock().delete_batch_sizes.clone()
    }

    pub fn ensure_calls(&self) -> usize {
        self.lock().ensure_calls
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("poisoned mutex")
    }

    fn missing_table(table: &TableHandle, operation: &'static str) -> StoreError {
        StoreError::Request {
            table: table.name().to_string(),
            operation,
            message: "table does not exist".to_string(),
        }
    }
}

impl DistanceTableStore for InMemoryTableStore {
    fn ensure_table(&self, name: &str) -> Result<TableProvision, StoreError> {
        let mut state = self.lock();
        state.ensure_calls += 1;

        if let Some(message) = &self.ensure_failure {
            return Err(StoreError::Unavailable {
                table: name.to_string(),
                message: message.clone(),
            });
        }

        let handle = TableHandle::new(name);
        if state.tables.contains_key(name) {
            return Ok(TableProvision::AlreadyExists(handle));
        }
        state.tables.insert(name.to_string(), BTreeMap::new());
        Ok(TableProvision::Created(handle))
    }

    fn scan_all(&self, table: &TableHandle) -> Result<Vec<DistanceRow>, StoreError> {
        if !self.table_exists(table.name()) {
            return Err(Self::missing_table(table, "scan"));
        }
        Ok(self.rows(table.name()))
    }

    fn batch_delete(&self, table: &TableHandle, keys: &[RowKey]) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.delete_batch_sizes.push(keys.len());
        let rows = state
            .tables
            .get_mut(table.name())
            .ok_or_else(|| Self::missing_table(table, "batch_delete"))?;
        for key in keys {
            rows.remove(key);
        }
        Ok(())
    }

    fn batch_put(&self, table: &TableHandle, rows: &[DistanceRow]) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(limit) = self.fail_puts_after_batches {
            if state.successful_put_batches >= limit {
                return Err(StoreError::Request {
                    table: table.name().to_string(),
                    operation: "batch_put",
                    message: format!("refused after {limit} batch(es)"),
                });
            }
        }

        state.put_batch_sizes.push(rows.len());
        state.successful_put_batches += 1;
        let stored = state
            .tables
            .get_mut(table.name())
            .ok_or_else(|| Self::missing_table(table, "batch_put"))?;
        for row in rows {
            stored.insert(row.key(), row.distance);
        }
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}
