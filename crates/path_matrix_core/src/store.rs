//! Key-value table contract consumed by the materializer.
//!
//! Implementations own the transport. The AWS-backed one lives in
//! `path_matrix_lambda::adapters::dynamodb`; an in-memory one is in
//! [`crate::test_helpers`].

use thiserror::Error;

use crate::contract::{DistanceRow, RowKey};

/// DynamoDB's `BatchWriteItem` limit.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("table '{table}' is unavailable: {message}")]
    Unavailable { table: String, message: String },
    #[error("table '{table}' did not become active within {waited_secs}s")]
    TableNotReady { table: String, waited_secs: u64 },
    #[error("{operation} on table '{table}' failed: {message}")]
    Request {
        table: String,
        operation: &'static str,
        message: String,
    },
    #[error("{operation} on table '{table}' left {unprocessed} item(s) unprocessed")]
    PartialWrite {
        table: String,
        operation: &'static str,
        unprocessed: usize,
    },
    #[error("row in table '{table}' could not be decoded: {message}")]
    Decode { table: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableHandle {
    name: String,
}

impl TableHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Outcome of a create-if-absent call. Losing a creation race is not an
/// error: it yields [`TableProvision::AlreadyExists`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableProvision {
    Created(TableHandle),
    AlreadyExists(TableHandle),
}

impl TableProvision {
    pub fn into_handle(self) -> TableHandle {
        match self {
            Self::Created(handle) | Self::AlreadyExists(handle) => handle,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

pub trait DistanceTableStore {
    /// Idempotent create-if-absent. Any failure other than "already exists"
    /// is returned as an error.
    fn ensure_table(&self, name: &str) -> Result<TableProvision, StoreError>;

    /// Every row currently in the table, in no particular order.
    fn scan_all(&self, table: &TableHandle) -> Result<Vec<DistanceRow>, StoreError>;

    fn batch_delete(&self, table: &TableHandle, keys: &[RowKey]) -> Result<(), StoreError>;

    fn batch_put(&self, table: &TableHandle, rows: &[DistanceRow]) -> Result<(), StoreError>;

    /// Upper bound on keys or rows passed to a single batch call.
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }
}

impl<T: DistanceTableStore + ?Sized> DistanceTableStore for &T {
    fn ensure_table(&self, name: &str) -> Result<TableProvision, StoreError> {
        (**self).ensure_table(name)
    }

    fn scan_all(&self, table: &TableHandle) -> Result<Vec<DistanceRow>, StoreError> {
        (**self).scan_all(table)
    }

    fn batch_delete(&self, table: &TableHandle, keys: &[RowKey]) -> Result<(), StoreError> {
        (**self).batch_delete(table, keys)
    }

    fn batch_put(&self, table: &TableHandle, rows: &[DistanceRow]) -> Result<(), StoreError> {
        (**self).batch_put(table, rows)
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }
}
