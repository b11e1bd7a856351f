//! Clear-then-repopulate refresh of the persisted distance table.
//!
//! The two phases are not transactional. A failure after the clear phase
//! leaves the table empty or partially written until the next successful
//! run; callers surface that as a failed refresh and do not attempt repair.

use std::collections::BTreeSet;
use std::time::Instant;

use thiserror::Error;

use crate::contract::{DistanceRow, RowKey};
use crate::graph::{Graph, Vertex};
use crate::matrix::compute_distance_rows;
use crate::store::{DistanceTableStore, StoreError, TableHandle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to build distance worker pool: {0}")]
    WorkerPool(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Thread count for the BFS fan-out; `None` lets rayon decide.
    pub distance_workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeReport {
    pub vertex_count: usize,
    pub rows_deleted: usize,
    pub rows_written: usize,
}

/// Replaces the full content of `table` with the distance matrix of
/// `graph` over `vertices`.
///
/// Rows are computed before the table is touched, so the window in which
/// the table is empty only spans store I/O.
pub fn materialize(
    store: &impl DistanceTableStore,
    table: &TableHandle,
    vertices: &BTreeSet<Vertex>,
    graph: &Graph,
    options: MaterializeOptions,
) -> Result<MaterializeReport, MaterializeError> {
    let started_at = Instant::now();
    let rows = compute_distance_rows(vertices, graph, options.distance_workers)?;
    tracing::debug!(
        component = "materializer",
        event = "distances_computed",
        table = table.name(),
        rows = rows.len(),
        duration_ms = started_at.elapsed().as_millis() as u64,
    );

    let rows_deleted = clear_table(store, table)?;
    let rows_written = write_rows(store, table, &rows)?;

    Ok(MaterializeReport {
        vertex_count: vertices.len(),
        rows_deleted,
        rows_written,
    })
}

/// Deletes every row currently in `table`, returning how many were removed.
pub fn clear_table(
    store: &impl DistanceTableStore,
    table: &TableHandle,
) -> Result<usize, StoreError> {
    let keys: Vec<RowKey> = store
        .scan_all(table)?
        .iter()
        .map(DistanceRow::key)
        .collect();

    for chunk in keys.chunks(batch_size(store)) {
        store.batch_delete(table, chunk)?;
    }

    tracing::info!(
        component = "materializer",
        event = "table_cleared",
        table = table.name(),
        rows_deleted = keys.len(),
    );
    Ok(keys.len())
}

fn write_rows(
    store: &impl DistanceTableStore,
    table: &TableHandle,
    rows: &[DistanceRow],
) -> Result<usize, StoreError> {
    for chunk in rows.chunks(batch_size(store)) {
        store.batch_put(table, chunk)?;
    }

    tracing::info!(
        component = "materializer",
        event = "table_repopulated",
        table = table.name(),
        rows_written = rows.len(),
    );
    Ok(rows.len())
}

fn batch_size(store: &impl DistanceTableStore) -> usize {
    store.max_batch_size().max(1)
}

#[cfg(all(test, feature = "test-helpers"))]
mod tests {
    use super::*;
    use crate::graph::parse_edge_list;
    use crate::test_helpers::InMemoryTableStore;

    #[test]
    fn writes_in_batches_no_larger_than_store_limit() {
        let store = InMemoryTableStore::new().with_max_batch_size(4);
        let table = store
            .ensure_table("paths")
            .expect("table should be created")
            .into_handle();
        let parsed = parse_edge_list("a->b,b->c").expect("graph should parse");

        let report = materialize(
            &store,
            &table,
            &parsed.vertices,
            &parsed.graph,
            MaterializeOptions::default(),
        )
        .expect("materialize should succeed");

        assert_eq!(report.rows_written, 9);
        assert_eq!(store.put_batch_sizes(), vec![4, 4, 1]);
    }

    #[test]
    fn clear_table_removes_rows_of_unrelated_vertices() {
        let store = InMemoryTableStore::new();
        let table = store
            .ensure_table("paths")
            .expect("table should be created")
            .into_handle();
        store
            .batch_put(
                &table,
                &[DistanceRow {
                    source: "ghost".to_string(),
                    destination: "ghost".to_string(),
                    distance: 0,
                }],
            )
            .expect("seed row should be written");

        let deleted = clear_table(&store, &table).expect("clear should succeed");

        assert_eq!(deleted, 1);
        assert!(store.rows("paths").is_empty());
    }

    #[test]
    fn zero_batch_size_is_treated_as_one() {
        let store = InMemoryTableStore::new().with_max_batch_size(0);
        let table = store
            .ensure_table("paths")
            .expect("table should be created")
            .into_handle();
        let parsed = parse_edge_list("a->b").expect("graph should parse");

        materialize(
            &store,
            &table,
            &parsed.vertices,
            &parsed.graph,
            MaterializeOptions::default(),
        )
        .expect("materialize should succeed");

        assert_eq!(store.put_batch_sizes(), vec![1, 1, 1, 1]);
    }
}
