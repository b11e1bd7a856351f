//! Shortest-path distance matrix domain primitives.
//!
//! This crate owns edge-list parsing, the BFS distance engine, the table
//! store contract and the clear-then-repopulate materializer. It excludes
//! the AWS SDK and Lambda runtime; those live in `path_matrix_lambda`.

pub mod contract;
pub mod graph;
pub mod materialize;
pub mod matrix;
pub mod shortest_path;
pub mod store;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
