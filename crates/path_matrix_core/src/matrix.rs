//! All-pairs distance matrix computation.
//!
//! Each source vertex is independent of every other, so sources are fanned
//! out across a rayon pool and the rows are gathered back in
//! `(source, destination)` order before anything is written.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::contract::DistanceRow;
use crate::graph::{Graph, Vertex};
use crate::materialize::MaterializeError;
use crate::shortest_path::{distances_from, UNREACHABLE_DISTANCE};

/// Computes one row per ordered pair of `vertices × vertices`, self pairs
/// included.
///
/// `workers` sizes a dedicated thread pool; `None` runs on rayon's global
/// pool.
pub fn compute_distance_rows(
    vertices: &BTreeSet<Vertex>,
    graph: &Graph,
    workers: Option<usize>,
) -> Result<Vec<DistanceRow>, MaterializeError> {
    let sources: Vec<&Vertex> = vertices.iter().collect();
    let compute = || -> Vec<Vec<DistanceRow>> {
        sources
            .par_iter()
            .map(|source| rows_for_source(source, vertices, graph))
            .collect()
    };

    let per_source = match workers {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|error| MaterializeError::WorkerPool(error.to_string()))?
            .install(compute),
        None => compute(),
    };

    Ok(per_source.into_iter().flatten().collect())
}

/// One BFS per source covers every destination in its row.
fn rows_for_source(source: &str, vertices: &BTreeSet<Vertex>, graph: &Graph) -> Vec<DistanceRow> {
    let reached = distances_from(graph, source);
    vertices
        .iter()
        .map(|destination| DistanceRow {
            source: source.to_string(),
            destination: destination.clone(),
            distance: reached
                .get(destination.as_str())
                .map(|hops| *hops as i64)
                .unwrap_or(UNREACHABLE_DISTANCE),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::parse_edge_list;

    #[test]
    fn produces_full_cross_product_in_key_order() {
        let parsed = parse_edge_list("Chicago->Urbana,Urbana->Springfield,Chicago->Lafayette")
            .expect("fixture should parse");

        let rows = compute_distance_rows(&parsed.vertices, &parsed.graph, Some(2))
            .expect("rows should compute");

        assert_eq!(rows.len(), 16);
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|row| (row.source.as_str(), row.destination.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);

        let chicago_springfield = rows
            .iter()
            .find(|row| row.source == "Chicago" && row.destination == "Springfield")
            .expect("pair should exist");
        assert_eq!(chicago_springfield.distance, 2);
        assert!(rows
            .iter()
            .filter(|row| row.source == row.destination)
            .all(|row| row.distance == 0));
    }

    #[test]
    fn pool_size_does_not_change_results() {
        let parsed = parse_edge_list("a->b,b->c,c->a,c->d,e->a").expect("graph should parse");

        let single = compute_distance_rows(&parsed.vertices, &parsed.graph, Some(1))
            .expect("single worker should compute");
        let default_pool = compute_distance_rows(&parsed.vertices, &parsed.graph, None)
            .expect("default pool should compute");

        assert_eq!(single, default_pool);
    }

    #[test]
    fn rows_agree_with_pairwise_distance() {
        let parsed = parse_edge_list("a->b,b->c,c->a,c->d,e->a,d->d").expect("graph should parse");

        let rows = compute_distance_rows(&parsed.vertices, &parsed.graph, None)
            .expect("rows should compute");

        for row in rows {
            assert_eq!(
                row.distance,
                crate::shortest_path::distance(&parsed.graph, &row.source, &row.destination),
                "{} -> {}",
                row.source,
                row.destination
            );
        }
    }
}
