//! Unweighted shortest-path hop counts via breadth-first search.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::graph::Graph;

/// Distance stored for a pair with no connecting path.
pub const UNREACHABLE_DISTANCE: i64 = -1;

/// Hop count of the shortest path from `start` to `end`, or `None` when
/// `end` cannot be reached.
///
/// A vertex always reaches itself in zero hops, whether or not it has edges.
pub fn hop_distance(graph: &Graph, start: &str, end: &str) -> Option<usize> {
    if start == end {
        return Some(0);
    }

    let mut visited: HashSet<&str> = HashSet::from([start]);
    let mut frontier: VecDeque<(&str, usize)> = VecDeque::from([(start, 0)]);

    while let Some((current, depth)) = frontier.pop_front() {
        for neighbor in graph.neighbors(current) {
            if neighbor == end {
                return Some(depth + 1);
            }
            // Marked on enqueue so a vertex with several in-edges is queued once.
            if visited.insert(neighbor.as_str()) {
                frontier.push_back((neighbor.as_str(), depth + 1));
            }
        }
    }

    None
}

/// Same as [`hop_distance`], with unreachable pairs mapped to
/// [`UNREACHABLE_DISTANCE`].
pub fn distance(graph: &Graph, start: &str, end: &str) -> i64 {
    hop_distance(graph, start, end)
        .map(|hops| hops as i64)
        .unwrap_or(UNREACHABLE_DISTANCE)
}

/// Single-source BFS returning the hop count of every vertex reachable from
/// `start`, including `start` itself at zero.
pub fn distances_from<'g>(graph: &'g Graph, start: &'g str) -> BTreeMap<&'g str, usize> {
    let mut distances = BTreeMap::from([(start, 0usize)]);
    let mut frontier = VecDeque::from([start]);

    while let Some(current) = frontier.pop_front() {
        let depth = distances[current];
        for neighbor in graph.neighbors(current) {
            if !distances.contains_key(neighbor.as_str()) {
                distances.insert(neighbor.as_str(), depth + 1);
                frontier.push_back(neighbor.as_str());
            }
        }
    }

    distances
}
