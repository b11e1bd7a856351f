//! Edge-list parsing into a directed adjacency mapping.
//!
//! The accepted grammar is purely syntactic: the text is split on `,` into
//! edge tokens and every token is split on `->` into its two endpoints.
//! Vertex names are never trimmed or validated beyond being non-empty.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

pub const EDGE_SEPARATOR: char = ',';
pub const ENDPOINT_SEPARATOR: &str = "->";

pub type Vertex = String;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphParseError {
    #[error("edge #{index} is empty")]
    EmptyEdge { index: usize },
    #[error("edge #{index} ('{token}') must have the form <source>-><destination>")]
    MalformedEdge { index: usize, token: String },
    #[error("edge #{index} ('{token}') has an empty endpoint")]
    EmptyVertex { index: usize, token: String },
}

/// Directed, unweighted adjacency list.
///
/// Only vertices with at least one outgoing edge appear as keys. Duplicate
/// edges are kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    adjacency: BTreeMap<Vertex, Vec<Vertex>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, source: impl Into<Vertex>, destination: impl Into<Vertex>) {
        self.adjacency
            .entry(source.into())
            .or_default()
            .push(destination.into());
    }

    pub fn neighbors(&self, vertex: &str) -> &[Vertex] {
        self.adjacency
            .get(vertex)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn adjacency(&self) -> &BTreeMap<Vertex, Vec<Vertex>> {
        &self.adjacency
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGraph {
    pub vertices: BTreeSet<Vertex>,
    pub graph: Graph,
}

/// Parses `"a->b,b->c"` into its vertex set and adjacency mapping.
///
/// Empty tokens (empty input, trailing or doubled commas) are rejected, as
/// are tokens with an empty endpoint.
pub fn parse_edge_list(text: &str) -> Result<ParsedGraph, GraphParseError> {
    let mut vertices = BTreeSet::new();
    let mut graph = Graph::new();

    for (index, token) in text.split(EDGE_SEPARATOR).enumerate() {
        if token.is_empty() {
            return Err(GraphParseError::EmptyEdge { index });
        }

        let endpoints: Vec<&str> = token.split(ENDPOINT_SEPARATOR).collect();
        let [source, destination] = endpoints.as_slice() else {
            return Err(GraphParseError::MalformedEdge {
                index,
                token: token.to_string(),
            });
        };

        if source.is_empty() || destination.is_empty() {
            return Err(GraphParseError::EmptyVertex {
                index,
                token: token.to_string(),
            });
        }

        vertices.insert((*source).to_string());
        vertices.insert((*destination).to_string());
        graph.add_edge(*source, *destination);
    }

    Ok(ParsedGraph { vertices, graph })
}
