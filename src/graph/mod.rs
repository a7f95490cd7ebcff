//! # Graph Construction Adapter
//!
//! Builds an attributed graph from a relational matrix (ties run FROM rows
//! TO columns) and an optional attribute table, and computes the node- and
//! network-level measures the presentation layer displays.
//!
//! Every call returns fresh values; nothing is cached between calls.

pub mod centrality;

pub use centrality::{network_calculations, node_calculation, NetworkStats, NodeCentralities};

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{AttributeTable, AttributeValue, Matrix, NodeId};

/// A node with its attribute record (empty when the table has no row for it).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// A weighted tie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
}

/// Attributed social graph.
#[derive(Debug, Clone, Serialize)]
pub struct SocialGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
    directed: bool,
    #[serde(skip)]
    outgoing: Vec<Vec<usize>>,
    #[serde(skip)]
    incoming: Vec<Vec<usize>>,
}

impl SocialGraph {
    /// Build from a matrix. Every matrix node becomes a graph node; non-zero
    /// off-diagonal cells become edges. Undirected graphs keep the first
    /// cell met for each unordered pair (row-major), self-loops are dropped.
    pub fn from_matrix(matrix: &Matrix, attributes: Option<&AttributeTable>, directed: bool) -> Self {
        let n = matrix.len();
        let nodes = matrix
            .nodes()
            .iter()
            .map(|id| GraphNode {
                id: id.clone(),
                attributes: attributes
                    .and_then(|t| {
                        t.record(id).map(|rec| {
                            t.columns().iter().cloned().zip(rec.iter().cloned()).collect()
                        })
                    })
                    .unwrap_or_default(),
            })
            .collect();

        let mut edges = Vec::new();
        let mut outgoing = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];
        let mut seen = HashSet::new();

        for i in 0..n {
            for j in 0..n {
                let weight = matrix.get(i, j);
                if i == j || weight == 0.0 || weight.is_nan() {
                    continue;
                }
                if !directed && !seen.insert((i.min(j), i.max(j))) {
                    continue;
                }
                edges.push(Edge {
                    source: matrix.nodes()[i].clone(),
                    target: matrix.nodes()[j].clone(),
                    weight,
                });
                outgoing[i].push(j);
                incoming[j].push(i);
                if !directed {
                    outgoing[j].push(i);
                    incoming[i].push(j);
                }
            }
        }

        debug!(nodes = n, edges = edges.len(), directed, "built social graph");
        Self { nodes, edges, directed, outgoing, incoming }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Successors of `v` (all neighbors when undirected).
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.outgoing[v]
    }

    /// Predecessors of `v` (all neighbors when undirected).
    pub fn incoming_neighbors(&self, v: usize) -> &[usize] {
        &self.incoming[v]
    }

    /// Number of ties touching `v`, in and out.
    pub fn degree(&self, v: usize) -> usize {
        if self.directed {
            self.outgoing[v].len() + self.incoming[v].len()
        } else {
            self.outgoing[v].len()
        }
    }
}
