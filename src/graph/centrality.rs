//! Node centralities and whole-network statistics.
//!
//! All measures are normalized:
//! - Degree: `deg(v) / (n - 1)`; in- plus out-ties for directed graphs
//! - Betweenness: Brandes shortest-path counts scaled by `1 / ((n-1)(n-2))`
//! - Closeness: Wasserman–Faust `((r-1)/Σd) · ((r-1)/(n-1))` over the `r`
//!   nodes that can reach `v`
//! - Density: `2m / (n(n-1))` undirected, `m / (n(n-1))` directed

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use super::SocialGraph;
use crate::model::NodeId;

/// Per-node centrality scores keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeCentralities {
    pub degree: BTreeMap<NodeId, f64>,
    pub betweenness: BTreeMap<NodeId, f64>,
    pub closeness: BTreeMap<NodeId, f64>,
}

/// Whole-network counts and density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkStats {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
}

/// Degree, betweenness and closeness for every node.
pub fn node_calculation(graph: &SocialGraph) -> NodeCentralities {
    let ids: Vec<NodeId> = graph.node_ids().cloned().collect();
    let keyed = |scores: Vec<f64>| -> BTreeMap<NodeId, f64> { ids.iter().cloned().zip(scores).collect() };

    NodeCentralities {
        degree: keyed(degree_centrality(graph)),
        betweenness: keyed(betweenness_centrality(graph)),
        closeness: keyed(closeness_centrality(graph)),
    }
}

pub fn network_calculations(graph: &SocialGraph) -> NetworkStats {
    let n = graph.node_count();
    let m = graph.edge_count();
    let density = if n <= 1 {
        0.0
    } else {
        let pairs = (n * (n - 1)) as f64;
        if graph.is_directed() {
            m as f64 / pairs
        } else {
            2.0 * m as f64 / pairs
        }
    };
    NetworkStats { nodes: n, edges: m, density }
}

pub fn degree_centrality(graph: &SocialGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|v| graph.degree(v) as f64 * scale).collect()
}

pub fn betweenness_centrality(graph: &SocialGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];
    for source in 0..n {
        let dependency = brandes_from_source(graph, source);
        for (v, d) in dependency.into_iter().enumerate() {
            if v != source {
                centrality[v] += d;
            }
        }
    }
    // Undirected sums count each pair from both ends; the scale absorbs that.
    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for c in &mut centrality {
            *c *= scale;
        }
    }
    centrality
}

pub fn closeness_centrality(graph: &SocialGraph) -> Vec<f64> {
    let n = graph.node_count();
    (0..n)
        .map(|v| {
            // distances *to* v: walk incoming ties
            let distances = bfs_distances(graph, v, true);
            let total: usize = distances.iter().filter(|&&d| d != usize::MAX).sum();
            let reachable = distances.iter().filter(|&&d| d != usize::MAX).count();
            if total == 0 || n <= 1 {
                return 0.0;
            }
            let r = (reachable - 1) as f64;
            (r / total as f64) * (r / (n - 1) as f64)
        })
        .collect()
}

/// Brandes' single-source dependency accumulation.
fn brandes_from_source(graph: &SocialGraph, source: usize) -> Vec<f64> {
    let n = graph.node_count();
    let mut stack = Vec::with_capacity(n);
    let mut paths = vec![0u64; n];
    let mut distance = vec![usize::MAX; n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut dependency = vec![0.0; n];

    paths[source] = 1;
    distance[source] = 0;
    let mut queue = VecDeque::from([source]);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in graph.neighbors(v) {
            if distance[w] == usize::MAX {
                distance[w] = distance[v] + 1;
                queue.push_back(w);
            }
            if distance[w] == distance[v] + 1 {
                paths[w] = paths[w].saturating_add(paths[v]);
                predecessors[w].push(v);
            }
        }
    }

    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            dependency[v] += (paths[v] as f64 / paths[w] as f64) * (1.0 + dependency[w]);
        }
    }
    dependency
}

/// Hop distances from `source`, or to it when `reverse` is set.
fn bfs_distances(graph: &SocialGraph, source: usize, reverse: bool) -> Vec<usize> {
    let mut distances = vec![usize::MAX; graph.node_count()];
    distances[source] = 0;
    let mut queue = VecDeque::from([source]);

    while let Some(v) = queue.pop_front() {
        let next = if reverse { graph.incoming_neighbors(v) } else { graph.neighbors(v) };
        for &w in next {
            if distances[w] == usize::MAX {
                distances[w] = distances[v] + 1;
                queue.push_back(w);
            }
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Matrix;

    fn path(directed: bool) -> SocialGraph {
        let m = Matrix::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 0.0],
            ],
        )
        .unwrap();
        SocialGraph::from_matrix(&m, None, directed)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_undirected_path() {
        let c = node_calculation(&path(false));
        let b = NodeId::from("b");
        let a = NodeId::from("a");
        assert!(close(c.degree[&a], 0.5));
        assert!(close(c.degree[&b], 1.0));
        assert!(close(c.betweenness[&b], 1.0));
        assert!(close(c.betweenness[&a], 0.0));
        assert!(close(c.closeness[&b], 1.0));
        assert!(close(c.closeness[&a], 2.0 / 3.0));
    }

    #[test]
    fn test_directed_path() {
        let c = node_calculation(&path(true));
        assert!(close(c.degree[&NodeId::from("b")], 1.0));
        assert!(close(c.betweenness[&NodeId::from("b")], 0.5));
        assert!(close(c.closeness[&NodeId::from("a")], 0.0));
        assert!(close(c.closeness[&NodeId::from("b")], 0.5));
        assert!(close(c.closeness[&NodeId::from("c")], 2.0 / 3.0));
    }

    #[test]
    fn test_density() {
        let s = network_calculations(&path(false));
        assert_eq!((s.nodes, s.edges), (3, 2));
        assert!(close(s.density, 2.0 / 3.0));
        let s = network_calculations(&path(true));
        assert!(close(s.density, 1.0 / 3.0));
    }

    #[test]
    fn test_trivial_graphs() {
        let single = SocialGraph::from_matrix(&Matrix::from_unlabeled_rows(vec![vec![0.0]]).unwrap(), None, false);
        assert_eq!(degree_centrality(&single), vec![1.0]);
        assert_eq!(closeness_centrality(&single), vec![0.0]);
        assert_eq!(network_calculations(&single).density, 0.0);

        let empty = SocialGraph::from_matrix(&Matrix::zeros(Vec::new()).unwrap(), None, false);
        assert!(node_calculation(&empty).degree.is_empty());
    }
}
