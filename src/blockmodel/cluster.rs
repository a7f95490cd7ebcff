//! Hierarchical agglomerative clustering on a precomputed similarity matrix.
//!
//! Distances are `1 - similarity`. Complete linkage: the distance between
//! two clusters is the largest pairwise distance between their members,
//! maintained with the Lance–Williams update `d(k, a∪b) = max(d(k,a), d(k,b))`.

use tracing::{debug, warn};

use crate::model::{BlockLabeling, Matrix};
use crate::{Error, Result};

/// Cluster nodes into exactly `num_blocks` blocks.
///
/// At every step the closest pair of active clusters is merged; among equal
/// distances the pair with the lowest cluster indices wins. Blocks are
/// numbered in order of their lowest-indexed member, starting at
/// `label_base`. `NaN` similarities (undefined correlations) are treated as
/// similarity 0, i.e. distance 1.
pub fn cluster_blocks(similarity: &Matrix, num_blocks: usize, label_base: u32) -> Result<BlockLabeling> {
    let n = similarity.len();
    if n == 0 {
        return Err(Error::EmptyInput("clustering an empty similarity matrix".into()));
    }
    if num_blocks == 0 || num_blocks > n {
        return Err(Error::InvalidBlockCount { requested: num_blocks, nodes: n });
    }

    let mut dist = distance_matrix(similarity);

    // owner[v] is the representative of v's cluster: always its lowest member.
    let mut owner: Vec<usize> = (0..n).collect();
    let mut active = vec![true; n];
    let mut nearest: Vec<Option<(usize, f64)>> = (0..n).map(|i| nearest_above(&dist, &active, n, i)).collect();
    let mut remaining = n;

    while remaining > num_blocks {
        let (a, b, d) = closest_pair(&nearest, &active);
        for k in 0..n {
            if active[k] && k != a && k != b {
                let merged = dist[a * n + k].max(dist[b * n + k]);
                dist[a * n + k] = merged;
                dist[k * n + a] = merged;
            }
        }
        active[b] = false;
        nearest[b] = None;
        for o in owner.iter_mut().filter(|o| **o == b) {
            *o = a;
        }
        remaining -= 1;

        // Merged distances only grow, so only rows that pointed at a or b
        // (and row a itself) can have a different nearest neighbour.
        for i in (0..n).filter(|&i| active[i]) {
            let stale = i == a || nearest[i].is_some_and(|(j, _)| j == a || j == b);
            if stale {
                nearest[i] = nearest_above(&dist, &active, n, i);
            }
        }
        debug!(into = a, from = b, distance = d, remaining, "merged clusters");
    }

    let reps: Vec<usize> = (0..n).filter(|&v| active[v]).collect();
    let labels = owner
        .iter()
        .map(|o| {
            let rank = reps.iter().position(|r| r == o).unwrap_or(0);
            label_base + rank as u32
        })
        .collect();

    BlockLabeling::new(similarity.nodes().to_vec(), labels)
}

fn distance_matrix(similarity: &Matrix) -> Vec<f64> {
    let n = similarity.len();
    let mut undefined = 0usize;
    let mut dist = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let s = similarity.get(i, j);
            dist[i * n + j] = if s.is_nan() {
                undefined += 1;
                1.0
            } else {
                1.0 - s
            };
        }
    }
    if undefined > 0 {
        warn!(cells = undefined, "undefined similarities treated as distance 1.0");
    }
    dist
}

/// Closest active cluster `j > i` to `i`, lowest `j` among equals.
fn nearest_above(dist: &[f64], active: &[bool], n: usize, i: usize) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for j in (i + 1..n).filter(|&j| active[j]) {
        let d = dist[i * n + j];
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((j, d));
        }
    }
    best
}

/// Lowest-distance pair `(i, j, d)` of active clusters, `i < j`, first in
/// row-major order among equals.
fn closest_pair(nearest: &[Option<(usize, f64)>], active: &[bool]) -> (usize, usize, f64) {
    let mut best: Option<(usize, usize, f64)> = None;
    for (i, cached) in nearest.iter().enumerate().filter(|&(i, _)| active[i]) {
        if let Some((j, d)) = *cached {
            if best.is_none_or(|(_, _, bd)| d < bd) {
                best = Some((i, j, d));
            }
        }
    }
    // Callers only ask while at least two clusters are active.
    best.unwrap_or((0, 0, 0.0))
}
