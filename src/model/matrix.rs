//! Square relational matrices.
//!
//! `Matrix` is the node-level tie matrix as read from disk: valued,
//! possibly directed, rows and columns indexed by the same ordered node ids.
//! `CleanedMatrix` is the symmetric binary form the cohesion engine works on.
//!
//! Both enforce their shape invariant at construction, never at use.

use std::collections::HashMap;

use serde::Serialize;

use super::NodeId;
use crate::{Error, Result};

// ============================================================================
// Matrix
// ============================================================================

/// Square matrix of tie values indexed by node id.
///
/// Entry `(i, j)` is the directed tie value from node `i` to node `j`,
/// `0.0` meaning no tie. Storage is row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    nodes: Vec<NodeId>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
    values: Vec<f64>,
}

impl Matrix {
    /// Build from node ids and a row-major buffer of `n * n` values.
    pub fn new(nodes: Vec<NodeId>, values: Vec<f64>) -> Result<Self> {
        let n = nodes.len();
        if values.len() != n * n {
            return Err(Error::ShapeMismatch(format!(
                "{} node ids but {} values (expected {})",
                n,
                values.len(),
                n * n
            )));
        }
        let index = build_index(&nodes)?;
        Ok(Self { nodes, index, values })
    }

    /// Build from node ids and one `Vec` per row.
    pub fn from_rows(nodes: Vec<NodeId>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = nodes.len();
        if rows.len() != n {
            return Err(Error::ShapeMismatch(format!(
                "{} node ids but {} rows",
                n,
                rows.len()
            )));
        }
        let mut values = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(Error::ShapeMismatch(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            values.extend(row);
        }
        Self::new(nodes, values)
    }

    /// Build from rows, naming nodes by position (`"0"`, `"1"`, ...).
    pub fn from_unlabeled_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let nodes = (0..rows.len()).map(NodeId::from).collect();
        Self::from_rows(nodes, rows)
    }

    /// All-zero matrix over the given nodes.
    pub fn zeros(nodes: Vec<NodeId>) -> Result<Self> {
        let n = nodes.len();
        Self::new(nodes, vec![0.0; n * n])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Position of a node in the row/column ordering.
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.nodes.len() + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let n = self.nodes.len();
        self.values[i * n + j] = value;
    }

    /// Tie value from `from` to `to`, by node id.
    pub fn value(&self, from: &NodeId, to: &NodeId) -> Option<f64> {
        let i = self.position(from)?;
        let j = self.position(to)?;
        Some(self.get(i, j))
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.nodes.len();
        &self.values[i * n..(i + 1) * n]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.len()).map(|i| self.row(i).to_vec()).collect()
    }

    /// True when every entry is exactly 0 or 1.
    pub fn is_binary(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0 || v == 1.0)
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| (i + 1..n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Permute rows and columns: position `k` of the result holds the node
    /// that was at `order[k]`.
    pub fn reorder(&self, order: &[usize]) -> Result<Self> {
        if order.len() != self.len() {
            return Err(Error::AlignmentError(format!(
                "ordering of length {} is not a permutation of {} nodes",
                order.len(),
                self.len()
            )));
        }
        self.submatrix(order)
    }

    /// Rows and columns at `keep`, in that order. Indices must be distinct.
    pub fn submatrix(&self, keep: &[usize]) -> Result<Self> {
        let n = self.len();
        let mut seen = vec![false; n];
        if keep.iter().any(|&p| p >= n || std::mem::replace(&mut seen[p], true)) {
            return Err(Error::AlignmentError(format!(
                "node selection {keep:?} is out of range or repeats a node of {n}"
            )));
        }
        let nodes = keep.iter().map(|&p| self.nodes[p].clone()).collect();
        let mut values = Vec::with_capacity(keep.len() * keep.len());
        for &r in keep {
            for &c in keep {
                values.push(self.get(r, c));
            }
        }
        Self::new(nodes, values)
    }

    /// Apply `f` to every entry, keeping the node index.
    pub(crate) fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            nodes: self.nodes.clone(),
            index: self.index.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}

fn build_index(nodes: &[NodeId]) -> Result<HashMap<NodeId, usize>> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, id) in nodes.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(Error::AlignmentError(format!("duplicate node id '{id}'")));
        }
    }
    Ok(index)
}

// ============================================================================
// CleanedMatrix
// ============================================================================

/// Symmetric binary tie matrix, positional.
///
/// Produced by [`crate::transform::clean_matrix`] or by the permutation
/// generator. The diagonal is carried through from the source and is never
/// counted as a tie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedMatrix {
    size: usize,
    cells: Vec<u8>,
}

impl CleanedMatrix {
    /// No ties at all.
    pub fn empty(size: usize) -> Self {
        Self { size, cells: vec![0; size * size] }
    }

    /// Build from a list of undirected ties `(i, j)`, `i != j`.
    pub fn from_ties(size: usize, ties: &[(usize, usize)]) -> Result<Self> {
        let mut m = Self::empty(size);
        for &(i, j) in ties {
            if i >= size || j >= size || i == j {
                return Err(Error::ShapeMismatch(format!(
                    "tie ({i}, {j}) is not an off-diagonal pair of a {size}-node matrix"
                )));
            }
            m.set_tie(i, j);
        }
        Ok(m)
    }

    /// Caller guarantees `cells` is `size * size`, symmetric, and in {0, 1}.
    pub(crate) fn from_cells(size: usize, cells: Vec<u8>) -> Self {
        debug_assert_eq!(cells.len(), size * size);
        Self { size, cells }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn has_tie(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.size + j] == 1
    }

    #[inline]
    pub(crate) fn set_tie(&mut self, i: usize, j: usize) {
        self.cells[i * self.size + j] = 1;
        self.cells[j * self.size + i] = 1;
    }

    /// Number of undirected ties (upper triangle, diagonal excluded).
    pub fn tie_count(&self) -> usize {
        let n = self.size;
        (0..n)
            .map(|i| (i + 1..n).filter(|&j| self.has_tie(i, j)).count())
            .sum()
    }

    /// Number of unordered off-diagonal node pairs, `n(n-1)/2`.
    pub fn pair_capacity(&self) -> usize {
        pair_capacity(self.size)
    }

    /// Sum of all cells, diagonal included.
    pub fn cell_sum(&self) -> usize {
        self.cells.iter().map(|&c| c as usize).sum()
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.size.max(1)).take(self.size).map(<[u8]>::to_vec).collect()
    }

    /// Re-attach node ids, yielding a 0/1 valued `Matrix`.
    pub fn to_matrix(&self, nodes: Vec<NodeId>) -> Result<Matrix> {
        if nodes.len() != self.size {
            return Err(Error::AlignmentError(format!(
                "{} node ids for a {}-node matrix",
                nodes.len(),
                self.size
            )));
        }
        Matrix::new(nodes, self.cells.iter().map(|&c| c as f64).collect())
    }
}

/// Unordered off-diagonal pairs among `n` nodes.
pub fn pair_capacity(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}
