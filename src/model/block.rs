//! Block-level results: node labelings and block matrices.

use std::collections::BTreeSet;

use serde::Serialize;

use super::NodeId;
use crate::{Error, Result};

/// Assignment of every node to exactly one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockLabeling {
    nodes: Vec<NodeId>,
    labels: Vec<u32>,
}

impl BlockLabeling {
    pub fn new(nodes: Vec<NodeId>, labels: Vec<u32>) -> Result<Self> {
        if nodes.len() != labels.len() {
            return Err(Error::AlignmentError(format!(
                "{} nodes but {} block labels",
                nodes.len(),
                labels.len()
            )));
        }
        Ok(Self { nodes, labels })
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_of(&self, node: &NodeId) -> Option<u32> {
        self.nodes.iter().position(|n| n == node).map(|i| self.labels[i])
    }

    /// Unique block ids, ascending.
    pub fn distinct_blocks(&self) -> Vec<u32> {
        self.labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, u32)> {
        self.nodes.iter().zip(self.labels.iter().copied())
    }
}

/// Block-by-block tie density.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReducedBlockMatrix {
    pub blocks: Vec<u32>,
    pub values: Vec<f64>,
}

impl ReducedBlockMatrix {
    pub fn from_rows(blocks: Vec<u32>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let values = square_values(blocks.len(), rows)?;
        Ok(Self { blocks, values })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.blocks.len() + j]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        let k = self.blocks.len();
        (0..k).map(|i| self.values[i * k..(i + 1) * k].to_vec()).collect()
    }
}

/// Reduced block matrix thresholded into 0/1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMatrix {
    pub blocks: Vec<u32>,
    pub values: Vec<u8>,
}

impl ImageMatrix {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.values[i * self.blocks.len() + j]
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        let k = self.blocks.len();
        (0..k).map(|i| self.values[i * k..(i + 1) * k].to_vec()).collect()
    }
}

fn square_values(k: usize, rows: Vec<Vec<f64>>) -> Result<Vec<f64>> {
    if rows.len() != k || rows.iter().any(|r| r.len() != k) {
        return Err(Error::ShapeMismatch(format!("block matrix rows do not form a {k}x{k} square")));
    }
    Ok(rows.into_iter().flatten().collect())
}
