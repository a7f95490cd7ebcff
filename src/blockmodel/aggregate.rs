//! Block-level aggregation: ordering by block, reduced density matrices,
//! image matrices, and block membership.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AttributeTable, AttributeValue, BlockLabeling, ImageMatrix, Matrix, NodeId, ReducedBlockMatrix};
use crate::{Error, Result};

/// Default density threshold for image matrices.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// How a block's density with itself treats the diagonal (self-pairs).
///
/// The two blockmodeling revisions disagree here; this stays configurable
/// until the intended definition is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfDensityPolicy {
    /// Sum over all `|b|²` cells, diagonal included.
    IncludeSelfPairs,
    /// Sum over the `|b|(|b|-1)` off-diagonal cells. Singleton blocks are 0.
    #[default]
    ExcludeSelfPairs,
}

fn check_labels(matrix: &Matrix, labels: &BlockLabeling) -> Result<()> {
    if labels.nodes() != matrix.nodes() {
        return Err(Error::AlignmentError(
            "block labeling does not follow the matrix node order".into(),
        ));
    }
    Ok(())
}

/// Order nodes by block, then by the first attribute column ascending, then
/// by node id. Returns the reordered matrix and the applied ordering.
pub fn organize_blocks(
    matrix: &Matrix,
    labels: &BlockLabeling,
    attributes: Option<&AttributeTable>,
) -> Result<(Matrix, Vec<usize>)> {
    check_labels(matrix, labels)?;

    let first = attributes.and_then(|t| t.first_column().map(|c| (t, c)));
    let key = |i: usize| -> (u32, AttributeValue, &NodeId) {
        let id = &matrix.nodes()[i];
        let attr = first
            .and_then(|(t, c)| t.value(id, c).cloned())
            .unwrap_or(AttributeValue::Missing);
        (labels.labels()[i], attr, id)
    };

    let mut order: Vec<usize> = (0..matrix.len()).collect();
    order.sort_by_cached_key(|&i| key(i));
    let organized = matrix.reorder(&order)?;
    Ok((organized, order))
}

/// Density of ties between every pair of blocks.
///
/// Entry `(b1, b2)` is the sum of matrix cells with row in `b1` and column in
/// `b2`, divided by the number of such cells. Blocks appear in ascending id
/// order. Self-block cells follow `policy`.
pub fn reduced_block_matrix(
    matrix: &Matrix,
    labels: &BlockLabeling,
    policy: SelfDensityPolicy,
) -> Result<ReducedBlockMatrix> {
    if matrix.is_empty() {
        return Err(Error::EmptyInput("reduced block matrix of an empty matrix".into()));
    }
    check_labels(matrix, labels)?;

    let blocks = labels.distinct_blocks();
    let members: Vec<Vec<usize>> = blocks
        .iter()
        .map(|b| {
            labels
                .labels()
                .iter()
                .enumerate()
                .filter(|(_, l)| *l == b)
                .map(|(i, _)| i)
                .collect()
        })
        .collect();

    let k = blocks.len();
    let mut values = vec![0.0; k * k];
    for (bi, rows) in members.iter().enumerate() {
        for (bj, cols) in members.iter().enumerate() {
            let exclude_diagonal = bi == bj && policy == SelfDensityPolicy::ExcludeSelfPairs;
            let mut sum = 0.0;
            for &r in rows {
                for &c in cols {
                    if exclude_diagonal && r == c {
                        continue;
                    }
                    sum += matrix.get(r, c);
                }
            }
            let cells = if exclude_diagonal {
                rows.len() * (rows.len() - 1)
            } else {
                rows.len() * cols.len()
            };
            values[bi * k + bj] = if cells == 0 { 0.0 } else { sum / cells as f64 };
        }
    }

    Ok(ReducedBlockMatrix { blocks, values })
}

/// 1 where the block density is strictly above `alpha`, else 0.
pub fn image_matrix(reduced: &ReducedBlockMatrix, alpha: f64) -> ImageMatrix {
    ImageMatrix {
        blocks: reduced.blocks.clone(),
        values: reduced.values.iter().map(|&d| u8::from(d > alpha)).collect(),
    }
}

/// Nodes of each block, blocks ascending, nodes in matrix order.
pub fn block_dictionary(labels: &BlockLabeling) -> BTreeMap<u32, Vec<NodeId>> {
    let mut dict: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
    for (node, label) in labels.iter() {
        dict.entry(label).or_default().push(node.clone());
    }
    dict
}
