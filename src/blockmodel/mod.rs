//! # Structural-Equivalence Blockmodeling
//!
//! ```text
//! relational matrix
//!   → similarity (matches for binary data, Pearson for valued data)
//!   → complete-linkage clustering into k blocks
//!   → attach "Block" to the attribute table
//!   → reorder by (block, first attribute)
//!   → reduced block-density matrix
//!   → image matrix (density > alpha)
//! ```

pub mod similarity;
pub mod cluster;
pub mod aggregate;

pub use aggregate::{
    block_dictionary, image_matrix, organize_blocks, reduced_block_matrix,
    SelfDensityPolicy, DEFAULT_ALPHA,
};
pub use cluster::cluster_blocks;
pub use similarity::{match_similarity, pearson_similarity};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{AttributeTable, BlockLabeling, ImageMatrix, Matrix, NodeId, ReducedBlockMatrix};
use crate::Result;

/// Default number of blocks.
pub const DEFAULT_BLOCKS: usize = 2;

/// Node similarity measure used for clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    /// Share of matching cells, for binary data.
    Matches,
    /// Pearson correlation, for valued data.
    Pearson,
}

impl SimilarityMeasure {
    /// Matches for 0/1 matrices, Pearson otherwise.
    pub fn for_matrix(matrix: &Matrix) -> Self {
        if matrix.is_binary() {
            SimilarityMeasure::Matches
        } else {
            SimilarityMeasure::Pearson
        }
    }

    pub fn compute(self, matrix: &Matrix) -> Result<Matrix> {
        match self {
            SimilarityMeasure::Matches => match_similarity(matrix),
            SimilarityMeasure::Pearson => pearson_similarity(matrix),
        }
    }
}

/// Parameters shared by both blockmodel pipelines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockmodelOptions {
    pub num_blocks: usize,
    pub alpha: f64,
    pub self_density: SelfDensityPolicy,
    /// First block id (1 by convention).
    pub label_base: u32,
}

impl Default for BlockmodelOptions {
    fn default() -> Self {
        Self {
            num_blocks: DEFAULT_BLOCKS,
            alpha: DEFAULT_ALPHA,
            self_density: SelfDensityPolicy::default(),
            label_base: 1,
        }
    }
}

/// Everything a blockmodel run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockmodelResult {
    pub measure: SimilarityMeasure,
    pub labels: BlockLabeling,
    /// Node order after sorting by block.
    pub order: Vec<NodeId>,
    pub organized: Matrix,
    pub reduced: ReducedBlockMatrix,
    pub image: ImageMatrix,
    /// Attribute table with the `Block` column attached.
    pub labeled_attributes: Option<AttributeTable>,
}

/// Blockmodel of binary data (match similarity).
pub fn binary_blockmodel(
    matrix: &Matrix,
    attributes: Option<&AttributeTable>,
    options: &BlockmodelOptions,
) -> Result<BlockmodelResult> {
    blockmodel(matrix, attributes, SimilarityMeasure::Matches, options)
}

/// Blockmodel of valued data (Pearson similarity).
pub fn valued_blockmodel(
    matrix: &Matrix,
    attributes: Option<&AttributeTable>,
    options: &BlockmodelOptions,
) -> Result<BlockmodelResult> {
    blockmodel(matrix, attributes, SimilarityMeasure::Pearson, options)
}

/// Full pipeline with an explicit similarity measure.
pub fn blockmodel(
    matrix: &Matrix,
    attributes: Option<&AttributeTable>,
    measure: SimilarityMeasure,
    options: &BlockmodelOptions,
) -> Result<BlockmodelResult> {
    let similarity = measure.compute(matrix)?;
    let labels = cluster_blocks(&similarity, options.num_blocks, options.label_base)?;
    let labeled_attributes = attributes.map(|t| t.with_block_labels(&labels));

    let (organized, order) = organize_blocks(matrix, &labels, attributes)?;
    let reduced = reduced_block_matrix(matrix, &labels, options.self_density)?;
    let image = image_matrix(&reduced, options.alpha);

    info!(
        nodes = matrix.len(),
        blocks = reduced.len(),
        ?measure,
        "blockmodel complete"
    );

    Ok(BlockmodelResult {
        measure,
        order: order.iter().map(|&i| matrix.nodes()[i].clone()).collect(),
        labels,
        organized,
        reduced,
        image,
        labeled_attributes,
    })
}
