//! Analysis configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blockmodel::{BlockmodelOptions, SelfDensityPolicy, SimilarityMeasure, DEFAULT_ALPHA, DEFAULT_BLOCKS};
use crate::cohesion::{EiTestOptions, DEFAULT_PERMUTATIONS};
use crate::model::Matrix;
use crate::{Error, Result};

// ============================================================================
// AnalysisConfig
// ============================================================================

/// Parameters for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Random relabelings drawn for the E-I null distribution.
    pub num_permutations: usize,
    /// Fixed seed for reproducible permutations; `None` draws from entropy.
    pub seed: Option<u64>,
    pub num_blocks: usize,
    /// Image-matrix density threshold.
    pub alpha: f64,
    pub self_density: SelfDensityPolicy,
    /// First block id.
    pub label_base: u32,
    /// `None` picks matches for binary matrices and Pearson otherwise.
    pub similarity: Option<SimilarityMeasure>,
    /// Fail on degenerate null distributions instead of substituting epsilon.
    pub strict_degeneracy: bool,
    /// CSV field delimiter.
    pub delimiter: char,
    /// Treat the relational matrix as directed when building the graph.
    pub directed: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            num_permutations: DEFAULT_PERMUTATIONS,
            seed: None,
            num_blocks: DEFAULT_BLOCKS,
            alpha: DEFAULT_ALPHA,
            self_density: SelfDensityPolicy::default(),
            label_base: 1,
            similarity: None,
            strict_degeneracy: false,
            delimiter: ',',
            directed: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn ei_options(&self) -> EiTestOptions {
        EiTestOptions {
            num_permutations: self.num_permutations,
            seed: self.seed,
            strict_degeneracy: self.strict_degeneracy,
        }
    }

    pub fn blockmodel_options(&self) -> BlockmodelOptions {
        BlockmodelOptions {
            num_blocks: self.num_blocks,
            alpha: self.alpha,
            self_density: self.self_density,
            label_base: self.label_base,
        }
    }

    /// Configured similarity measure, or the one suited to `matrix`.
    pub fn similarity_for(&self, matrix: &Matrix) -> SimilarityMeasure {
        self.similarity.unwrap_or_else(|| SimilarityMeasure::for_matrix(matrix))
    }

    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::Parse {
                file: None,
                message: format!("delimiter {:?} is not a single ASCII character", self.delimiter),
            })
    }
}
