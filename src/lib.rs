//! # netcohesion — Homophily and Blockmodeling for Social Networks
//!
//! E-I index statistics and structural-equivalence blockmodels over binary
//! or valued adjacency matrices with per-node attributes.
//!
//! ## Design Principles
//!
//! 1. **Pure engines**: transform, cohesion and blockmodel functions take
//!    values and return fresh values; nothing is shared or cached
//! 2. **Checked DTOs**: `Matrix`, `AttributeTable`, `BlockLabeling` validate
//!    shape and alignment when built
//! 3. **Explicit randomness**: permutations draw from a caller-supplied or
//!    seeded RNG
//! 4. **I/O at the edge**: CSV parsing lives in `io`, never in the engines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netcohesion::{analyze, io, AnalysisConfig};
//! use std::path::Path;
//!
//! # fn example() -> netcohesion::Result<()> {
//! let config = AnalysisConfig { seed: Some(42), ..Default::default() };
//! let loaded = io::read_input("data/matrix.csv", Some(Path::new("data/attributes.csv")), &config)?;
//! let report = analyze(&loaded.into_analysis_input()?, &config)?;
//!
//! for c in &report.cohesion {
//!     println!("{}: E-I {:.3} (p = {:.3})", c.attribute, c.test.observed, c.test.p_value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `model` | Matrices, attributes, block labelings, analysis input |
//! | `transform` | Symmetrize, binarize, clean |
//! | `cohesion` | E-I index, permutation test, extremal and rescaled E-I |
//! | `blockmodel` | Similarity, complete-linkage clustering, block matrices |
//! | `graph` | Attributed graph, centralities, density |
//! | `io` | CSV matrices, attribute tables, edge lists, in-place transforms |
//! | `config` | `AnalysisConfig` (JSON) |
//! | `analysis` | `analyze` over an `AnalysisInput` |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod transform;
pub mod cohesion;
pub mod blockmodel;
pub mod graph;
pub mod io;
pub mod config;
pub mod analysis;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    AnalysisInput, AttributeColumn, AttributeTable, AttributeValue,
    BlockLabeling, CleanedMatrix, ImageMatrix, Matrix, NodeId, ReducedBlockMatrix,
};

// ============================================================================
// Re-exports: Engines
// ============================================================================

pub use transform::{clean_matrix, make_binary, symmetrize, SymmetrizeMethod};
pub use cohesion::{calc_ei, ei_test, max_ei, min_ei, rescaled_ei, EiTestOptions, EiTestResult};
pub use blockmodel::{
    binary_blockmodel, valued_blockmodel, BlockmodelOptions, BlockmodelResult,
    SelfDensityPolicy, SimilarityMeasure,
};
pub use graph::{network_calculations, node_calculation, SocialGraph};

// ============================================================================
// Re-exports: Entry point
// ============================================================================

pub use config::AnalysisConfig;
pub use analysis::{analyze, AnalysisReport, AttributeCohesion};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Alignment error: {0}")]
    AlignmentError(String),

    #[error("Degenerate distribution: {statistic} has zero spread")]
    DegenerateDistribution { statistic: String },

    #[error("Invalid block count: {requested} blocks requested for {nodes} nodes")]
    InvalidBlockCount { requested: usize, nodes: usize },

    #[error("Tie budget exceeded: {ties} ties but only {capacity} node pairs")]
    TieBudgetExceeded { ties: usize, capacity: usize },

    #[error("Parse error in {}: {message}", .file.as_deref().unwrap_or("<input>"))]
    Parse { file: Option<String>, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
