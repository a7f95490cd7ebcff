//! # Network Data Model
//!
//! Value types that every engine consumes and produces: relational
//! matrices, node attributes, block labelings, and the tagged analysis input.
//!
//! Design rule: pure data. Shape and alignment invariants are checked when a
//! value is constructed, so engines can index without re-validating.

pub mod node;
pub mod matrix;
pub mod attribute;
pub mod block;
pub mod input;

pub use node::NodeId;
pub use matrix::{Matrix, CleanedMatrix, pair_capacity};
pub use attribute::{AttributeValue, AttributeColumn, AttributeTable, BLOCK_COLUMN};
pub use block::{BlockLabeling, ReducedBlockMatrix, ImageMatrix};
pub use input::AnalysisInput;
