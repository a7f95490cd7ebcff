//! Analysis input: a relation alone, or a relation with node attributes.

use super::{AttributeTable, Matrix};
use crate::{Error, Result};

/// What the caller supplied. Engine entry points match on this instead of
/// branching on an optional attribute argument.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    RelationOnly(Matrix),
    RelationWithAttributes(Matrix, AttributeTable),
}

impl AnalysisInput {
    /// Pair a matrix with an attribute table, rejecting tables that share
    /// no node ids with the matrix.
    pub fn with_attributes(matrix: Matrix, attributes: AttributeTable) -> Result<Self> {
        if !attributes.overlaps(&matrix) {
            return Err(Error::AlignmentError(
                "attribute table shares no node ids with the relational matrix".into(),
            ));
        }
        Ok(AnalysisInput::RelationWithAttributes(matrix, attributes))
    }

    pub fn matrix(&self) -> &Matrix {
        match self {
            AnalysisInput::RelationOnly(m) | AnalysisInput::RelationWithAttributes(m, _) => m,
        }
    }

    pub fn attributes(&self) -> Option<&AttributeTable> {
        match self {
            AnalysisInput::RelationOnly(_) => None,
            AnalysisInput::RelationWithAttributes(_, t) => Some(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeValue;

    #[test]
    fn test_disjoint_tables_rejected() {
        let m = Matrix::zeros(vec!["a".into(), "b".into()]).unwrap();
        let mut t = AttributeTable::new(vec!["x".into()]);
        t.push_row("q", vec![AttributeValue::Int(1)]).unwrap();
        assert!(matches!(
            AnalysisInput::with_attributes(m.clone(), t).unwrap_err(),
            Error::AlignmentError(_)
        ));

        let mut t = AttributeTable::new(vec!["x".into()]);
        t.push_row("a", vec![AttributeValue::Int(1)]).unwrap();
        let input = AnalysisInput::with_attributes(m, t).unwrap();
        assert!(input.attributes().is_some());
        assert_eq!(input.matrix().len(), 2);
    }
}
