//! One-call analysis of a loaded network.
//!
//! ```text
//! AnalysisInput::RelationOnly(m)
//!   → graph stats + centralities + blockmodel
//! AnalysisInput::RelationWithAttributes(m, t)
//!   → the above, blockmodel sorted by the first attribute
//!   → per attribute column: E-I permutation test + rescaled E-I,
//!     over the matrix nodes that have an attribute row
//! ```

use serde::Serialize;
use tracing::{info, warn};

use crate::blockmodel::{blockmodel, BlockmodelResult};
use crate::cohesion::{ei_test, rescaled_ei_report, EiTestResult, RescaledEi};
use crate::config::AnalysisConfig;
use crate::graph::{network_calculations, node_calculation, NetworkStats, NodeCentralities, SocialGraph};
use crate::model::{AnalysisInput, AttributeTable, Matrix};
use crate::{Error, Result};

/// Cohesion statistics for one attribute column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeCohesion {
    pub attribute: String,
    pub test: EiTestResult,
    pub rescaled: RescaledEi,
}

/// Everything computed for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub network: NetworkStats,
    pub centralities: NodeCentralities,
    pub blockmodel: BlockmodelResult,
    /// Empty for relation-only input.
    pub cohesion: Vec<AttributeCohesion>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn analyze(input: &AnalysisInput, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let report = match input {
        AnalysisInput::RelationOnly(matrix) => structural(matrix, None, config)?,
        AnalysisInput::RelationWithAttributes(matrix, table) => {
            let mut report = structural(matrix, Some(table), config)?;
            report.cohesion = cohesion(matrix, table, config)?;
            report
        }
    };
    info!(
        nodes = report.network.nodes,
        edges = report.network.edges,
        attributes = report.cohesion.len(),
        "analysis complete"
    );
    Ok(report)
}

fn structural(
    matrix: &Matrix,
    attributes: Option<&AttributeTable>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    let graph = SocialGraph::from_matrix(matrix, attributes, config.directed);
    let blockmodel = blockmodel(
        matrix,
        attributes,
        config.similarity_for(matrix),
        &config.blockmodel_options(),
    )?;
    Ok(AnalysisReport {
        network: network_calculations(&graph),
        centralities: node_calculation(&graph),
        blockmodel,
        cohesion: Vec::new(),
    })
}

fn cohesion(matrix: &Matrix, table: &AttributeTable, config: &AnalysisConfig) -> Result<Vec<AttributeCohesion>> {
    let matrix = attributed_nodes(matrix, table)?;
    let options = config.ei_options();
    table
        .columns()
        .iter()
        .map(|name| {
            let column = table.column(name, &matrix)?;
            let test = ei_test(&matrix, &column, &options)?;
            let rescaled = rescaled_ei_report(&matrix, &column)?;
            if rescaled.degenerate && config.strict_degeneracy {
                return Err(Error::DegenerateDistribution {
                    statistic: format!("rescaled E-I range for '{name}'"),
                });
            }
            Ok(AttributeCohesion { attribute: name.clone(), test, rescaled })
        })
        .collect()
}

/// The relation restricted to nodes with an attribute row, in matrix order.
fn attributed_nodes(matrix: &Matrix, table: &AttributeTable) -> Result<Matrix> {
    let keep: Vec<usize> = matrix
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, id)| table.record(id).is_some())
        .map(|(i, _)| i)
        .collect();
    if keep.len() == matrix.len() {
        return Ok(matrix.clone());
    }
    if keep.is_empty() {
        return Err(Error::AlignmentError(
            "attribute table shares no node ids with the relational matrix".into(),
        ));
    }
    warn!(
        dropped = matrix.len() - keep.len(),
        kept = keep.len(),
        "nodes without an attribute row left out of cohesion statistics"
    );
    matrix.submatrix(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeValue;

    fn square() -> Matrix {
        // 4-cycle a-b-c-d-a
        Matrix::from_rows(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec![
                vec![0.0, 1.0, 0.0, 1.0],
                vec![1.0, 0.0, 1.0, 0.0],
                vec![0.0, 1.0, 0.0, 1.0],
                vec![1.0, 0.0, 1.0, 0.0],
            ],
        )
        .unwrap()
    }

    fn seeded() -> AnalysisConfig {
        AnalysisConfig { seed: Some(11), ..Default::default() }
    }

    #[test]
    fn test_relation_only() {
        let report = analyze(&AnalysisInput::RelationOnly(square()), &seeded()).unwrap();
        assert_eq!(report.network.edges, 4);
        assert!(report.cohesion.is_empty());
        assert!(report.blockmodel.labeled_attributes.is_none());
        assert_eq!(report.centralities.degree.len(), 4);
    }

    #[test]
    fn test_with_attributes_runs_every_column() {
        let mut t = AttributeTable::new(vec!["side".into(), "age".into()]);
        for (id, side, age) in [("a", "x", 20), ("b", "y", 30), ("c", "x", 20), ("d", "y", 30)] {
            t.push_row(id, vec![side.into(), AttributeValue::Int(age)]).unwrap();
        }
        let input = AnalysisInput::with_attributes(square(), t).unwrap();
        let report = analyze(&input, &seeded()).unwrap();
        assert_eq!(report.cohesion.len(), 2);
        // every tie crosses sides
        assert_eq!(report.cohesion[0].attribute, "side");
        assert_eq!(report.cohesion[0].test.observed, 1.0);
        assert_eq!(report.cohesion[0].test.tie_count, 4);
        assert!(report.to_json().unwrap().contains("\"cohesion\""));
    }

    #[test]
    fn test_subset_attributes_restrict_cohesion() {
        let mut t = AttributeTable::new(vec!["side".into()]);
        for (id, side) in [("a", "x"), ("b", "x"), ("c", "y"), ("zed", "y")] {
            t.push_row(id, vec![side.into()]).unwrap();
        }
        let input = AnalysisInput::with_attributes(square(), t).unwrap();
        let report = analyze(&input, &seeded()).unwrap();

        // structural results still cover every matrix node
        assert_eq!(report.network.nodes, 4);
        assert_eq!(report.blockmodel.labels.len(), 4);
        // cohesion sees a-b (internal) and b-c (external) only
        let side = &report.cohesion[0];
        assert_eq!(side.test.tie_count, 2);
        assert_eq!(side.test.observed, 0.0);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let mut t = AttributeTable::new(vec!["side".into()]);
        for (id, side) in [("a", "x"), ("b", "x"), ("c", "y"), ("d", "y")] {
            t.push_row(id, vec![side.into()]).unwrap();
        }
        let input = AnalysisInput::with_attributes(square(), t).unwrap();
        let first = analyze(&input, &seeded()).unwrap();
        let second = analyze(&input, &seeded()).unwrap();
        assert_eq!(first.cohesion, second.cohesion);
    }
}
