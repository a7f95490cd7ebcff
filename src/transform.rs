//! Matrix transforms: symmetrization and binarization.
//!
//! Every function takes a borrowed matrix and returns a new one. The
//! diagonal is never touched by symmetrization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CleanedMatrix, Matrix};
use crate::{Error, Result};

/// Rule for collapsing the two directed values of a node pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetrizeMethod {
    Minimum,
    Maximum,
    Average,
}

impl FromStr for SymmetrizeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minimum" | "min" => Ok(SymmetrizeMethod::Minimum),
            "maximum" | "max" => Ok(SymmetrizeMethod::Maximum),
            "average" | "avg" => Ok(SymmetrizeMethod::Average),
            other => Err(Error::Parse {
                file: None,
                message: format!(
                    "invalid symmetrize method '{other}', choose 'minimum', 'maximum', or 'average'"
                ),
            }),
        }
    }
}

/// Symmetrize with the given rule.
pub fn symmetrize(matrix: &Matrix, method: SymmetrizeMethod) -> Matrix {
    match method {
        SymmetrizeMethod::Minimum => symmetrize_min(matrix),
        SymmetrizeMethod::Maximum => symmetrize_max(matrix),
        SymmetrizeMethod::Average => symmetrize_average(matrix),
    }
}

/// Both cells of each pair take the smaller value.
pub fn symmetrize_min(matrix: &Matrix) -> Matrix {
    symmetrize_with(matrix, f64::min)
}

/// Both cells of each pair take the larger value.
pub fn symmetrize_max(matrix: &Matrix) -> Matrix {
    symmetrize_with(matrix, f64::max)
}

/// Both cells of each pair take the mean of the two values.
pub fn symmetrize_average(matrix: &Matrix) -> Matrix {
    symmetrize_with(matrix, |a, b| (a + b) / 2.0)
}

fn symmetrize_with(matrix: &Matrix, rule: impl Fn(f64, f64) -> f64) -> Matrix {
    let mut out = matrix.clone();
    let n = matrix.len();
    for i in 0..n {
        for j in i + 1..n {
            let v = rule(matrix.get(i, j), matrix.get(j, i));
            out.set(i, j, v);
            out.set(j, i, v);
        }
    }
    out
}

/// Any entry `> 0` becomes 1, everything else 0. Applies to the diagonal too.
pub fn make_binary(matrix: &Matrix) -> Matrix {
    matrix.map_values(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

/// Prepare a relation for cohesion analysis: NaN cells become 0, tie
/// direction is dropped (maximum rule), tie weight is dropped (binarize).
pub fn clean_matrix(matrix: &Matrix) -> CleanedMatrix {
    let no_nan = matrix.map_values(|v| if v.is_nan() { 0.0 } else { v });
    let binary = make_binary(&symmetrize_max(&no_nan));
    let cells = binary.values().iter().map(|&v| v as u8).collect();
    let cleaned = CleanedMatrix::from_cells(matrix.len(), cells);
    debug!(nodes = cleaned.len(), ties = cleaned.tie_count(), "cleaned relational matrix");
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directed() -> Matrix {
        Matrix::from_unlabeled_rows(vec![
            vec![0.0, 3.0, 0.0],
            vec![1.0, 0.0, 2.0],
            vec![0.0, 0.0, 5.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_symmetrize_rules() {
        let m = directed();
        assert_eq!(symmetrize_min(&m).to_rows()[0], vec![0.0, 1.0, 0.0]);
        assert_eq!(symmetrize_max(&m).to_rows()[0], vec![0.0, 3.0, 0.0]);
        assert_eq!(symmetrize_average(&m).to_rows()[0], vec![0.0, 2.0, 0.0]);
        assert_eq!(symmetrize_max(&m).get(2, 1), 2.0);
        assert_eq!(symmetrize_min(&m).get(2, 1), 0.0);
    }

    #[test]
    fn test_symmetrize_leaves_diagonal() {
        let m = directed();
        for method in [SymmetrizeMethod::Minimum, SymmetrizeMethod::Maximum, SymmetrizeMethod::Average] {
            let s = symmetrize(&m, method);
            assert_eq!(s.get(2, 2), 5.0);
            assert!(s.is_symmetric());
        }
    }

    #[test]
    fn test_make_binary() {
        let m = Matrix::from_unlabeled_rows(vec![vec![0.0, -1.0], vec![0.25, 7.0]]).unwrap();
        assert_eq!(make_binary(&m).to_rows(), vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("Maximum".parse::<SymmetrizeMethod>().unwrap(), SymmetrizeMethod::Maximum);
        assert_eq!("average".parse::<SymmetrizeMethod>().unwrap(), SymmetrizeMethod::Average);
        assert!("median".parse::<SymmetrizeMethod>().is_err());
    }

    #[test]
    fn test_clean_matrix_handles_nan_and_direction() {
        let m = Matrix::from_unlabeled_rows(vec![
            vec![0.0, f64::NAN, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![4.0, 0.0, 0.0],
        ])
        .unwrap();
        let c = clean_matrix(&m);
        assert_eq!(c.tie_count(), 1);
        assert!(c.has_tie(0, 2));
        assert!(!c.has_tie(0, 1));
    }
}
