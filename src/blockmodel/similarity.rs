//! Structural-equivalence similarity between node profiles.
//!
//! Row `i` of the relational matrix is node `i`'s tie profile. Two nodes are
//! structurally similar when their profiles agree.

use tracing::warn;

use crate::model::Matrix;
use crate::{Error, Result};

/// Pearson correlation between every pair of rows. Suited to valued data.
///
/// The diagonal is 1.0. A row with zero variance has no defined correlation
/// with any other row, so those entries are `NaN`; they are kept as `NaN`
/// here and resolved by the clustering step.
pub fn pearson_similarity(matrix: &Matrix) -> Result<Matrix> {
    if matrix.is_empty() {
        return Err(Error::EmptyInput("Pearson similarity of an empty matrix".into()));
    }
    let n = matrix.len();

    let centered: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let row = matrix.row(i);
            let mean = row.iter().sum::<f64>() / n as f64;
            row.iter().map(|v| v - mean).collect()
        })
        .collect();
    let norms: Vec<f64> = centered
        .iter()
        .map(|r| r.iter().map(|v| v * v).sum::<f64>().sqrt())
        .collect();

    let constant_rows = norms.iter().filter(|&&s| s == 0.0).count();
    if constant_rows > 0 {
        warn!(constant_rows, "constant tie profiles have undefined Pearson correlation (NaN)");
    }

    let mut values = vec![0.0; n * n];
    for i in 0..n {
        values[i * n + i] = 1.0;
        for j in i + 1..n {
            let r = if norms[i] == 0.0 || norms[j] == 0.0 {
                f64::NAN
            } else {
                let dot: f64 = centered[i].iter().zip(&centered[j]).map(|(a, b)| a * b).sum();
                (dot / (norms[i] * norms[j])).clamp(-1.0, 1.0)
            };
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }
    Matrix::new(matrix.nodes().to_vec(), values)
}

/// Share of columns where two rows hold the same value. Suited to binary data.
pub fn match_similarity(matrix: &Matrix) -> Result<Matrix> {
    if matrix.is_empty() {
        return Err(Error::EmptyInput("match similarity of an empty matrix".into()));
    }
    let n = matrix.len();
    let mut values = vec![0.0; n * n];
    for i in 0..n {
        for j in i..n {
            let matches = matrix.row(i).iter().zip(matrix.row(j)).filter(|(a, b)| a == b).count();
            let s = matches as f64 / n as f64;
            values[i * n + j] = s;
            values[j * n + i] = s;
        }
    }
    Matrix::new(matrix.nodes().to_vec(), values)
}
