//! # Cohesion / Homophily Engine
//!
//! The E-I index compares ties that cross attribute boundaries (external)
//! with ties inside them (internal):
//!
//! ```text
//! EI = (E - I) / (E + I)      -1 = fully homophilous, +1 = fully heterophilous
//! ```
//!
//! Significance is assessed against a null distribution of permuted networks
//! with the same number of ties (see [`permutation`]). The test is a
//! normal-approximation z-test on the permutation sample, not an exact rank
//! p-value:
//!
//! ```text
//! z  = (observed - mean(null)) / sd(null)          sd = population sd
//! p  = 2 * (1 - Φ(|z|))
//! CI = mean(null) ± 1.96 * sd(null)
//! ```
//!
//! All functions are stateless; the only randomness is the caller's RNG.

pub mod normal;
pub mod permutation;
pub mod extremal;

pub use extremal::{max_ei, min_ei};
pub use normal::{normal_cdf, two_tailed_p};
pub use permutation::generate_permutation;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{AttributeColumn, CleanedMatrix, Matrix};
use crate::transform::clean_matrix;
use crate::{Error, Result};

/// Permutations drawn by default for the E-I test.
pub const DEFAULT_PERMUTATIONS: usize = 50;

/// Stand-in divisor for zero spreads (null standard deviation, max - min).
pub const EPSILON: f64 = 1e-10;

/// z-multiplier of the 95% confidence interval.
const Z_95: f64 = 1.96;

// ============================================================================
// E-I index
// ============================================================================

/// Observed E-I index of a cleaned network.
///
/// Only pairs `i < j` are inspected, so the diagonal never counts. A network
/// without ties has an E-I index of exactly 0.
pub fn calc_ei(matrix: &CleanedMatrix, attrs: &AttributeColumn) -> Result<f64> {
    if matrix.is_empty() {
        return Err(Error::EmptyInput("E-I index of a network with no nodes".into()));
    }
    check_alignment(matrix.len(), attrs)?;

    let n = matrix.len();
    let (mut internal, mut external) = (0usize, 0usize);
    for i in 0..n {
        for j in i + 1..n {
            if matrix.has_tie(i, j) {
                if attrs.same(i, j) {
                    internal += 1;
                } else {
                    external += 1;
                }
            }
        }
    }

    if internal + external == 0 {
        return Ok(0.0);
    }
    Ok((external as f64 - internal as f64) / (external + internal) as f64)
}

pub(crate) fn check_alignment(nodes: usize, attrs: &AttributeColumn) -> Result<()> {
    if attrs.len() != nodes {
        return Err(Error::AlignmentError(format!(
            "attribute column '{}' has {} values for {} nodes",
            attrs.name,
            attrs.len(),
            nodes
        )));
    }
    Ok(())
}

// ============================================================================
// Permutation test
// ============================================================================

/// Options for [`ei_test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EiTestOptions {
    pub num_permutations: usize,
    /// Seed for a `ChaCha8Rng`; `None` draws from the thread RNG.
    pub seed: Option<u64>,
    /// Fail with `DegenerateDistribution` instead of substituting `EPSILON`.
    pub strict_degeneracy: bool,
}

impl Default for EiTestOptions {
    fn default() -> Self {
        Self { num_permutations: DEFAULT_PERMUTATIONS, seed: None, strict_degeneracy: false }
    }
}

/// Outcome of the E-I permutation test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EiTestResult {
    pub observed: f64,
    pub p_value: f64,
    pub confidence_interval: [f64; 2],
    pub z_score: f64,
    pub null_mean: f64,
    /// Population standard deviation actually used (`EPSILON` if degenerate).
    pub null_std_dev: f64,
    pub tie_count: usize,
    pub num_permutations: usize,
    /// The null distribution had zero variance.
    pub degenerate: bool,
}

/// E-I permutation test with the RNG chosen by `options.seed`.
///
/// Seeded runs create one `ChaCha8Rng::seed_from_u64(seed)` and draw every
/// permutation from it in sequence, so the triple is reproducible.
pub fn ei_test(matrix: &Matrix, attrs: &AttributeColumn, options: &EiTestOptions) -> Result<EiTestResult> {
    match options.seed {
        Some(seed) => ei_test_with_rng(matrix, attrs, options, &mut ChaCha8Rng::seed_from_u64(seed)),
        None => ei_test_with_rng(matrix, attrs, options, &mut rand::thread_rng()),
    }
}

/// E-I permutation test drawing from a caller-supplied RNG.
pub fn ei_test_with_rng<R: Rng + ?Sized>(
    matrix: &Matrix,
    attrs: &AttributeColumn,
    options: &EiTestOptions,
    rng: &mut R,
) -> Result<EiTestResult> {
    if matrix.is_empty() {
        return Err(Error::EmptyInput("E-I test on a network with no nodes".into()));
    }
    check_alignment(matrix.len(), attrs)?;
    if options.num_permutations == 0 {
        return Err(Error::EmptyInput("E-I test needs at least one permutation".into()));
    }

    let cleaned = clean_matrix(matrix);
    let observed = calc_ei(&cleaned, attrs)?;
    let tie_count = cleaned.tie_count();
    if tie_count == 0 {
        warn!(attribute = %attrs.name, "network has no ties, E-I index is 0 by definition");
    }

    let null = (0..options.num_permutations)
        .map(|_| generate_permutation(cleaned.len(), tie_count, rng).and_then(|p| calc_ei(&p, attrs)))
        .collect::<Result<Vec<f64>>>()?;

    let count = null.len() as f64;
    let null_mean = null.iter().sum::<f64>() / count;
    let variance = null.iter().map(|v| (v - null_mean).powi(2)).sum::<f64>() / count;
    let mut null_std_dev = variance.sqrt();

    let degenerate = null_std_dev == 0.0;
    if degenerate {
        if options.strict_degeneracy {
            return Err(Error::DegenerateDistribution {
                statistic: format!("E-I null distribution for '{}'", attrs.name),
            });
        }
        warn!(
            attribute = %attrs.name,
            tie_count,
            "E-I null distribution has zero variance, substituting epsilon"
        );
        null_std_dev = EPSILON;
    }

    let z_score = (observed - null_mean) / null_std_dev;
    let p_value = two_tailed_p(z_score);
    let confidence_interval = [null_mean - Z_95 * null_std_dev, null_mean + Z_95 * null_std_dev];

    debug!(
        attribute = %attrs.name,
        observed,
        null_mean,
        null_std_dev,
        z_score,
        p_value,
        "E-I permutation test complete"
    );

    Ok(EiTestResult {
        observed,
        p_value,
        confidence_interval,
        z_score,
        null_mean,
        null_std_dev,
        tie_count,
        num_permutations: options.num_permutations,
        degenerate,
    })
}

// ============================================================================
// Rescaled E-I
// ============================================================================

/// Components of the rescaled E-I computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RescaledEi {
    pub observed: f64,
    pub min: f64,
    pub max: f64,
    pub rescaled: f64,
    /// `max == min`, so `EPSILON` was used as the divisor.
    pub degenerate: bool,
}

/// Rescaled E-I index.
///
/// Computes `(max - min) * (observed - min) / scale + min` with
/// `scale = max - min`, which is `observed` itself. When `max == min` the
/// divisor becomes `EPSILON` and the result is exactly `min`.
pub fn rescaled_ei(matrix: &Matrix, attrs: &AttributeColumn) -> Result<f64> {
    rescaled_ei_report(matrix, attrs).map(|r| r.rescaled)
}

/// [`rescaled_ei`] with its intermediate values.
pub fn rescaled_ei_report(matrix: &Matrix, attrs: &AttributeColumn) -> Result<RescaledEi> {
    if matrix.is_empty() {
        return Err(Error::EmptyInput("rescaled E-I of a network with no nodes".into()));
    }
    check_alignment(matrix.len(), attrs)?;

    let cleaned = clean_matrix(matrix);
    let observed = calc_ei(&cleaned, attrs)?;
    let tie_count = cleaned.tie_count();

    let min = min_ei(&cleaned, tie_count, attrs)?;
    let max = max_ei(&cleaned, tie_count, attrs)?;

    let spread = max - min;
    let degenerate = spread == 0.0;
    let scale = if degenerate {
        warn!(attribute = %attrs.name, min, max, "E-I range is zero, substituting epsilon");
        EPSILON
    } else {
        spread
    };

    let rescaled = spread * (observed - min) / scale + min;
    Ok(RescaledEi { observed, min, max, rescaled, degenerate })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeValue;

    fn chain() -> Matrix {
        Matrix::from_unlabeled_rows(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![1.0, 0.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ])
        .unwrap()
    }

    fn groups() -> AttributeColumn {
        AttributeColumn::new("group", ["A", "A", "B", "B"])
    }

    #[test]
    fn test_calc_ei_chain() {
        let ei = calc_ei(&clean_matrix(&chain()), &groups()).unwrap();
        assert!((ei - (-1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_calc_ei_no_ties_is_zero() {
        let m = CleanedMatrix::empty(3);
        let attrs = AttributeColumn::new("g", [1i64, 2, 1]);
        assert_eq!(calc_ei(&m, &attrs).unwrap(), 0.0);
    }

    #[test]
    fn test_calc_ei_ignores_diagonal() {
        let m = Matrix::from_unlabeled_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let attrs = AttributeColumn::new("g", ["x", "x"]);
        assert_eq!(calc_ei(&clean_matrix(&m), &attrs).unwrap(), 0.0);
    }

    #[test]
    fn test_calc_ei_undefined_values_never_match() {
        let m = Matrix::from_unlabeled_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let cleaned = clean_matrix(&m);

        let blanks = AttributeColumn::new("g", [AttributeValue::Missing, AttributeValue::Missing]);
        assert_eq!(calc_ei(&cleaned, &blanks).unwrap(), 1.0);

        let nans = AttributeColumn::new("g", [AttributeValue::parse("nan"), AttributeValue::parse("NaN")]);
        assert_eq!(calc_ei(&cleaned, &nans).unwrap(), 1.0);

        let one_blank = AttributeColumn::new("g", [AttributeValue::from("x"), AttributeValue::Missing]);
        assert_eq!(calc_ei(&cleaned, &one_blank).unwrap(), 1.0);

        let defined = AttributeColumn::new("g", [AttributeValue::Int(2), AttributeValue::Float(2.0)]);
        assert_eq!(calc_ei(&cleaned, &defined).unwrap(), -1.0);
    }

    #[test]
    fn test_calc_ei_errors() {
        let attrs = AttributeColumn::new("g", ["x"]);
        assert!(matches!(calc_ei(&CleanedMatrix::empty(0), &attrs), Err(Error::EmptyInput(_))));
        assert!(matches!(calc_ei(&CleanedMatrix::empty(2), &attrs), Err(Error::AlignmentError(_))));
    }

    #[test]
    fn test_ei_test_seeded_is_reproducible() {
        let opts = EiTestOptions { seed: Some(42), ..Default::default() };
        let a = ei_test(&chain(), &groups(), &opts).unwrap();
        let b = ei_test(&chain(), &groups(), &opts).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tie_count, 3);
        assert_eq!(a.num_permutations, DEFAULT_PERMUTATIONS);
        assert!((0.0..=1.0).contains(&a.p_value));
        assert!(a.confidence_interval[0] <= a.confidence_interval[1]);
    }

    #[test]
    fn test_ei_test_full_network_is_degenerate() {
        // Complete graph: every permutation is the same network.
        let m = Matrix::from_unlabeled_rows(vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();
        let attrs = AttributeColumn::new("g", ["a", "b", "c"]);
        let opts = EiTestOptions { seed: Some(1), num_permutations: 10, ..Default::default() };
        let r = ei_test(&m, &attrs, &opts).unwrap();
        assert!(r.degenerate);
        assert_eq!(r.null_std_dev, EPSILON);
        assert_eq!(r.observed, 1.0);
        assert_eq!(r.null_mean, 1.0);
        assert_eq!(r.z_score, 0.0);
        assert!((r.p_value - 1.0).abs() < 1e-6);

        let strict = EiTestOptions { strict_degeneracy: true, ..opts };
        assert!(matches!(
            ei_test(&m, &attrs, &strict),
            Err(Error::DegenerateDistribution { .. })
        ));
    }

    #[test]
    fn test_ei_test_zero_permutations_rejected() {
        let opts = EiTestOptions { num_permutations: 0, ..Default::default() };
        assert!(matches!(ei_test(&chain(), &groups(), &opts), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn test_rescaled_equals_observed() {
        let report = rescaled_ei_report(&chain(), &groups()).unwrap();
        assert!(!report.degenerate);
        assert!((report.rescaled - report.observed).abs() < 1e-12);
        assert!(report.min <= report.observed && report.observed <= report.max);
    }

    #[test]
    fn test_rescaled_degenerate_returns_min() {
        let m = Matrix::from_unlabeled_rows(vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();
        let attrs = AttributeColumn::new("g", ["a", "a", "b"]);
        let report = rescaled_ei_report(&m, &attrs).unwrap();
        assert!(report.degenerate);
        assert_eq!(report.rescaled, report.min);
        assert_eq!(rescaled_ei(&m, &attrs).unwrap(), report.min);
    }
}
