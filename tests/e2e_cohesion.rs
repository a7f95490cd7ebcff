//! End-to-end tests for the cohesion engine.
//!
//! Each test goes through the public API only: raw matrix -> clean ->
//! E-I index / permutation test / extremal bounds.

use netcohesion::cohesion::{generate_permutation, rescaled_ei_report};
use netcohesion::transform::{make_binary, symmetrize_max};
use netcohesion::{
    calc_ei, clean_matrix, ei_test, max_ei, min_ei, rescaled_ei, AttributeColumn, EiTestOptions,
    Error, Matrix,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn ties(n: usize, pairs: &[(usize, usize)]) -> Matrix {
    let mut rows = vec![vec![0.0; n]; n];
    for &(i, j) in pairs {
        rows[i][j] = 1.0;
        rows[j][i] = 1.0;
    }
    Matrix::from_unlabeled_rows(rows).unwrap()
}

// ============================================================================
// 1. Chain with two groups: I = 2, E = 1
// ============================================================================

#[test]
fn test_chain_two_groups() {
    let m = ties(4, &[(0, 1), (1, 2), (2, 3)]);
    let attrs = AttributeColumn::new("group", ["A", "A", "B", "B"]);
    let ei = calc_ei(&clean_matrix(&m), &attrs).unwrap();
    assert!((ei - (-1.0 / 3.0)).abs() < 1e-12);
}

// ============================================================================
// 2. No ties: E-I is 0, the test is degenerate
// ============================================================================

#[test]
fn test_empty_network() {
    let m = Matrix::zeros(vec!["x".into(), "y".into(), "z".into()]).unwrap();
    let attrs = AttributeColumn::new("g", ["a", "b", "a"]);
    assert_eq!(calc_ei(&clean_matrix(&m), &attrs).unwrap(), 0.0);

    let result = ei_test(&m, &attrs, &EiTestOptions { seed: Some(1), ..Default::default() }).unwrap();
    assert!(result.degenerate);
    assert_eq!(result.observed, 0.0);
    assert_eq!(result.null_mean, 0.0);
    assert_eq!(result.tie_count, 0);
    assert!((result.p_value - 1.0).abs() < 1e-6);
    assert!(result.confidence_interval[1] - result.confidence_interval[0] < 1e-9);

    let strict = EiTestOptions { seed: Some(1), strict_degeneracy: true, ..Default::default() };
    assert!(matches!(ei_test(&m, &attrs, &strict), Err(Error::DegenerateDistribution { .. })));
}

// ============================================================================
// 3. Seeded test reproduces bit-for-bit
// ============================================================================

#[test]
fn test_seeded_triple_is_reproducible() {
    let m = ties(6, &[(0, 1), (1, 2), (3, 4), (4, 5)]);
    let attrs = AttributeColumn::new("team", [1i64, 1, 1, 2, 2, 2]);
    let options = EiTestOptions { num_permutations: 200, seed: Some(2024), ..Default::default() };

    let a = ei_test(&m, &attrs, &options).unwrap();
    let b = ei_test(&m, &attrs, &options).unwrap();
    assert_eq!(a.observed.to_bits(), b.observed.to_bits());
    assert_eq!(a.p_value.to_bits(), b.p_value.to_bits());
    assert_eq!(a.confidence_interval[0].to_bits(), b.confidence_interval[0].to_bits());
    assert_eq!(a.confidence_interval[1].to_bits(), b.confidence_interval[1].to_bits());

    // every tie is internal
    assert_eq!(a.observed, -1.0);
    assert_eq!(a.tie_count, 4);
    assert_eq!(a.num_permutations, 200);
    assert!(a.null_mean > -1.0);
    assert!(a.confidence_interval[0] <= a.null_mean && a.null_mean <= a.confidence_interval[1]);
}

// ============================================================================
// 4. Directed and valued ties collapse before counting
// ============================================================================

#[test]
fn test_directed_valued_input_is_cleaned() {
    let m = Matrix::from_unlabeled_rows(vec![
        vec![0.0, 4.5, 0.0],
        vec![0.0, 0.0, f64::NAN],
        vec![0.0, 0.2, 0.0],
    ])
    .unwrap();
    let cleaned = clean_matrix(&m);
    assert_eq!(cleaned.tie_count(), 2);
    let attrs = AttributeColumn::new("g", ["a", "a", "b"]);
    assert_eq!(calc_ei(&cleaned, &attrs).unwrap(), 0.0);
}

#[test]
fn test_extremal_and_rescaled() {
    let m = ties(4, &[(0, 1), (2, 3)]);
    let attrs = AttributeColumn::new("g", ["a", "a", "b", "b"]);
    let cleaned = clean_matrix(&m);
    assert_eq!(min_ei(&cleaned, 2, &attrs).unwrap(), -1.0);
    assert_eq!(max_ei(&cleaned, 2, &attrs).unwrap(), 1.0);
    assert_eq!(rescaled_ei(&m, &attrs).unwrap(), -1.0);

    // one group only: min == max, result collapses to min
    let flat = AttributeColumn::new("g", ["a", "a", "a", "a"]);
    let report = rescaled_ei_report(&m, &flat).unwrap();
    assert!(report.degenerate);
    assert_eq!(report.rescaled, report.min);
}

#[test]
fn test_misaligned_attributes_rejected() {
    let m = ties(3, &[(0, 1)]);
    let attrs = AttributeColumn::new("g", ["a", "b"]);
    assert!(matches!(calc_ei(&clean_matrix(&m), &attrs), Err(Error::AlignmentError(_))));
    assert!(matches!(
        ei_test(&m, &attrs, &EiTestOptions::default()),
        Err(Error::AlignmentError(_))
    ));
}

// ============================================================================
// Properties
// ============================================================================

fn network() -> impl Strategy<Value = (Matrix, AttributeColumn)> {
    (2usize..9)
        .prop_flat_map(|n| (prop::collection::vec(0u8..3, n * n), prop::collection::vec(0i64..3, n)))
        .prop_map(|(cells, groups)| {
            let n = groups.len();
            let rows = cells
                .chunks(n)
                .map(|r| r.iter().map(|&v| f64::from(v)).collect())
                .collect();
            (Matrix::from_unlabeled_rows(rows).unwrap(), AttributeColumn::new("g", groups))
        })
}

proptest! {
    #[test]
    fn prop_ei_in_range((m, attrs) in network()) {
        let cleaned = clean_matrix(&m);
        let ei = calc_ei(&cleaned, &attrs).unwrap();
        if cleaned.tie_count() == 0 {
            prop_assert_eq!(ei, 0.0);
        } else {
            prop_assert!((-1.0..=1.0).contains(&ei));
        }
    }

    #[test]
    fn prop_permutation_preserves_ties(n in 2usize..12, frac in 0.0f64..=1.0, seed: u64) {
        let capacity = n * (n - 1) / 2;
        let t = (frac * capacity as f64).floor() as usize;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let p = generate_permutation(n, t, &mut rng).unwrap();
        prop_assert_eq!(p.tie_count(), t);
        prop_assert_eq!(p.cell_sum(), 2 * t);
        let rows = p.to_rows();
        for i in 0..n {
            prop_assert_eq!(rows[i][i], 0);
            for j in 0..n {
                prop_assert_eq!(rows[i][j], rows[j][i]);
            }
        }
    }

    #[test]
    fn prop_extremal_bounds_any_assignment((m, attrs) in network(), seed: u64) {
        let cleaned = clean_matrix(&m);
        let t = cleaned.tie_count();
        let lo = min_ei(&cleaned, t, &attrs).unwrap();
        let hi = max_ei(&cleaned, t, &attrs).unwrap();
        let observed = calc_ei(&cleaned, &attrs).unwrap();
        prop_assert!(lo <= observed && observed <= hi);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let random = generate_permutation(m.len(), t, &mut rng).unwrap();
        let ei = calc_ei(&random, &attrs).unwrap();
        prop_assert!(lo <= ei && ei <= hi);
    }

    #[test]
    fn prop_rescaled_matches_observed((m, attrs) in network()) {
        let report = rescaled_ei_report(&m, &attrs).unwrap();
        if report.degenerate {
            prop_assert_eq!(report.rescaled, report.min);
        } else {
            prop_assert!((report.rescaled - report.observed).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_transforms_idempotent((m, _) in network()) {
        let b = make_binary(&m);
        prop_assert_eq!(make_binary(&b), b);
        let s = symmetrize_max(&m);
        prop_assert_eq!(symmetrize_max(&s), s);
    }
}
