//! Extremal E-I under a fixed tie budget.
//!
//! Greedy two-pass fill over the upper triangle in row-major order: the
//! first pass only takes pairs of the preferred kind, the second pass takes
//! whatever empty pairs remain. Scan order is the only tie-break.

use tracing::warn;

use super::{calc_ei, check_alignment};
use crate::model::{AttributeColumn, CleanedMatrix};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preference {
    /// Pairs whose attribute values differ.
    Heterogeneous,
    /// Pairs whose attribute values match.
    Homogeneous,
}

/// Highest E-I reachable with `tie_count` ties: external pairs first.
pub fn max_ei(matrix: &CleanedMatrix, tie_count: usize, attrs: &AttributeColumn) -> Result<f64> {
    check_alignment(matrix.len(), attrs)?;
    let extreme = extremal_assignment(matrix.len(), tie_count, attrs, Preference::Heterogeneous);
    calc_ei(&extreme, attrs)
}

/// Lowest E-I reachable with `tie_count` ties: internal pairs first.
pub fn min_ei(matrix: &CleanedMatrix, tie_count: usize, attrs: &AttributeColumn) -> Result<f64> {
    check_alignment(matrix.len(), attrs)?;
    let extreme = extremal_assignment(matrix.len(), tie_count, attrs, Preference::Homogeneous);
    calc_ei(&extreme, attrs)
}

fn extremal_assignment(
    n: usize,
    tie_count: usize,
    attrs: &AttributeColumn,
    preference: Preference,
) -> CleanedMatrix {
    let mut extreme = CleanedMatrix::empty(n);
    let capacity = extreme.pair_capacity();
    let mut budget = tie_count;
    if budget > capacity {
        warn!(tie_count, capacity, "tie budget exceeds available pairs, clamping");
        budget = capacity;
    }

    for i in 0..n {
        for j in i + 1..n {
            if budget == 0 {
                return extreme;
            }
            let preferred = match preference {
                Preference::Heterogeneous => !attrs.same(i, j),
                Preference::Homogeneous => attrs.same(i, j),
            };
            if preferred {
                extreme.set_tie(i, j);
                budget -= 1;
            }
        }
    }

    for i in 0..n {
        for j in i + 1..n {
            if budget == 0 {
                return extreme;
            }
            if !extreme.has_tie(i, j) {
                extreme.set_tie(i, j);
                budget -= 1;
            }
        }
    }

    extreme
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> AttributeColumn {
        AttributeColumn::new("group", ["A", "A", "B", "B"])
    }

    #[test]
    fn test_max_fills_external_first() {
        let m = CleanedMatrix::empty(4);
        // 4 external pairs exist: (0,2) (0,3) (1,2) (1,3)
        assert_eq!(max_ei(&m, 4, &attrs()).unwrap(), 1.0);
        // 5th tie must be internal: (4 - 1) / 5
        assert!((max_ei(&m, 5, &attrs()).unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_min_fills_internal_first() {
        let m = CleanedMatrix::empty(4);
        assert_eq!(min_ei(&m, 2, &attrs()).unwrap(), -1.0);
        // 3rd tie spills into the first external pair in scan order
        assert!((min_ei(&m, 3, &attrs()).unwrap() - (-1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_full_budget_is_same_for_both() {
        let m = CleanedMatrix::empty(4);
        let hi = max_ei(&m, 6, &attrs()).unwrap();
        let lo = min_ei(&m, 6, &attrs()).unwrap();
        assert_eq!(hi, lo);
    }

    #[test]
    fn test_oversized_budget_is_clamped() {
        let m = CleanedMatrix::empty(4);
        assert_eq!(max_ei(&m, 100, &attrs()).unwrap(), max_ei(&m, 6, &attrs()).unwrap());
    }

    #[test]
    fn test_zero_budget() {
        let m = CleanedMatrix::empty(4);
        assert_eq!(max_ei(&m, 0, &attrs()).unwrap(), 0.0);
        assert_eq!(min_ei(&m, 0, &attrs()).unwrap(), 0.0);
    }
}
