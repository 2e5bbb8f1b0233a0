//! Row-stochastic transition matrices over a labelled state set.

use crate::types::{LookupError, StateSet, ValidationError};

/// Default tolerance for the row-sum check.
pub const DEFAULT_ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Row-sum validation policy applied at construction.
///
/// Entries are always checked for sign and finiteness; only the
/// "each row sums to one" check is configurable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowSumCheck {
    /// Reject any row whose sum deviates from 1 by more than `tolerance`.
    Strict {
        /// Absolute tolerance on the row sum.
        tolerance: f64,
    },
    /// Accept rows with any sum.
    Skip,
}

impl Default for RowSumCheck {
    fn default() -> Self {
        RowSumCheck::Strict {
            tolerance: DEFAULT_ROW_SUM_TOLERANCE,
        }
    }
}

/// Validated transition matrix.
///
/// `rows[i][j]` is the probability of moving from state `i` to state `j`
/// in one step. Immutable after construction.
///
/// # Examples
///
/// ```
/// use churn_core::matrix::TransitionMatrix;
///
/// let m = TransitionMatrix::new(
///     vec![vec![0.8, 0.2], vec![0.0, 1.0]],
///     ["Active", "Churned"],
/// )
/// .unwrap();
///
/// assert_eq!(m.row("Active").unwrap(), &[0.8, 0.2]);
/// assert!(m.is_absorbing(1));
///
/// let next = m.apply(&[1000.0, 0.0]).unwrap();
/// assert!((next[0] - 800.0).abs() < 1e-9);
/// assert!((next[1] - 200.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    states: StateSet,
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Creates a matrix with strict row-sum validation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the labels are invalid, the matrix is not
    /// square over the labels, any entry is negative or non-finite, or any row
    /// sum deviates from 1 by more than [`DEFAULT_ROW_SUM_TOLERANCE`].
    pub fn new<I, S>(rows: Vec<Vec<f64>>, labels: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_validation(rows, labels, RowSumCheck::default())
    }

    /// Creates a matrix with an explicit row-sum policy.
    pub fn with_validation<I, S>(
        rows: Vec<Vec<f64>>,
        labels: I,
        check: RowSumCheck,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let states = StateSet::new(labels)?;
        Self::from_state_set(rows, states, check)
    }

    /// Creates a matrix over an existing state set.
    pub fn from_state_set(
        rows: Vec<Vec<f64>>,
        states: StateSet,
        check: RowSumCheck,
    ) -> Result<Self, ValidationError> {
        let n = states.len();
        if rows.len() != n {
            return Err(ValidationError::DimensionMismatch {
                what: "matrix rows",
                expected: n,
                got: rows.len(),
            });
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(ValidationError::RaggedMatrix {
                    row: i,
                    expected: n,
                    got: row.len(),
                });
            }
            for (j, &p) in row.iter().enumerate() {
                if !p.is_finite() {
                    return Err(ValidationError::NonFiniteEntry { row: i, col: j });
                }
                if p < 0.0 {
                    return Err(ValidationError::NegativeProbability {
                        row: i,
                        col: j,
                        value: p,
                    });
                }
            }
            if let RowSumCheck::Strict { tolerance } = check {
                let sum: f64 = row.iter().sum();
                if (sum - 1.0).abs() > tolerance {
                    return Err(ValidationError::RowNotStochastic { row: i, sum });
                }
            }
        }

        Ok(Self { states, rows })
    }

    /// Probability-weighted sum of matrices over the same state set.
    ///
    /// The result is row-stochastic whenever the inputs are and the weights
    /// sum to one; it is validated strictly.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `weights` and `matrices` differ in length or
    /// are empty, `InvalidParameter` when the matrices disagree on states.
    pub fn mixture(
        weights: &[f64],
        matrices: &[&TransitionMatrix],
    ) -> Result<Self, ValidationError> {
        let first = matrices.first().ok_or(ValidationError::DimensionMismatch {
            what: "mixture components",
            expected: 1,
            got: 0,
        })?;
        if weights.len() != matrices.len() {
            return Err(ValidationError::DimensionMismatch {
                what: "mixture weights",
                expected: matrices.len(),
                got: weights.len(),
            });
        }

        let n = first.dim();
        let mut rows = vec![vec![0.0; n]; n];
        for (&w, m) in weights.iter().zip(matrices) {
            if m.states != first.states {
                return Err(ValidationError::InvalidParameter {
                    name: "matrices",
                    value: "mixture components must share one state set".to_string(),
                });
            }
            for (acc, row) in rows.iter_mut().zip(&m.rows) {
                for (a, &p) in acc.iter_mut().zip(row) {
                    *a += w * p;
                }
            }
        }

        Self::from_state_set(rows, first.states.clone(), RowSumCheck::default())
    }

    /// Number of states.
    #[inline]
    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    /// The state set indexing rows and columns.
    #[inline]
    pub fn states(&self) -> &StateSet {
        &self.states
    }

    /// Index of a state label.
    #[inline]
    pub fn index_of(&self, label: &str) -> Result<usize, LookupError> {
        self.states.index_of(label)
    }

    /// Label of a state index.
    #[inline]
    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.states.label_of(index)
    }

    /// Next-state distribution for `label`.
    pub fn row(&self, label: &str) -> Result<&[f64], LookupError> {
        let i = self.states.index_of(label)?;
        Ok(&self.rows[i])
    }

    /// Next-state distribution for state `index`, if in range.
    #[inline]
    pub fn row_at(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// All rows.
    #[inline]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Whether state `index` keeps all of its mass.
    pub fn is_absorbing(&self, index: usize) -> bool {
        self.rows
            .get(index)
            .map(|row| (row[index] - 1.0).abs() <= DEFAULT_ROW_SUM_TOLERANCE)
            .unwrap_or(false)
    }

    /// Indices of all absorbing states.
    pub fn absorbing_indices(&self) -> Vec<usize> {
        (0..self.dim()).filter(|&i| self.is_absorbing(i)).collect()
    }

    /// Row vector times matrix: redistributes `mass` along each state's row.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `mass.len() != self.dim()`.
    pub fn apply(&self, mass: &[f64]) -> Result<Vec<f64>, ValidationError> {
        let n = self.dim();
        if mass.len() != n {
            return Err(ValidationError::DimensionMismatch {
                what: "population vector",
                expected: n,
                got: mass.len(),
            });
        }

        let mut out = vec![0.0; n];
        for (&m, row) in mass.iter().zip(&self.rows) {
            if m == 0.0 {
                continue;
            }
            for (o, &p) in out.iter_mut().zip(row) {
                *o += m * p;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_state() -> TransitionMatrix {
        TransitionMatrix::new(
            vec![
                vec![0.7, 0.2, 0.1],
                vec![0.3, 0.5, 0.2],
                vec![0.0, 0.0, 1.0],
            ],
            ["Active", "Dormant", "Churned"],
        )
        .unwrap()
    }

    #[test]
    fn test_row_lookup_by_label() {
        let m = three_state();
        assert_eq!(m.row("Dormant").unwrap(), &[0.3, 0.5, 0.2]);
        assert_eq!(m.row_at(0).unwrap(), &[0.7, 0.2, 0.1]);
        assert!(m.row_at(3).is_none());
        assert!(matches!(
            m.row("Paused"),
            Err(LookupError::UnknownState { .. })
        ));
    }

    #[test]
    fn test_label_index_translation() {
        let m = three_state();
        assert_eq!(m.index_of("Churned").unwrap(), 2);
        assert_eq!(m.label_of(0), Some("Active"));
        assert_eq!(m.dim(), 3);
    }

    #[test]
    fn test_row_sum_point_nine_rejected() {
        let err = TransitionMatrix::new(vec![vec![0.6, 0.3], vec![0.0, 1.0]], ["A", "B"])
            .unwrap_err();
        match err {
            ValidationError::RowNotStochastic { row, sum } => {
                assert_eq!(row, 0);
                assert_relative_eq!(sum, 0.9, epsilon = 1e-12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_row_sum_within_tolerance_accepted() {
        let m = TransitionMatrix::new(
            vec![vec![0.333_333_3, 0.666_666_7], vec![0.5, 0.5]],
            ["A", "B"],
        );
        assert!(m.is_ok());
    }

    #[test]
    fn test_skip_row_sum_check() {
        let m = TransitionMatrix::with_validation(
            vec![vec![0.6, 0.3], vec![0.0, 1.0]],
            ["A", "B"],
            RowSumCheck::Skip,
        );
        assert!(m.is_ok());
    }

    #[test]
    fn test_negative_entry_rejected_even_when_skipping() {
        let err = TransitionMatrix::with_validation(
            vec![vec![1.2, -0.2], vec![0.0, 1.0]],
            ["A", "B"],
            RowSumCheck::Skip,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NegativeProbability { row: 0, col: 1, .. }
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = TransitionMatrix::new(vec![vec![f64::NAN, 1.0], vec![0.0, 1.0]], ["A", "B"])
            .unwrap_err();
        assert_eq!(err, ValidationError::NonFiniteEntry { row: 0, col: 0 });
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = TransitionMatrix::new(vec![vec![1.0, 0.0]], ["A", "B"]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::DimensionMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));

        let err = TransitionMatrix::new(vec![vec![1.0], vec![0.0, 1.0]], ["A", "B"])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::RaggedMatrix {
                row: 0,
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_absorbing_detection() {
        let m = three_state();
        assert!(!m.is_absorbing(0));
        assert!(m.is_absorbing(2));
        assert!(!m.is_absorbing(7));
        assert_eq!(m.absorbing_indices(), vec![2]);
    }

    #[test]
    fn test_apply_conserves_mass() {
        let m = three_state();
        let v = [500.0, 300.0, 200.0];
        let next = m.apply(&v).unwrap();
        assert_relative_eq!(next.iter().sum::<f64>(), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(next[0], 500.0 * 0.7 + 300.0 * 0.3, epsilon = 1e-9);
        assert_relative_eq!(next[2], 500.0 * 0.1 + 300.0 * 0.2 + 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_apply_length_mismatch() {
        let m = three_state();
        assert!(matches!(
            m.apply(&[1.0, 2.0]),
            Err(ValidationError::DimensionMismatch { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn test_mixture() {
        let a = TransitionMatrix::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]], ["A", "B"]).unwrap();
        let b = TransitionMatrix::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]], ["A", "B"]).unwrap();
        let mix = TransitionMatrix::mixture(&[0.25, 0.75], &[&a, &b]).unwrap();
        assert_relative_eq!(mix.rows()[0][0], 0.25);
        assert_relative_eq!(mix.rows()[0][1], 0.75);
        assert_relative_eq!(mix.rows()[1][0], 0.75);
    }

    #[test]
    fn test_mixture_rejects_mismatched_states() {
        let a = TransitionMatrix::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]], ["A", "B"]).unwrap();
        let b = TransitionMatrix::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]], ["A", "C"]).unwrap();
        assert!(TransitionMatrix::mixture(&[0.5, 0.5], &[&a, &b]).is_err());
        assert!(TransitionMatrix::mixture(&[1.0], &[]).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn stochastic_row(n: usize) -> impl Strategy<Value = Vec<f64>> {
            proptest::collection::vec(0.01f64..1.0, n).prop_map(|raw| {
                let s: f64 = raw.iter().sum();
                raw.into_iter().map(|x| x / s).collect()
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn test_apply_preserves_total_mass(
                rows in proptest::collection::vec(stochastic_row(4), 4),
                mass in proptest::collection::vec(0.0f64..10_000.0, 4),
            ) {
                let m = TransitionMatrix::new(rows, ["A", "B", "C", "D"]).unwrap();
                let next = m.apply(&mass).unwrap();
                let before: f64 = mass.iter().sum();
                let after: f64 = next.iter().sum();
                prop_assert!((before - after).abs() <= 1e-6 * before.max(1.0));
                prop_assert!(next.iter().all(|&x| x >= 0.0));
            }
        }
    }
}
