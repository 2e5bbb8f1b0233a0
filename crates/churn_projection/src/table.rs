//! Projected population table.

use churn_core::types::{LookupError, ValidationError};

/// Population counts per step (rows) and state (columns).
///
/// Row 0 is the initial population; each later row is a snapshot taken
/// after that step's transition and inflow.
///
/// # Examples
///
/// ```
/// use churn_projection::table::ProjectionTable;
///
/// let table = ProjectionTable::from_rows(
///     vec!["Active".to_string(), "Churned".to_string()],
///     vec![vec![1000, 0], vec![800, 200]],
/// )
/// .unwrap();
///
/// assert_eq!(table.n_steps(), 2);
/// assert_eq!(table.column("Churned").unwrap(), vec![0, 200]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProjectionTable {
    states: Vec<String>,
    rows: Vec<Vec<u64>>,
}

impl ProjectionTable {
    /// Builds a table from column labels and rows.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if any row length differs from the label count.
    pub fn from_rows(states: Vec<String>, rows: Vec<Vec<u64>>) -> Result<Self, ValidationError> {
        if let Some(row) = rows.iter().find(|r| r.len() != states.len()) {
            return Err(ValidationError::DimensionMismatch {
                what: "table row",
                expected: states.len(),
                got: row.len(),
            });
        }
        Ok(Self { states, rows })
    }

    /// Number of rows.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.rows.len()
    }

    /// Number of state columns.
    #[inline]
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Column labels in order.
    #[inline]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Row at step `t`.
    #[inline]
    pub fn row(&self, t: usize) -> Option<&[u64]> {
        self.rows.get(t).map(Vec::as_slice)
    }

    /// All rows.
    #[inline]
    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    /// Counts of one state across all steps.
    ///
    /// # Errors
    ///
    /// `LookupError::UnknownState` if `label` is not a column.
    pub fn column(&self, label: &str) -> Result<Vec<u64>, LookupError> {
        let index = self
            .states
            .iter()
            .position(|s| s == label)
            .ok_or_else(|| LookupError::UnknownState {
                label: label.to_string(),
            })?;
        Ok(self.rows.iter().map(|r| r[index]).collect())
    }

    /// Population total of row `t`; `None` past the last row or if the
    /// total does not fit a `u64`.
    pub fn row_total(&self, t: usize) -> Option<u64> {
        self.row(t)
            .and_then(|r| r.iter().try_fold(0u64, |acc, &c| acc.checked_add(c)))
    }

    /// Last row.
    pub fn last(&self) -> Option<&[u64]> {
        self.rows.last().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProjectionTable {
        ProjectionTable::from_rows(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![vec![10, 0, 0], vec![7, 2, 1], vec![5, 3, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_shape() {
        let table = sample();
        assert_eq!(table.n_steps(), 3);
        assert_eq!(table.n_states(), 3);
        assert_eq!(table.row(1), Some(&[7u64, 2, 1][..]));
        assert_eq!(table.row(3), None);
        assert_eq!(table.last(), Some(&[5u64, 3, 2][..]));
    }

    #[test]
    fn test_column_and_totals() {
        let table = sample();
        assert_eq!(table.column("B").unwrap(), vec![0, 2, 3]);
        assert_eq!(table.row_total(2), Some(10));
        assert_eq!(table.row_total(3), None);

        let huge =
            ProjectionTable::from_rows(vec!["A".to_string(), "B".to_string()], vec![vec![u64::MAX, 1]])
                .unwrap();
        assert_eq!(huge.row_total(0), None);
        assert_eq!(
            table.column("Z").unwrap_err(),
            LookupError::UnknownState {
                label: "Z".to_string()
            }
        );
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = ProjectionTable::from_rows(vec!["A".to_string()], vec![vec![1], vec![1, 2]]);
        assert!(matches!(
            result,
            Err(ValidationError::DimensionMismatch {
                expected: 1,
                got: 2,
                ..
            })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_json() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"states":["A","B","C"],"rows":[[10,0,0],[7,2,1],[5,3,2]]}"#
        );
    }
}
