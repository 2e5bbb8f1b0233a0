//! Ordered state labels with a bidirectional label↔index lookup.

use super::error::{LookupError, ValidationError};
use std::collections::HashMap;

/// Ordered, duplicate-free set of state labels.
///
/// The position of a label is its index in every matrix, population vector
/// and table built over this set. The label→index map is built once at
/// construction and never mutated.
///
/// # Examples
///
/// ```
/// use churn_core::types::StateSet;
///
/// let states = StateSet::new(["Active", "Dormant", "Churned"]).unwrap();
/// assert_eq!(states.len(), 3);
/// assert_eq!(states.index_of("Dormant").unwrap(), 1);
/// assert_eq!(states.label_of(2), Some("Churned"));
/// assert_eq!(states.last(), "Churned");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StateSet {
    labels: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    index: HashMap<String, usize>,
}

impl StateSet {
    /// Builds a state set from labels in matrix order.
    ///
    /// # Errors
    ///
    /// - `TooFewStates` for fewer than two labels
    /// - `EmptyLabel` for an empty (or whitespace-only) label
    /// - `DuplicateState` when a label repeats
    pub fn new<I, S>(labels: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() < 2 {
            return Err(ValidationError::TooFewStates { got: labels.len() });
        }

        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(ValidationError::EmptyLabel { index: i });
            }
            if index.insert(label.clone(), i).is_some() {
                return Err(ValidationError::DuplicateState {
                    label: label.clone(),
                });
            }
        }

        Ok(Self { labels, index })
    }

    /// Number of states.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always `false`: a valid state set holds at least two labels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index of `label`.
    ///
    /// # Errors
    ///
    /// `LookupError::UnknownState` if the label is not in the set.
    pub fn index_of(&self, label: &str) -> Result<usize, LookupError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| LookupError::UnknownState {
                label: label.to_string(),
            })
    }

    /// Label at `index`, if in range.
    #[inline]
    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Whether `label` is in the set.
    #[inline]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// The last label (the conventional absorbing state).
    #[inline]
    pub fn last(&self) -> &str {
        // Non-empty by construction.
        self.labels.last().map(String::as_str).unwrap_or_default()
    }

    /// Labels in index order.
    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Iterates labels in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
