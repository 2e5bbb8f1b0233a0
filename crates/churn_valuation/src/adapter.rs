//! Valuation of projection tables.
//!
//! Every cell of a [`ProjectionTable`] is multiplied by the price of its
//! state in the chosen market. Summing the result over steps and states gives
//! the customer lifetime value over the projected horizon.

use churn_core::types::{ChainError, LookupError};
use churn_models::inflow::InflowSampler;
use churn_projection::{PopulationProjector, ProjectionKind, ProjectionTable};
use tracing::debug;

use crate::prices::PriceTable;

/// Monetary value per step (rows) and state (columns).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValueTable {
    market: String,
    states: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ValueTable {
    /// Market the table was valued in.
    #[inline]
    pub fn market(&self) -> &str {
        &self.market
    }

    /// Column labels in order.
    #[inline]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Number of rows.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.rows.len()
    }

    /// All rows.
    #[inline]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Row at step `t`.
    #[inline]
    pub fn row(&self, t: usize) -> Option<&[f64]> {
        self.rows.get(t).map(Vec::as_slice)
    }

    /// Values of one state across all steps.
    ///
    /// # Errors
    ///
    /// `LookupError::UnknownState` if `label` is not a column.
    pub fn column(&self, label: &str) -> Result<Vec<f64>, LookupError> {
        let index = self
            .states
            .iter()
            .position(|s| s == label)
            .ok_or_else(|| LookupError::UnknownState {
                label: label.to_string(),
            })?;
        Ok(self.rows.iter().map(|r| r[index]).collect())
    }

    /// Value of each step, summed over states.
    pub fn step_totals(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.iter().sum()).collect()
    }

    /// Total value over the horizon.
    pub fn total(&self) -> f64 {
        self.rows.iter().flatten().sum()
    }
}

/// Values projection tables against a [`PriceTable`].
///
/// # Examples
///
/// ```
/// use churn_projection::ProjectionTable;
/// use churn_valuation::{PriceTable, ValuationAdapter};
///
/// let prices = PriceTable::from_nested([("US", [("Active", 10.0), ("Churned", 0.0)])]).unwrap();
/// let table = ProjectionTable::from_rows(
///     vec!["Active".to_string(), "Churned".to_string()],
///     vec![vec![100, 5]],
/// )
/// .unwrap();
///
/// let value = ValuationAdapter::value("US", &prices, &table).unwrap();
/// assert_eq!(value.row(0).unwrap(), &[1000.0, 0.0]);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ValuationAdapter;

impl ValuationAdapter {
    /// Multiplies every cell of `table` by its state's price in `market`.
    ///
    /// # Errors
    ///
    /// - `LookupError::UnknownMarket` if `market` is not in `prices`
    /// - `LookupError::MissingPrice` if a column has no price in `market`
    pub fn value(
        market: &str,
        prices: &PriceTable,
        table: &ProjectionTable,
    ) -> Result<ValueTable, LookupError> {
        let aligned = prices.get(market)?.aligned(table.states())?;
        let rows: Vec<Vec<f64>> = table
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&aligned)
                    .map(|(&count, &price)| count as f64 * price)
                    .collect()
            })
            .collect();

        debug!(market, rows = rows.len(), "valued projection table");
        Ok(ValueTable {
            market: market.to_string(),
            states: table.states().to_vec(),
            rows,
        })
    }
}

/// Runs the projection selected by `kind` and values it in `market`.
///
/// The market is checked before projecting, so an unknown market fails
/// without consuming random draws.
///
/// # Errors
///
/// Projection errors and the lookup errors of [`ValuationAdapter::value`].
pub fn lifetime_value(
    market: &str,
    prices: &PriceTable,
    projector: &mut PopulationProjector,
    initial: &[u64],
    inflow: &InflowSampler,
    kind: ProjectionKind,
) -> Result<ValueTable, ChainError> {
    prices.get(market)?;
    let table = projector.run(kind, initial, inflow)?;
    Ok(ValuationAdapter::value(market, prices, &table)?)
}
