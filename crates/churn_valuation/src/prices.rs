//! Per-market state prices.

use std::collections::BTreeMap;

use churn_core::types::{LookupError, ValidationError};

/// Prices of one market, keyed by state label.
///
/// A price is the value of one entity spending one step in that state.
/// Negative prices (costs) are allowed; non-finite prices are not.
///
/// # Examples
///
/// ```
/// use churn_valuation::prices::PriceVector;
///
/// let prices = PriceVector::new("US", [("Active", 10.0), ("Churned", 0.0)]).unwrap();
/// let states = vec!["Churned".to_string(), "Active".to_string()];
/// assert_eq!(prices.aligned(&states).unwrap(), vec![0.0, 10.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PriceVector {
    market: String,
    prices: BTreeMap<String, f64>,
}

impl PriceVector {
    /// Creates the price vector of `market`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a non-finite price.
    pub fn new<M, I, S>(market: M, prices: I) -> Result<Self, ValidationError>
    where
        M: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let market = market.into();
        let mut map = BTreeMap::new();
        for (state, price) in prices {
            let state = state.into();
            if !price.is_finite() {
                return Err(ValidationError::InvalidParameter {
                    name: "price",
                    value: format!("{market}/{state} = {price}"),
                });
            }
            map.insert(state, price);
        }
        Ok(Self {
            market,
            prices: map,
        })
    }

    /// Market this vector belongs to.
    #[inline]
    pub fn market(&self) -> &str {
        &self.market
    }

    /// Price of one state, if present.
    #[inline]
    pub fn get(&self, state: &str) -> Option<f64> {
        self.prices.get(state).copied()
    }

    /// Number of priced states.
    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no state is priced.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Prices in the order of `states`.
    ///
    /// # Errors
    ///
    /// `LookupError::MissingPrice` naming the first state without a price.
    pub fn aligned(&self, states: &[String]) -> Result<Vec<f64>, LookupError> {
        states
            .iter()
            .map(|state| {
                self.get(state).ok_or_else(|| LookupError::MissingPrice {
                    market: self.market.clone(),
                    state: state.clone(),
                })
            })
            .collect()
    }
}

/// Market → [`PriceVector`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable {
    markets: BTreeMap<String, PriceVector>,
}

impl PriceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from nested `market → state → price` maps.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a non-finite price.
    pub fn from_nested<I, M, P, S>(markets: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (M, P)>,
        M: Into<String>,
        P: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (market, prices) in markets {
            table.insert(PriceVector::new(market, prices)?);
        }
        Ok(table)
    }

    /// Adds or replaces a market's prices.
    pub fn insert(&mut self, prices: PriceVector) -> Option<PriceVector> {
        self.markets.insert(prices.market.clone(), prices)
    }

    /// Prices of `market`.
    ///
    /// # Errors
    ///
    /// `LookupError::UnknownMarket` naming the market.
    pub fn get(&self, market: &str) -> Result<&PriceVector, LookupError> {
        self.markets
            .get(market)
            .ok_or_else(|| LookupError::UnknownMarket {
                market: market.to_string(),
            })
    }

    /// Market names in sorted order.
    pub fn markets(&self) -> impl Iterator<Item = &str> {
        self.markets.keys().map(String::as_str)
    }

    /// Number of markets.
    #[inline]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    /// Whether the table has no markets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
