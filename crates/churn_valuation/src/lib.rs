//! # Churn Valuation (L4: Application)
//!
//! Converts projected state populations into money.
//!
//! - [`prices`]: `PriceVector` (state → price for one market) and
//!   `PriceTable` (market → prices)
//! - [`adapter`]: `ValuationAdapter`, `ValueTable` and the
//!   [`lifetime_value`] helper that projects and values in one call
//!
//! A `ValueTable` has the shape of the projection it was computed from; its
//! [`total`](ValueTable::total) is the customer lifetime value over the
//! projected horizon.

#![warn(missing_docs)]

pub mod adapter;
pub mod prices;

pub use adapter::{lifetime_value, ValuationAdapter, ValueTable};
pub use prices::{PriceTable, PriceVector};
