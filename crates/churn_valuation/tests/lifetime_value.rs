//! Integration tests for projecting and valuing in one call.

use approx::assert_relative_eq;
use churn_core::matrix::TransitionMatrix;
use churn_core::types::{ChainError, LookupError};
use churn_models::inflow::InflowSampler;
use churn_projection::{PopulationProjector, ProjectionConfig, ProjectionKind};
use churn_valuation::{lifetime_value, PriceTable, ValuationAdapter};

fn projector(step_nr: usize) -> PopulationProjector {
    let matrix = TransitionMatrix::new(
        vec![vec![0.8, 0.2], vec![0.0, 1.0]],
        ["Active", "Churned"],
    )
    .unwrap();
    let config = ProjectionConfig::builder().step_nr(step_nr).build().unwrap();
    PopulationProjector::new(matrix, config)
}

fn prices() -> PriceTable {
    PriceTable::from_nested([
        ("US", [("Active", 10.0), ("Churned", 0.0)]),
        ("UK", [("Active", 8.0), ("Churned", 1.0)]),
    ])
    .unwrap()
}

#[test]
fn test_lifetime_value_absorbing() {
    let mut projector = projector(3);
    let value = lifetime_value(
        "US",
        &prices(),
        &mut projector,
        &[1000, 0],
        &InflowSampler::none(),
        ProjectionKind::Absorbing,
    )
    .unwrap();

    assert_eq!(value.column("Active").unwrap(), vec![10_000.0, 8_000.0, 6_400.0]);
    assert_relative_eq!(value.total(), 24_400.0);
}

#[test]
fn test_lifetime_value_matches_two_stage() {
    let mut one = projector(6);
    let mut two = projector(6);

    let direct = lifetime_value(
        "UK",
        &prices(),
        &mut one,
        &[500, 20],
        &InflowSampler::none(),
        ProjectionKind::Plain,
    )
    .unwrap();

    let table = two.project(&[500, 20], &InflowSampler::none()).unwrap();
    let staged = ValuationAdapter::value("UK", &prices(), &table).unwrap();

    assert_eq!(direct, staged);
}

#[test]
fn test_lifetime_value_unknown_market() {
    let mut projector = projector(3);
    let err = lifetime_value(
        "NL",
        &prices(),
        &mut projector,
        &[1000, 0],
        &InflowSampler::none(),
        ProjectionKind::Absorbing,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ChainError::Lookup(LookupError::UnknownMarket {
            market: "NL".to_string()
        })
    );
}

#[test]
fn test_churned_valuation_counts_cumulative_sink() {
    let mut projector = projector(3);
    let value = lifetime_value(
        "UK",
        &prices(),
        &mut projector,
        &[1000, 0],
        &InflowSampler::none(),
        ProjectionKind::Absorbing,
    )
    .unwrap();

    assert_eq!(value.column("Churned").unwrap(), vec![0.0, 200.0, 360.0]);
    assert_eq!(value.step_totals(), vec![8_000.0, 6_600.0, 5_480.0]);
}
