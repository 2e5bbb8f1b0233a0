//! Value command implementation
//!
//! Projects the scenario and values the table in one market.

use std::io::Write;

use churn_projection::{PopulationProjector, ProjectionKind};
use churn_valuation::lifetime_value;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::output::{self, OutputFormat};
use crate::Result;

/// Run the value command
pub fn run(
    scenario: &ScenarioConfig,
    market: &str,
    kind: ProjectionKind,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let prices = scenario.prices()?;
    let mut projector = PopulationProjector::new(scenario.model()?, scenario.projection_config()?);
    let inflow = scenario.inflow()?;

    info!(market, ?kind, "Starting valuation");
    let value = lifetime_value(
        market,
        &prices,
        &mut projector,
        scenario.initial()?,
        &inflow,
        kind,
    )?;
    info!(market, total = value.total(), "Valuation complete");

    output::write(&value, format, out)
}
