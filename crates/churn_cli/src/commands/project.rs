//! Project command implementation
//!
//! Projects the scenario's population, once or as a seeded ensemble.

use std::io::Write;

use churn_projection::{PopulationProjector, ProjectionEnsemble, ProjectionKind};
use tracing::info;

use crate::config::ScenarioConfig;
use crate::output::{self, OutputFormat};
use crate::Result;

/// Run the project command
pub fn run(
    scenario: &ScenarioConfig,
    kind: ProjectionKind,
    runs: usize,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let model = scenario.model()?;
    let config = scenario.projection_config()?;
    let inflow = scenario.inflow()?;
    let initial = scenario.initial()?;

    info!(?kind, runs, step_nr = config.step_nr(), "Starting projection");

    if runs > 1 {
        let ensemble = ProjectionEnsemble::new(model, config, runs)?;
        let summary = ensemble.run(kind, initial, &inflow)?;
        output::write(&summary, format, out)?;
    } else {
        let mut projector = PopulationProjector::new(model, config);
        let table = projector.run(kind, initial, &inflow)?;
        output::write(&table, format, out)?;
    }

    info!("Projection complete");
    Ok(())
}
