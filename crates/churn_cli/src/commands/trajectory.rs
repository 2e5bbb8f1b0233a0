//! Trajectory command implementation
//!
//! Samples individual state paths from the scenario's chain.

use std::io::Write;

use churn_core::MAX_STEPS;
use churn_models::rng::ChainRng;
use churn_models::trajectory::generate_states;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::output::{self, OutputFormat, TrajectorySet};
use crate::{CliError, Result};

/// Run the trajectory command
pub fn run(
    scenario: &ScenarioConfig,
    start: &str,
    steps: usize,
    entities: usize,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    if steps == 0 || steps > MAX_STEPS {
        return Err(CliError::InvalidArgument(format!(
            "steps must be in [1, {MAX_STEPS}], got {steps}"
        )));
    }
    if entities == 0 {
        return Err(CliError::InvalidArgument(
            "entities must be at least 1".to_string(),
        ));
    }

    let model = scenario.model()?;
    let mut rng = ChainRng::from_seed(scenario.seed.unwrap_or(0));
    info!(start, steps, entities, seed = rng.seed(), "Sampling trajectories");

    let paths = (0..entities)
        .map(|_| generate_states(&model, &mut rng, start, steps))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let set = TrajectorySet {
        start: start.to_string(),
        paths,
    };
    output::write(&set, format, out)
}
