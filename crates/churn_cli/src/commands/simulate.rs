//! Simulate command implementation
//!
//! Runs the entity-level customer simulation and prints each customer's
//! state history.

use std::io::Write;

use churn_core::counts::total;
use churn_models::model::TransitionModel;
use churn_models::rng::ChainRng;
use churn_models::simulation::CustomerSimulation;
use tracing::info;

use crate::config::{InflowSection, ScenarioConfig};
use crate::output::{self, OutputFormat};
use crate::{CliError, Result};

/// First-state probabilities: the initial population's mix, or, for an
/// empty population, the scheduled first-touch split with the sink at 0.
fn first_touch(scenario: &ScenarioConfig) -> Result<Vec<f64>> {
    let initial = scenario.initial()?;
    let population = total(initial)?;
    if population > 0 {
        return Ok(initial
            .iter()
            .map(|&c| c as f64 / population as f64)
            .collect());
    }

    match &scenario.inflow {
        InflowSection::Scheduled { first_touch, .. } => {
            let model = scenario.model()?;
            let sink = scenario
                .projection_config()?
                .absorbing_state()
                .resolve(model.states())?;
            let mut probs = first_touch.clone();
            if sink <= probs.len() {
                probs.insert(sink, 0.0);
            }
            Ok(probs)
        }
        _ => Err(CliError::InvalidArgument(
            "initial population is empty and no first-touch split is configured".to_string(),
        )),
    }
}

/// Run the simulate command
///
/// `customers` defaults to the initial population total and `steps` to one
/// fewer than the projection's `step_nr`, so the history has as many columns
/// as the projection has rows.
pub fn run(
    scenario: &ScenarioConfig,
    customers: Option<u64>,
    steps: Option<usize>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let n_customers = match customers {
        Some(n) => n,
        None => total(scenario.initial()?)?,
    };
    let steps = steps.unwrap_or(scenario.projection.step_nr.saturating_sub(1));

    let simulation =
        CustomerSimulation::new(scenario.model()?, first_touch(scenario)?, n_customers, steps)?
            .with_arrivals(scenario.arrivals()?);
    let mut rng = ChainRng::from_seed(scenario.seed.unwrap_or(0));
    info!(n_customers, steps, seed = rng.seed(), "Simulating customers");

    let history = simulation.run(&mut rng)?;
    info!(customers = history.n_customers(), "Simulation complete");
    output::write(&history, format, out)
}
