//! churnflow - Markov customer-state projection from the command line
//!
//! Reads a TOML scenario, projects it and prints a table, JSON or CSV.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use churn_cli::config::{build_config, CliArgs};
use churn_cli::output::OutputFormat;
use churn_cli::{commands, VERSION};
use churn_projection::ProjectionKind;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// churnflow - Markov customer-state projection and valuation
#[derive(Parser, Debug)]
#[command(name = "churnflow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Scenario file path (TOML format)
    #[arg(short, long, global = true, value_name = "FILE", default_value = "scenario.toml")]
    scenario: PathBuf,

    /// Seed override for inflow and trajectory draws
    #[arg(long, global = true, env = "CHURNFLOW_SEED")]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CHURNFLOW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Projection variant on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Plain,
    Absorbing,
}

impl From<Kind> for ProjectionKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Plain => ProjectionKind::Plain,
            Kind::Absorbing => ProjectionKind::Absorbing,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Project the scenario population
    Project {
        /// Projection variant
        #[arg(short, long, value_enum, default_value = "absorbing")]
        kind: Kind,

        /// Number of seeded runs; more than one prints mean/min/max
        #[arg(short, long, default_value = "1")]
        runs: usize,
    },

    /// Project and value the population in one market
    Value {
        /// Market key of the price table
        #[arg(short, long)]
        market: String,

        /// Projection variant
        #[arg(short, long, value_enum, default_value = "absorbing")]
        kind: Kind,
    },

    /// Simulate individual customers, newcomers included
    Simulate {
        /// Initial customers (defaults to the initial population total)
        #[arg(short, long)]
        customers: Option<u64>,

        /// Simulated steps (defaults to the projection's step_nr - 1)
        #[arg(long)]
        steps: Option<usize>,
    },

    /// Sample individual state trajectories
    Trajectory {
        /// Starting state label
        #[arg(long)]
        start: String,

        /// Steps per trajectory
        #[arg(long, default_value = "10")]
        steps: usize,

        /// Number of entities to sample
        #[arg(short, long, default_value = "1")]
        entities: usize,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let args = CliArgs {
        scenario: cli.scenario.clone(),
        seed: cli.seed,
        log_level: cli.log_level.clone(),
    };
    let scenario = build_config(&args)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;

    init_tracing(scenario.log_level.as_filter_str());
    tracing::info!("churnflow v{}", VERSION);
    tracing::info!(
        scenario = %cli.scenario.display(),
        seed = ?scenario.seed,
        states = scenario.chain.states.len(),
        "Scenario loaded"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Project { kind, runs } => {
            commands::project::run(&scenario, kind.into(), runs, cli.format, &mut out)
                .context("project command failed")?
        }
        Commands::Value { market, kind } => {
            commands::value::run(&scenario, &market, kind.into(), cli.format, &mut out)
                .with_context(|| format!("valuation in market {market} failed"))?
        }
        Commands::Simulate { customers, steps } => {
            commands::simulate::run(&scenario, customers, steps, cli.format, &mut out)
                .context("simulate command failed")?
        }
        Commands::Trajectory {
            start,
            steps,
            entities,
        } => commands::trajectory::run(&scenario, &start, steps, entities, cli.format, &mut out)
            .context("trajectory command failed")?,
    }
    out.flush()?;
    Ok(())
}
