//! Scenario configuration management
//!
//! A scenario is a TOML file describing the chain, the initial population,
//! the inflow policy and the price table. Seed and log level can be
//! overridden from environment variables and CLI arguments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use churn_core::matrix::TransitionMatrix;
use churn_core::types::{ChainError, ValidationError};
use churn_models::inflow::{
    InflowSampler, InflowSchedule, QuotaBase, QuotaInflow, QuotaRounding, ScheduledInflow,
};
use churn_models::model::{Cluster, TransitionModelEnum};
use churn_models::simulation::Arrivals;
use churn_projection::ProjectionConfig;
use churn_valuation::PriceTable;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable overriding the scenario seed.
pub const ENV_SEED: &str = "CHURNFLOW_SEED";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "CHURNFLOW_LOG_LEVEL";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid seed: {0}. Must be an unsigned 64-bit integer")]
    InvalidSeed(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Invalid scenario: {0}")]
    Scenario(String),
}

/// Log levels supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

/// `[chain]`: states plus either one matrix or a list of clusters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
    /// State labels in matrix order
    pub states: Vec<String>,
    /// Row-stochastic matrix for a homogeneous chain
    #[serde(default)]
    pub matrix: Option<Vec<Vec<f64>>>,
    /// Cluster definitions for a clustered chain
    #[serde(default)]
    pub clusters: Vec<ClusterSection>,
}

/// `[[chain.clusters]]`
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSection {
    /// Cluster name, unique within the chain
    pub name: String,
    /// Probability that an entity belongs to this cluster
    pub probability: f64,
    /// Row-stochastic matrix over `chain.states`
    pub matrix: Vec<Vec<f64>>,
}

/// `[projection]`
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionSection {
    /// Number of table rows
    pub step_nr: usize,
    /// Initial population per state
    pub initial: Vec<u64>,
    /// Sink state label (defaults to the last state)
    #[serde(default)]
    pub absorbing_state: Option<String>,
    #[serde(default)]
    pub quota_base: QuotaBase,
}

/// `[inflow]`, selected by `mode`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum InflowSection {
    /// No newcomers
    #[default]
    None,
    /// `floor(T·q)` newcomers per step
    Quota {
        quota: f64,
        #[serde(default)]
        rounding: QuotaRounding,
    },
    /// Hourly arrivals split by first-touch probabilities
    Scheduled {
        /// `[bucket, arrivals per hour]` pairs
        schedule: Vec<(u32, f64)>,
        first_touch: Vec<f64>,
    },
}

/// Scenario file structure
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    /// Seed for inflow and trajectory draws
    #[serde(default)]
    pub seed: Option<u64>,
    /// Log level
    #[serde(default, deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub chain: ChainSection,
    pub projection: ProjectionSection,
    #[serde(default)]
    pub inflow: InflowSection,
    /// market → state → price
    #[serde(default)]
    pub prices: BTreeMap<String, BTreeMap<String, f64>>,
}

impl FromStr for ScenarioConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: ScenarioConfig = toml::from_str(s)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl ScenarioConfig {
    /// Load a scenario from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        content.parse()
    }

    /// Apply `CHURNFLOW_SEED` and `CHURNFLOW_LOG_LEVEL` overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(seed) = std::env::var(ENV_SEED) {
            self.seed = Some(parse_seed(&seed)?);
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        Ok(())
    }

    /// Structural checks that do not need the domain constructors
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.chain.matrix, self.chain.clusters.is_empty()) {
            (Some(_), false) => Err(ConfigError::Scenario(
                "chain has both `matrix` and `clusters`".to_string(),
            )),
            (None, true) => Err(ConfigError::Scenario(
                "chain needs either `matrix` or `clusters`".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Transition model described by `[chain]`
    pub fn model(&self) -> Result<TransitionModelEnum, ValidationError> {
        let states = self.chain.states.clone();
        match &self.chain.matrix {
            Some(rows) => Ok(TransitionMatrix::new(rows.clone(), states)?.into()),
            None => {
                let clusters = self
                    .chain
                    .clusters
                    .iter()
                    .map(|c| {
                        TransitionMatrix::new(c.matrix.clone(), states.clone())
                            .map(|m| Cluster::new(c.name.clone(), c.probability, m))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                TransitionModelEnum::clustered(clusters)
            }
        }
    }

    /// Projection configuration described by `[projection]` and `seed`
    pub fn projection_config(&self) -> Result<ProjectionConfig, ValidationError> {
        let mut builder = ProjectionConfig::builder()
            .step_nr(self.projection.step_nr)
            .quota_base(self.projection.quota_base);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        if let Some(label) = &self.projection.absorbing_state {
            builder = builder.absorbing_state(label.clone());
        }
        builder.build()
    }

    /// Inflow sampler described by `[inflow]`
    pub fn inflow(&self) -> Result<InflowSampler, ValidationError> {
        Ok(match &self.inflow {
            InflowSection::None => InflowSampler::none(),
            InflowSection::Quota { quota, rounding } => {
                QuotaInflow::new(*quota)?.with_rounding(*rounding).into()
            }
            InflowSection::Scheduled {
                schedule,
                first_touch,
            } => {
                let schedule = InflowSchedule::new(schedule.iter().copied())?;
                ScheduledInflow::new(schedule, first_touch.clone())?.into()
            }
        })
    }

    /// Newcomer policy for customer simulation, read from `[inflow]`
    ///
    /// Quota newcomers are counted against the initial customers; a
    /// schedule is used as is and its first-touch split is ignored.
    pub fn arrivals(&self) -> Result<Arrivals, ValidationError> {
        Ok(match &self.inflow {
            InflowSection::None => Arrivals::None,
            InflowSection::Quota { quota, rounding } => {
                Arrivals::Quota(QuotaInflow::new(*quota)?.with_rounding(*rounding))
            }
            InflowSection::Scheduled { schedule, .. } => {
                Arrivals::Scheduled(InflowSchedule::new(schedule.iter().copied())?)
            }
        })
    }

    /// Price table described by `[prices.<market>]`
    pub fn prices(&self) -> Result<PriceTable, ValidationError> {
        PriceTable::from_nested(
            self.prices
                .iter()
                .map(|(market, prices)| (market.clone(), prices.clone())),
        )
    }

    /// Initial population, checked against the state count
    pub fn initial(&self) -> Result<&[u64], ChainError> {
        let n = self.chain.states.len();
        if self.projection.initial.len() != n {
            return Err(ValidationError::DimensionMismatch {
                what: "initial population",
                expected: n,
                got: self.projection.initial.len(),
            }
            .into());
        }
        Ok(&self.projection.initial)
    }
}

fn parse_seed(s: &str) -> Result<u64, ConfigError> {
    s.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSeed(s.to_string()))
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Scenario file path
    pub scenario: PathBuf,
    /// Seed override
    pub seed: Option<u64>,
    /// Log level override
    pub log_level: Option<String>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Scenario file
pub fn build_config(cli: &CliArgs) -> Result<ScenarioConfig, ConfigError> {
    let mut config = ScenarioConfig::from_file(&cli.scenario)?;
    config.apply_env()?;
    config.merge_with_cli(cli)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOMOGENEOUS: &str = r#"
        seed = 7
        log_level = "info"

        [chain]
        states = ["Active", "Churned"]
        matrix = [[0.8, 0.2], [0.0, 1.0]]

        [projection]
        step_nr = 3
        initial = [1000, 0]

        [prices.US]
        Active = 10.0
        Churned = 0.0
    "#;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);

        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_parse_homogeneous_scenario() {
        let config: ScenarioConfig = HOMOGENEOUS.parse().unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(matches!(config.inflow, InflowSection::None));

        let model = config.model().unwrap();
        assert!(matches!(model, TransitionModelEnum::Homogeneous(_)));

        let projection = config.projection_config().unwrap();
        assert_eq!(projection.step_nr(), 3);
        assert_eq!(projection.seed(), Some(7));

        assert_eq!(config.initial().unwrap(), &[1000u64, 0]);
        assert!(config.prices().unwrap().get("US").is_ok());
    }

    #[test]
    fn test_parse_clustered_scheduled_scenario() {
        let toml = r#"
            [chain]
            states = ["Trial", "Paid", "Churned"]

            [[chain.clusters]]
            name = "loyal"
            probability = 0.7
            matrix = [[0.5, 0.5, 0.0], [0.0, 0.95, 0.05], [0.0, 0.0, 1.0]]

            [[chain.clusters]]
            name = "fickle"
            probability = 0.3
            matrix = [[0.4, 0.2, 0.4], [0.0, 0.7, 0.3], [0.0, 0.0, 1.0]]

            [projection]
            step_nr = 120
            initial = [0, 0, 0]
            absorbing_state = "Churned"
            quota_base = "current"

            [inflow]
            mode = "scheduled"
            schedule = [[7, 600.0], [8, 900.0]]
            first_touch = [0.9, 0.1]
        "#;
        let config: ScenarioConfig = toml.parse().unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(matches!(
            config.model().unwrap(),
            TransitionModelEnum::Clustered(_)
        ));
        assert_eq!(
            config.projection_config().unwrap().quota_base(),
            QuotaBase::Current
        );
        assert!(matches!(config.inflow().unwrap(), InflowSampler::Scheduled(_)));
    }

    #[test]
    fn test_quota_inflow_section() {
        let toml = HOMOGENEOUS.replace(
            "[prices.US]",
            "[inflow]\nmode = \"quota\"\nquota = 0.1\nrounding = \"largest_remainder\"\n\n[prices.US]",
        );
        let config: ScenarioConfig = toml.parse().unwrap();
        match config.inflow().unwrap() {
            InflowSampler::Quota(q) => {
                assert_eq!(q.quota(), 0.1);
                assert_eq!(q.rounding(), QuotaRounding::LargestRemainder);
            }
            other => panic!("unexpected sampler {other:?}"),
        }
    }

    #[test]
    fn test_arrivals_follow_inflow_section() {
        let config: ScenarioConfig = HOMOGENEOUS.parse().unwrap();
        assert_eq!(config.arrivals().unwrap(), Arrivals::None);

        let toml = HOMOGENEOUS.replace(
            "[prices.US]",
            "[inflow]\nmode = \"quota\"\nquota = 0.2\n\n[prices.US]",
        );
        let config: ScenarioConfig = toml.parse().unwrap();
        assert!(matches!(config.arrivals().unwrap(), Arrivals::Quota(q) if q.quota() == 0.2));
    }

    #[test]
    fn test_chain_needs_exactly_one_definition() {
        let toml = r#"
            [chain]
            states = ["A", "B"]

            [projection]
            step_nr = 2
            initial = [1, 1]
        "#;
        assert!(matches!(
            toml.parse::<ScenarioConfig>(),
            Err(ConfigError::Scenario(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            "not = [valid".parse::<ScenarioConfig>(),
            Err(ConfigError::FileError(_))
        ));
    }

    #[test]
    fn test_domain_validation_surfaces() {
        let toml = HOMOGENEOUS.replace("[0.8, 0.2]", "[0.8, 0.1]");
        let config: ScenarioConfig = toml.parse().unwrap();
        assert!(matches!(
            config.model(),
            Err(ValidationError::RowNotStochastic { row: 0, .. })
        ));

        let toml = HOMOGENEOUS.replace("initial = [1000, 0]", "initial = [1000]");
        let config: ScenarioConfig = toml.parse().unwrap();
        assert!(config.initial().unwrap_err().is_validation());
    }

    #[test]
    fn test_merge_with_cli() {
        let mut config: ScenarioConfig = HOMOGENEOUS.parse().unwrap();
        let cli = CliArgs {
            seed: Some(99),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.merge_with_cli(&cli).unwrap();
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.log_level, LogLevel::Debug);

        let bad = CliArgs {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(config.merge_with_cli(&bad).is_err());
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed(" 42 ").unwrap(), 42);
        assert!(matches!(parse_seed("-1"), Err(ConfigError::InvalidSeed(_))));
    }
}
