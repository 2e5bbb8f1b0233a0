//! Entity-level customer simulation.
//!
//! Where the projector moves aggregate counts, [`CustomerSimulation`] moves
//! individual customers. Each customer draws a first state from the
//! first-touch probabilities and then one transition per step. Newcomers join
//! after the step's transitions, so a customer arriving at step `t` has no
//! state before column `t` of the history.

use churn_core::matrix::{TransitionMatrix, DEFAULT_ROW_SUM_TOLERANCE};
use churn_core::types::{ChainError, ValidationError};
use tracing::{debug, info};

use crate::inflow::{InflowSchedule, QuotaInflow};
use crate::model::{TransitionModel, TransitionModelEnum};
use crate::rng::ChainRng;

/// Upper bound on customers created by one simulation, newcomers included.
pub const MAX_CUSTOMERS: u64 = 1_000_000;

/// How many newcomers join after each step.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Arrivals {
    /// Nobody joins.
    #[default]
    None,
    /// `floor(n·q)` newcomers per step, `n` being the initial customer count.
    Quota(QuotaInflow),
    /// Newcomers per step read from an hourly schedule (steps are minutes).
    Scheduled(InflowSchedule),
}

impl Arrivals {
    fn count(&self, step: usize, n_customers: u64) -> Result<u64, ChainError> {
        Ok(match self {
            Arrivals::None => 0,
            Arrivals::Quota(quota) => quota.nominal(n_customers),
            Arrivals::Scheduled(schedule) => schedule.arrivals_for_step(step)?,
        })
    }
}

/// State history of every simulated customer.
///
/// One row per customer in creation order, one column per step (column 0 is
/// the first state of the initial customers). `None` marks steps before a
/// customer arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CustomerHistory {
    states: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl CustomerHistory {
    /// State labels of the chain.
    #[inline]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Number of customers.
    #[inline]
    pub fn n_customers(&self) -> usize {
        self.rows.len()
    }

    /// Number of history columns (`step_nr + 1`).
    pub fn n_steps(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// All rows.
    #[inline]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// History of customer `id`.
    #[inline]
    pub fn row(&self, id: usize) -> Option<&[Option<String>]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    /// Step at which customer `id` first has a state.
    pub fn arrival_step(&self, id: usize) -> Option<usize> {
        self.row(id)?.iter().position(Option::is_some)
    }

    /// Customers per state at column `t`, in state order.
    pub fn occupancy(&self, t: usize) -> Vec<u64> {
        let mut counts = vec![0u64; self.states.len()];
        for state in self.rows.iter().filter_map(|r| r.get(t)?.as_deref()) {
            if let Some(i) = self.states.iter().position(|s| s == state) {
                counts[i] += 1;
            }
        }
        counts
    }
}

/// Simulates individual customers moving through a chain.
///
/// # Examples
///
/// ```
/// use churn_core::matrix::TransitionMatrix;
/// use churn_models::inflow::QuotaInflow;
/// use churn_models::rng::ChainRng;
/// use churn_models::simulation::{Arrivals, CustomerSimulation};
///
/// let m = TransitionMatrix::new(
///     vec![vec![0.9, 0.1], vec![0.0, 1.0]],
///     ["Active", "Churned"],
/// )
/// .unwrap();
/// let sim = CustomerSimulation::new(m, vec![1.0, 0.0], 10, 5)
///     .unwrap()
///     .with_arrivals(Arrivals::Quota(QuotaInflow::new(0.2).unwrap()));
///
/// let history = sim.run(&mut ChainRng::from_seed(3)).unwrap();
/// assert_eq!(history.n_customers(), 10 + 5 * 2);
/// assert_eq!(history.n_steps(), 6);
/// assert_eq!(history.arrival_step(10), Some(1));
/// ```
#[derive(Clone, Debug)]
pub struct CustomerSimulation {
    model: TransitionModelEnum,
    first_touch: Vec<f64>,
    n_customers: u64,
    step_nr: usize,
    arrivals: Arrivals,
}

impl CustomerSimulation {
    /// Creates a simulation of `n_customers` initial customers over
    /// `step_nr` steps, without newcomers.
    ///
    /// `first_touch` gives the probability of each state (in model order)
    /// being a customer's first state.
    ///
    /// # Errors
    ///
    /// - `InvalidStepCount` if `step_nr` is outside `[1, MAX_STEPS]`
    /// - `DimensionMismatch` if `first_touch` does not cover every state
    /// - `InvalidParameter` if `first_touch` is not a probability vector
    pub fn new(
        model: impl Into<TransitionModelEnum>,
        first_touch: Vec<f64>,
        n_customers: u64,
        step_nr: usize,
    ) -> Result<Self, ValidationError> {
        let model = model.into();
        if step_nr == 0 || step_nr > churn_core::MAX_STEPS {
            return Err(ValidationError::InvalidStepCount(step_nr));
        }
        if first_touch.len() != model.dim() {
            return Err(ValidationError::DimensionMismatch {
                what: "first-touch probabilities",
                expected: model.dim(),
                got: first_touch.len(),
            });
        }
        if first_touch.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ValidationError::InvalidParameter {
                name: "first_touch",
                value: "probabilities must be non-negative and finite".to_string(),
            });
        }
        let sum: f64 = first_touch.iter().sum();
        if (sum - 1.0).abs() > DEFAULT_ROW_SUM_TOLERANCE {
            return Err(ValidationError::InvalidParameter {
                name: "first_touch",
                value: format!("sums to {sum}, expected 1.0"),
            });
        }
        Ok(Self {
            model,
            first_touch,
            n_customers,
            step_nr,
            arrivals: Arrivals::None,
        })
    }

    /// Sets the newcomer policy.
    pub fn with_arrivals(mut self, arrivals: Arrivals) -> Self {
        self.arrivals = arrivals;
        self
    }

    /// Transition model.
    #[inline]
    pub fn model(&self) -> &TransitionModelEnum {
        &self.model
    }

    /// Number of simulated steps.
    #[inline]
    pub fn step_nr(&self) -> usize {
        self.step_nr
    }

    /// Runs the simulation.
    ///
    /// Newcomer counts for every step are resolved before any customer is
    /// drawn, so a missing schedule bucket fails without partial output.
    ///
    /// # Errors
    ///
    /// - `LookupError::MissingBucket` for a step outside the schedule
    /// - `InvalidParameter { name: "customers", .. }` if more than
    ///   [`MAX_CUSTOMERS`] customers would be created
    pub fn run(&self, rng: &mut ChainRng) -> Result<CustomerHistory, ChainError> {
        let newcomers = (1..=self.step_nr)
            .map(|step| self.arrivals.count(step, self.n_customers))
            .collect::<Result<Vec<_>, _>>()?;
        let created = newcomers
            .iter()
            .try_fold(self.n_customers, |acc, &n| acc.checked_add(n))
            .filter(|&n| n <= MAX_CUSTOMERS)
            .ok_or_else(|| ValidationError::InvalidParameter {
                name: "customers",
                value: format!("simulation would create more than {MAX_CUSTOMERS} customers"),
            })?;

        info!(
            model = self.model.model_name(),
            initial = self.n_customers,
            created,
            step_nr = self.step_nr,
            "starting customer simulation"
        );

        let mut customers: Vec<Customer<'_>> = Vec::with_capacity(created as usize);
        for _ in 0..self.n_customers {
            customers.push(self.spawn(rng, 0));
        }
        for (step, &count) in (1..=self.step_nr).zip(&newcomers) {
            for customer in &mut customers {
                customer.transition(rng);
            }
            for _ in 0..count {
                customers.push(self.spawn(rng, step));
            }
            debug!(step, newcomers = count, customers = customers.len(), "simulated step");
        }

        let states = self.model.states().labels().to_vec();
        let rows = customers
            .into_iter()
            .map(|c| {
                c.history
                    .into_iter()
                    .map(|s| s.map(|i| states[i].clone()))
                    .collect()
            })
            .collect();
        Ok(CustomerHistory { states, rows })
    }

    fn spawn<'a>(&'a self, rng: &mut ChainRng, arrival: usize) -> Customer<'a> {
        let matrix = self.model.entity_matrix(rng);
        let state = rng.categorical(&self.first_touch);
        let mut history = Vec::with_capacity(self.step_nr + 1);
        history.resize(arrival, None);
        history.push(Some(state));
        Customer {
            matrix,
            state,
            history,
        }
    }
}

struct Customer<'a> {
    matrix: &'a TransitionMatrix,
    state: usize,
    history: Vec<Option<usize>>,
}

impl Customer<'_> {
    fn transition(&mut self, rng: &mut ChainRng) {
        if let Some(row) = self.matrix.row_at(self.state) {
            self.state = rng.categorical(row);
        }
        self.history.push(Some(self.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cluster;
    use churn_core::types::LookupError;

    fn funnel() -> TransitionMatrix {
        TransitionMatrix::new(
            vec![
                vec![0.6, 0.3, 0.1],
                vec![0.0, 0.9, 0.1],
                vec![0.0, 0.0, 1.0],
            ],
            ["Trial", "Paid", "Churned"],
        )
        .unwrap()
    }

    #[test]
    fn test_history_shape_without_newcomers() {
        let sim = CustomerSimulation::new(funnel(), vec![0.5, 0.5, 0.0], 20, 8).unwrap();
        let history = sim.run(&mut ChainRng::from_seed(1)).unwrap();

        assert_eq!(history.n_customers(), 20);
        assert_eq!(history.n_steps(), 9);
        assert!(history.rows().iter().all(|r| r.len() == 9 && r.iter().all(Option::is_some)));
        assert_eq!(history.occupancy(0)[2], 0);
        for t in 0..9 {
            assert_eq!(history.occupancy(t).iter().sum::<u64>(), 20);
        }
    }

    #[test]
    fn test_newcomers_are_padded() {
        let sim = CustomerSimulation::new(funnel(), vec![1.0, 0.0, 0.0], 10, 4)
            .unwrap()
            .with_arrivals(Arrivals::Quota(QuotaInflow::new(0.3).unwrap()));
        let history = sim.run(&mut ChainRng::from_seed(2)).unwrap();

        assert_eq!(history.n_customers(), 10 + 4 * 3);
        for id in 0..history.n_customers() {
            let row = history.row(id).unwrap();
            assert_eq!(row.len(), 5);
            let arrival = history.arrival_step(id).unwrap();
            let expected = if id < 10 { 0 } else { (id - 10) / 3 + 1 };
            assert_eq!(arrival, expected);
            assert!(row[..arrival].iter().all(Option::is_none));
            assert_eq!(row[arrival].as_deref(), Some("Trial"));
            assert!(row[arrival..].iter().all(Option::is_some));
        }
    }

    #[test]
    fn test_absorbed_customers_stay() {
        let sim = CustomerSimulation::new(funnel(), vec![0.0, 1.0, 0.0], 50, 30).unwrap();
        let history = sim.run(&mut ChainRng::from_seed(3)).unwrap();
        for row in history.rows() {
            if let Some(i) = row.iter().position(|s| s.as_deref() == Some("Churned")) {
                assert!(row[i..].iter().all(|s| s.as_deref() == Some("Churned")));
            }
        }
    }

    #[test]
    fn test_same_seed_same_history() {
        let sim = CustomerSimulation::new(funnel(), vec![0.7, 0.3, 0.0], 15, 12)
            .unwrap()
            .with_arrivals(Arrivals::Quota(QuotaInflow::new(0.2).unwrap()));
        let a = sim.run(&mut ChainRng::from_seed(11)).unwrap();
        let b = sim.run(&mut ChainRng::from_seed(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_scheduled_arrivals() {
        let schedule = InflowSchedule::new([(7, 120.0), (8, 240.0)]).unwrap();
        let sim = CustomerSimulation::new(funnel(), vec![1.0, 0.0, 0.0], 0, 61)
            .unwrap()
            .with_arrivals(Arrivals::Scheduled(schedule));
        let history = sim.run(&mut ChainRng::from_seed(4)).unwrap();

        // Steps 1..=59 bring 2 each, steps 60 and 61 bring 4 each.
        assert_eq!(history.n_customers(), 59 * 2 + 2 * 4);
        assert_eq!(history.arrival_step(0), Some(1));
        assert_eq!(history.arrival_step(history.n_customers() - 1), Some(61));
    }

    #[test]
    fn test_missing_bucket_fails_before_drawing() {
        let schedule = InflowSchedule::new([(7, 60.0)]).unwrap();
        let sim = CustomerSimulation::new(funnel(), vec![1.0, 0.0, 0.0], 5, 90)
            .unwrap()
            .with_arrivals(Arrivals::Scheduled(schedule));
        let err = sim.run(&mut ChainRng::from_seed(4)).unwrap_err();
        assert_eq!(
            err,
            ChainError::Lookup(LookupError::MissingBucket { step: 60, bucket: 8 })
        );
    }

    #[test]
    fn test_clustered_customers_keep_their_matrix() {
        let stay = TransitionMatrix::new(
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
            ["Trial", "Paid", "Churned"],
        )
        .unwrap();
        let model = TransitionModelEnum::clustered(vec![Cluster::new("frozen", 1.0, stay)]).unwrap();
        let sim = CustomerSimulation::new(model, vec![0.5, 0.5, 0.0], 30, 10).unwrap();
        let history = sim.run(&mut ChainRng::from_seed(6)).unwrap();
        for row in history.rows() {
            assert!(row.iter().all(|s| s == &row[0]));
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            CustomerSimulation::new(funnel(), vec![1.0, 0.0, 0.0], 1, 0),
            Err(ValidationError::InvalidStepCount(0))
        ));
        assert!(matches!(
            CustomerSimulation::new(funnel(), vec![1.0, 0.0], 1, 3),
            Err(ValidationError::DimensionMismatch { .. })
        ));
        assert!(CustomerSimulation::new(funnel(), vec![0.5, 0.4, 0.0], 1, 3).is_err());
        assert!(CustomerSimulation::new(funnel(), vec![1.5, -0.5, 0.0], 1, 3).is_err());
    }

    #[test]
    fn test_customer_cap() {
        let sim = CustomerSimulation::new(funnel(), vec![1.0, 0.0, 0.0], MAX_CUSTOMERS, 2)
            .unwrap()
            .with_arrivals(Arrivals::Quota(QuotaInflow::new(0.5).unwrap()));
        let err = sim.run(&mut ChainRng::from_seed(1)).unwrap_err();
        assert!(err.is_validation());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_history_json_uses_null_padding() {
        let sim = CustomerSimulation::new(funnel(), vec![1.0, 0.0, 0.0], 1, 1)
            .unwrap()
            .with_arrivals(Arrivals::Quota(QuotaInflow::new(1.0).unwrap()));
        let history = sim.run(&mut ChainRng::from_seed(1)).unwrap();
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["rows"][1][0], serde_json::Value::Null);
        assert_eq!(json["rows"][1][1], "Trial");
    }
}
