//! Individual state trajectories.
//!
//! One categorical draw per step from the current state's row. Entities of a
//! clustered model stay in the cluster drawn for them at the start.

use churn_core::matrix::TransitionMatrix;
use churn_core::types::LookupError;

use crate::model::TransitionModel;
use crate::rng::ChainRng;

fn draw_from(matrix: &TransitionMatrix, rng: &mut ChainRng, from: usize) -> usize {
    match matrix.row_at(from) {
        Some(row) => rng.categorical(row),
        None => from,
    }
}

/// Draws the state following `current`.
///
/// # Errors
///
/// `LookupError::UnknownState` if `current` is not a state of the model.
///
/// # Examples
///
/// ```
/// use churn_core::matrix::TransitionMatrix;
/// use churn_models::rng::ChainRng;
/// use churn_models::trajectory::next_state;
///
/// let m = TransitionMatrix::new(vec![vec![0.0, 1.0], vec![0.0, 1.0]], ["Active", "Churned"]).unwrap();
/// let mut rng = ChainRng::from_seed(1);
/// assert_eq!(next_state(&m, &mut rng, "Active").unwrap(), "Churned");
/// ```
pub fn next_state<M>(model: &M, rng: &mut ChainRng, current: &str) -> Result<String, LookupError>
where
    M: TransitionModel + ?Sized,
{
    let from = model.states().index_of(current)?;
    let matrix = model.entity_matrix(rng);
    let to = draw_from(matrix, rng, from);
    Ok(matrix.label_of(to).unwrap_or(current).to_string())
}

/// Draws `step_nr` successive states after `start` (the start state itself
/// is not included).
///
/// # Errors
///
/// `LookupError::UnknownState` if `start` is not a state of the model.
pub fn generate_states<M>(
    model: &M,
    rng: &mut ChainRng,
    start: &str,
    step_nr: usize,
) -> Result<Vec<String>, LookupError>
where
    M: TransitionModel + ?Sized,
{
    let mut current = model.states().index_of(start)?;
    let matrix = model.entity_matrix(rng);

    let mut path = Vec::with_capacity(step_nr);
    for _ in 0..step_nr {
        current = draw_from(matrix, rng, current);
        path.push(matrix.label_of(current).unwrap_or(start).to_string());
    }
    Ok(path)
}
