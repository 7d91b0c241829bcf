//! Backtracking line search with the Armijo condition.

use crate::error::ObjectiveError;
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use log::debug;

/// Sufficient-decrease constant.
pub const ARMIJO_C1: f64 = 1e-4;

/// Step sizes below this end the search.
pub const MIN_STEP: f64 = 1e-10;

/// Accepted step of a line search.
#[derive(Debug, Clone)]
pub struct LineSearchStep {
    pub alpha: f64,
    pub point: Vec<f64>,
    pub loss: f64,
    /// The step collapsed below [`MIN_STEP`] without satisfying Armijo.
    pub underflow: bool,
}

/// Searches along `direction` from `x`, starting at `alpha = 1` and halving
/// until `f(x + αd) <= f(x) + c1·α·slope`, where `slope = ∇f(x)ᵀd`.
///
/// An infinite trial loss always fails the condition. If the step falls
/// below [`MIN_STEP`] the last (halved) step is taken anyway.
pub fn backtracking(
    objective: &ObjectiveAdapter,
    x: &[f64],
    loss: f64,
    slope: f64,
    direction: &[f64],
) -> Result<LineSearchStep, ObjectiveError> {
    let mut alpha = 1.0;
    loop {
        let point = linalg::step(x, alpha, direction);
        let trial = objective.loss(&point)?;
        if trial <= loss + ARMIJO_C1 * alpha * slope {
            return Ok(LineSearchStep {
                alpha,
                point,
                loss: trial,
                underflow: false,
            });
        }

        alpha *= 0.5;
        if alpha < MIN_STEP {
            debug!("line search underflow (alpha = {alpha:e}), taking the step anyway");
            let point = linalg::step(x, alpha, direction);
            let loss = objective.loss(&point)?;
            return Ok(LineSearchStep {
                alpha,
                point,
                loss,
                underflow: true,
            });
        }
    }
}
