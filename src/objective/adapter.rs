//! Sign-normalizing objective adapter.

use super::diff::{Differentiator, FiniteDifference};
use super::types::{Direction, Objective, ObjectiveResult};
use crate::error::ObjectiveError;
use std::fmt;
use std::sync::Arc;

/// Wraps a collaborator objective so that every algorithm minimizes.
///
/// The adapter is cheap to clone (shared handles) and `Send + Sync`, so
/// independent runs may evaluate the same objective concurrently.
///
/// # Examples
///
/// ```
/// use u_optflow::objective::{ObjectiveAdapter, ScalarFn};
///
/// let profit = ObjectiveAdapter::maximize(ScalarFn(|x: &[f64]| -(x[0] - 3.0).powi(2)));
/// let r = profit.evaluate_value_only(&[1.0]).unwrap();
/// assert_eq!(r.value, 4.0);
/// assert!(r.gradient.is_none());
/// ```
#[derive(Clone)]
pub struct ObjectiveAdapter {
    objective: Arc<dyn Objective>,
    direction: Direction,
    differentiator: Arc<dyn Differentiator>,
}

impl fmt::Debug for ObjectiveAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectiveAdapter")
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

impl ObjectiveAdapter {
    /// Creates an adapter using central finite differences for objectives
    /// that do not return gradients.
    pub fn new(objective: Arc<dyn Objective>, direction: Direction) -> Self {
        Self {
            objective,
            direction,
            differentiator: Arc::new(FiniteDifference::default()),
        }
    }

    pub fn minimize(objective: impl Objective + 'static) -> Self {
        Self::new(Arc::new(objective), Direction::Minimize)
    }

    pub fn maximize(objective: impl Objective + 'static) -> Self {
        Self::new(Arc::new(objective), Direction::Maximize)
    }

    /// Replaces the differentiation capability.
    pub fn with_differentiator(mut self, differentiator: Arc<dyn Differentiator>) -> Self {
        self.differentiator = differentiator;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Evaluates value and gradient, differentiating when the objective
    /// returns no gradient. The returned gradient is always present.
    pub fn evaluate_with_gradient(&self, x: &[f64]) -> Result<ObjectiveResult, ObjectiveError> {
        let (value, gradient) = self.objective.evaluate(x)?.into_parts(x.len())?;
        let gradient = match gradient {
            Some(g) => g,
            None => {
                let raw = |p: &[f64]| -> Result<f64, ObjectiveError> {
                    Ok(self.objective.evaluate(p)?.value())
                };
                let g = self.differentiator.differentiate(&raw, x)?;
                if g.len() != x.len() {
                    return Err(ObjectiveError::GradientLength {
                        expected: x.len(),
                        found: g.len(),
                    });
                }
                g
            }
        };
        let sign = self.direction.sign();
        Ok(ObjectiveResult {
            value: normalize(sign * value),
            gradient: Some(gradient.into_iter().map(|g| sign * g).collect()),
        })
    }

    /// Evaluates the value only. Never invokes differentiation and never
    /// attaches a gradient.
    pub fn evaluate_value_only(&self, x: &[f64]) -> Result<ObjectiveResult, ObjectiveError> {
        let (value, _) = self.objective.evaluate(x)?.into_parts(x.len())?;
        Ok(ObjectiveResult {
            value: normalize(self.direction.sign() * value),
            gradient: None,
        })
    }

    /// Sign-normalized loss at `x`.
    pub fn loss(&self, x: &[f64]) -> Result<f64, ObjectiveError> {
        self.evaluate_value_only(x).map(|r| r.value)
    }

    /// Sign-normalized loss and gradient at `x`.
    pub fn loss_and_gradient(&self, x: &[f64]) -> Result<(f64, Vec<f64>), ObjectiveError> {
        self.evaluate_with_gradient(x)?.into_value_and_gradient()
    }
}

/// Non-finite losses are treated as infinitely bad.
fn normalize(loss: f64) -> f64 {
    if loss.is_finite() {
        loss
    } else {
        f64::INFINITY
    }
}
