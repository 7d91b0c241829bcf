//! Differentiation capability.
//!
//! The engine never computes gradients itself. When an objective returns no
//! gradient, the adapter asks its injected [`Differentiator`]. The
//! capability is resolved once by the caller and passed in explicitly.

use crate::error::ObjectiveError;

/// Computes the gradient of a scalar function at a point.
pub trait Differentiator: Send + Sync {
    /// Returns `∇f(x)` for the raw (unsigned) objective value `f`.
    fn differentiate(
        &self,
        f: &dyn Fn(&[f64]) -> Result<f64, ObjectiveError>,
        x: &[f64],
    ) -> Result<Vec<f64>, ObjectiveError>;
}

/// Central finite differences with a relative step.
///
/// For coordinate `i` the step is `h = step * max(1, |x_i|)` and the
/// derivative is `(f(x + h e_i) - f(x - h e_i)) / 2h`. Costs `2n`
/// evaluations per gradient.
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifference {
    pub step: f64,
}

impl Default for FiniteDifference {
    fn default() -> Self {
        Self { step: 1e-6 }
    }
}

impl Differentiator for FiniteDifference {
    fn differentiate(
        &self,
        f: &dyn Fn(&[f64]) -> Result<f64, ObjectiveError>,
        x: &[f64],
    ) -> Result<Vec<f64>, ObjectiveError> {
        let mut shifted = x.to_vec();
        let mut gradient = Vec::with_capacity(x.len());
        for i in 0..x.len() {
            let h = self.step * x[i].abs().max(1.0);
            shifted[i] = x[i] + h;
            let forward = f(&shifted)?;
            shifted[i] = x[i] - h;
            let backward = f(&shifted)?;
            shifted[i] = x[i];
            gradient.push((forward - backward) / (2.0 * h));
        }
        Ok(gradient)
    }
}

/// Refuses to differentiate; objectives must supply their own gradients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDifferentiation;

impl Differentiator for NoDifferentiation {
    fn differentiate(
        &self,
        _f: &dyn Fn(&[f64]) -> Result<f64, ObjectiveError>,
        _x: &[f64],
    ) -> Result<Vec<f64>, ObjectiveError> {
        Err(ObjectiveError::Malformed(
            "objective returned no gradient and differentiation is disabled".into(),
        ))
    }
}
