//! BFGS configuration.

use crate::config::{defaults, OptimizationConfig};

/// Configuration for [`BfgsRunner`](super::BfgsRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct BfgsConfig {
    /// Budget of recorded steps, including the initial point.
    pub max_iterations: usize,

    /// Threshold for both the gradient norm and the loss delta.
    pub tolerance: f64,

    /// Minimum `yᵀs` for the inverse-Hessian update.
    pub curvature_threshold: f64,
}

impl Default for BfgsConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::SEARCH_MAX_ITERATIONS,
            tolerance: defaults::TOLERANCE,
            curvature_threshold: 1e-10,
        }
    }
}

impl BfgsConfig {
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let d = Self::default();
        Self {
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
            ..d
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(format!("tolerance must be non-negative, got {}", self.tolerance));
        }
        Ok(())
    }
}
