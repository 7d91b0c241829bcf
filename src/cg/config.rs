//! Conjugate gradient configuration.

use crate::config::{defaults, OptimizationConfig};

/// Configuration for [`CgRunner`](super::CgRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct CgConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::SEARCH_MAX_ITERATIONS,
            tolerance: defaults::TOLERANCE,
        }
    }
}

impl CgConfig {
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let d = Self::default();
        Self {
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
        }
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
