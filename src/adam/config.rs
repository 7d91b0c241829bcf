//! Adam configuration.

use crate::config::{defaults, OptimizationConfig};

/// Configuration for [`AdamRunner`](super::AdamRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct AdamConfig {
    pub max_iterations: usize,
    pub learning_rate: f64,
    pub tolerance: f64,

    /// First-moment decay in `[0, 1)`.
    pub beta1: f64,

    /// Second-moment decay in `[0, 1)`.
    pub beta2: f64,

    /// Denominator floor.
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::FIRST_ORDER_MAX_ITERATIONS,
            learning_rate: 0.001,
            tolerance: defaults::TOLERANCE,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamConfig {
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let d = Self::default();
        Self {
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            learning_rate: options.initial_learning_rate.unwrap_or(d.learning_rate),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
            beta1: options.beta1.unwrap_or(d.beta1),
            beta2: options.beta2.unwrap_or(d.beta2),
            epsilon: options.epsilon.unwrap_or(d.epsilon),
        }
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(format!(
                "initial_learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(format!("{name} must be in [0, 1), got {beta}"));
            }
        }
        if !(self.epsilon > 0.0) {
            return Err(format!("epsilon must be positive, got {}", self.epsilon));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(format!("tolerance must be non-negative, got {}", self.tolerance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdamConfig::default();
        assert!((config.learning_rate - 0.001).abs() < 1e-15);
        assert_eq!((config.beta1, config.beta2), (0.9, 0.999));
        assert_eq!(config.epsilon, 1e-8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_betas() {
        assert!(AdamConfig::default().with_betas(1.0, 0.999).validate().is_err());
        assert!(AdamConfig::default().with_betas(0.9, -0.1).validate().is_err());
        assert!(AdamConfig::default().with_betas(0.0, 0.0).validate().is_ok());
    }
}
