//! Gradient descent configuration.

use crate::config::{defaults, OptimizationConfig};

/// Configuration for [`GdRunner`](super::GdRunner).
///
/// # Examples
///
/// ```
/// use u_optflow::gd::GdConfig;
///
/// let config = GdConfig::default()
///     .with_learning_rate(0.1)
///     .with_max_iterations(200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GdConfig {
    /// Iteration budget (recorded steps).
    pub max_iterations: usize,

    /// Fixed step size.
    pub learning_rate: f64,

    /// Convergence threshold on the successive loss delta.
    pub tolerance: f64,
}

impl Default for GdConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::FIRST_ORDER_MAX_ITERATIONS,
            learning_rate: 0.01,
            tolerance: defaults::TOLERANCE,
        }
    }
}

impl GdConfig {
    /// Reads the recognized keys, falling back to defaults.
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let d = Self::default();
        Self {
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            learning_rate: options.initial_learning_rate.unwrap_or(d.learning_rate),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Validates the configuration.
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
        let config = GdConfig::default();
        assert_eq!(config.max_iterations, 1000);
        assert!((config.learning_rate - 0.01).abs() < 1e-15);
        assert!((config.tolerance - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn test_from_options() {
        let options = OptimizationConfig::default()
            .with_learning_rate(0.5)
            .with_max_iterations(7);
        let config = GdConfig::from_options(&options);
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.tolerance, 1e-6);
    }

    #[test]
    fn test_validate() {
        assert!(GdConfig::default().validate().is_ok());
        assert!(GdConfig::default().with_max_iterations(0).validate().is_err());
        assert!(GdConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(GdConfig::default().with_tolerance(-1.0).validate().is_err());
    }
}
