//! SA configuration.

use crate::config::{defaults, OptimizationConfig};

/// Configuration for [`SaRunner`](super::SaRunner).
///
/// # Examples
///
/// ```
/// use u_optflow::sa::SaConfig;
///
/// let config = SaConfig::default()
///     .with_initial_temperature(10.0)
///     .with_cooling_rate(0.99)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SaConfig {
    /// Budget of recorded steps, including the initial point.
    pub max_iterations: usize,

    /// Starting temperature.
    pub initial_temperature: f64,

    /// Geometric cooling factor in `(0, 1)`.
    pub cooling_rate: f64,

    /// The run stops once the temperature falls below this.
    pub min_temperature: f64,

    /// Standard deviation of the neighbor perturbation.
    pub step_sigma: f64,

    /// Convergence threshold on the change of the best loss.
    pub tolerance: f64,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::SEARCH_MAX_ITERATIONS,
            initial_temperature: 1.0,
            cooling_rate: 0.95,
            min_temperature: 1e-6,
            step_sigma: 0.1,
            tolerance: defaults::TOLERANCE,
            seed: None,
        }
    }
}

impl SaConfig {
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let d = Self::default();
        Self {
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            initial_temperature: options.initial_temperature.unwrap_or(d.initial_temperature),
            cooling_rate: options.cooling_rate.unwrap_or(d.cooling_rate),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
            seed: options.seed,
            ..d
        }
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
            return Err(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(format!(
                "cooling_rate must be in (0, 1), got {}",
                self.cooling_rate
            ));
        }
        if !(self.step_sigma > 0.0) {
            return Err(format!("step_sigma must be positive, got {}", self.step_sigma));
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
    fn test_default_config() {
        let config = SaConfig::default();
        assert_eq!(config.max_iterations, 100);
        assert!((config.initial_temperature - 1.0).abs() < 1e-12);
        assert!((config.cooling_rate - 0.95).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_temperature() {
        assert!(SaConfig::default().with_initial_temperature(-1.0).validate().is_err());
        assert!(SaConfig::default().with_initial_temperature(0.0).validate().is_err());
    }

    #[test]
    fn test_validate_bad_cooling() {
        assert!(SaConfig::default().with_cooling_rate(1.0).validate().is_err());
        assert!(SaConfig::default().with_cooling_rate(0.0).validate().is_err());
    }
}
