//! PSO configuration.

use crate::config::{defaults, OptimizationConfig};

/// Configuration for [`PsoRunner`](super::PsoRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct PsoConfig {
    pub max_iterations: usize,
    pub swarm_size: usize,

    /// Inertia weight `w`.
    pub inertia_weight: f64,

    /// Pull toward each particle's personal best (`c1`).
    pub cognitive_coef: f64,

    /// Pull toward the swarm's global best (`c2`).
    pub social_coef: f64,

    pub lower_bound: f64,
    pub upper_bound: f64,
    pub tolerance: f64,
    pub seed: Option<u64>,

    /// Whether to evaluate the swarm in parallel using rayon.
    pub parallel: bool,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::SEARCH_MAX_ITERATIONS,
            swarm_size: 30,
            inertia_weight: 0.7,
            cognitive_coef: 1.5,
            social_coef: 1.5,
            lower_bound: defaults::LOWER_BOUND,
            upper_bound: defaults::UPPER_BOUND,
            tolerance: defaults::TOLERANCE,
            seed: None,
            parallel: true,
        }
    }
}

impl PsoConfig {
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let d = Self::default();
        Self {
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            swarm_size: options.swarm_size.unwrap_or(d.swarm_size),
            inertia_weight: options.inertia_weight.unwrap_or(d.inertia_weight),
            cognitive_coef: options.cognitive_coef.unwrap_or(d.cognitive_coef),
            social_coef: options.social_coef.unwrap_or(d.social_coef),
            lower_bound: options.lower_bound.unwrap_or(d.lower_bound),
            upper_bound: options.upper_bound.unwrap_or(d.upper_bound),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
            seed: options.seed,
            parallel: d.parallel,
        }
    }

    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = n;
        self
    }

    pub fn with_coefficients(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia_weight = inertia;
        self.cognitive_coef = cognitive;
        self.social_coef = social;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Largest velocity component magnitude.
    pub fn max_velocity(&self) -> f64 {
        0.1 * (self.upper_bound - self.lower_bound)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if self.swarm_size == 0 {
            return Err("swarm_size must be at least 1".into());
        }
        for (name, coef) in [
            ("inertia_weight", self.inertia_weight),
            ("cognitive_coef", self.cognitive_coef),
            ("social_coef", self.social_coef),
        ] {
            if !(coef >= 0.0 && coef.is_finite()) {
                return Err(format!("{name} must be non-negative, got {coef}"));
            }
        }
        if !(self.lower_bound < self.upper_bound)
            || !self.lower_bound.is_finite()
            || !self.upper_bound.is_finite()
            || !(self.upper_bound - self.lower_bound).is_finite()
        {
            return Err(format!(
                "bounds must be finite with lower < upper and a finite span, got [{}, {}]",
                self.lower_bound, self.upper_bound
            ));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(format!("tolerance must be non-negative, got {}", self.tolerance));
        }
        Ok(())
    }
}
