//! GA configuration.

use crate::config::{defaults, OptimizationConfig};

/// Configuration for [`GaRunner`](super::GaRunner).
///
/// # Examples
///
/// ```
/// use u_optflow::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(20)
///     .with_bounds(-5.0, 5.0)
///     .with_seed(42);
/// assert_eq!(config.tournament_size(), 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GaConfig {
    /// Number of generations (one recorded step each).
    pub max_iterations: usize,

    /// Population cardinality.
    pub population_size: usize,

    /// Probability that an individual is mutated.
    pub mutation_rate: f64,

    /// Probability that a consecutive pair is recombined.
    pub crossover_rate: f64,

    /// Tournament size is `population_size / selection_pressure`.
    pub selection_pressure: f64,

    pub lower_bound: f64,
    pub upper_bound: f64,

    /// Convergence threshold on the change of the best fitness.
    pub tolerance: f64,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,

    /// Whether to evaluate the population in parallel using rayon.
    pub parallel: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            max_iterations: defaults::SEARCH_MAX_ITERATIONS,
            population_size: 50,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            selection_pressure: 2.0,
            lower_bound: defaults::LOWER_BOUND,
            upper_bound: defaults::UPPER_BOUND,
            tolerance: defaults::TOLERANCE,
            seed: None,
            parallel: true,
        }
    }
}

impl GaConfig {
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let d = Self::default();
        Self {
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            population_size: options.population_size.unwrap_or(d.population_size),
            mutation_rate: options.mutation_rate.unwrap_or(d.mutation_rate),
            crossover_rate: options.crossover_rate.unwrap_or(d.crossover_rate),
            selection_pressure: options.selection_pressure.unwrap_or(d.selection_pressure),
            lower_bound: options.lower_bound.unwrap_or(d.lower_bound),
            upper_bound: options.upper_bound.unwrap_or(d.upper_bound),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
            seed: options.seed,
            parallel: d.parallel,
        }
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_selection_pressure(mut self, pressure: f64) -> Self {
        self.selection_pressure = pressure;
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

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Members drawn per tournament, without replacement.
    pub fn tournament_size(&self) -> usize {
        let raw = (self.population_size as f64 / self.selection_pressure).floor() as usize;
        raw.clamp(1, self.population_size.max(1))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if self.population_size < 2 {
            return Err(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            ));
        }
        for (name, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{name} must be in [0, 1], got {rate}"));
            }
        }
        if !(self.selection_pressure > 0.0 && self.selection_pressure.is_finite()) {
            return Err(format!(
                "selection_pressure must be positive, got {}",
                self.selection_pressure
            ));
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
