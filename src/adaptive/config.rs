//! Stepper and scheduler configuration.

use crate::config::{defaults, OptimizationConfig};
use log::warn;

/// Update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stepper {
    Momentum { momentum: f64 },
    RmsProp { alpha: f64, epsilon: f64 },
    Adagrad { epsilon: f64 },
}

impl Stepper {
    /// Registry name of the rule.
    pub fn name(&self) -> &'static str {
        match self {
            Stepper::Momentum { .. } => "momentum",
            Stepper::RmsProp { .. } => "rmsprop",
            Stepper::Adagrad { .. } => "adagrad",
        }
    }
}

/// Learning-rate schedule, stepped once per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scheduler {
    #[default]
    Constant,
    /// Cosine annealing to zero over `max_iterations`.
    Cosine,
    /// Multiply by `gamma` every `step_size` iterations.
    Step { step_size: usize, gamma: f64 },
    /// Multiply by `factor` after more than `patience` iterations without
    /// relative improvement.
    Plateau { factor: f64, patience: usize },
}

impl Scheduler {
    /// Parses the `scheduler` key. Unknown names fall back to a constant
    /// rate with a warning.
    pub fn from_options(options: &OptimizationConfig) -> Self {
        match options.scheduler.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("none") => Scheduler::Constant,
            Some("cosine") => Scheduler::Cosine,
            Some("step") => Scheduler::Step {
                step_size: options.step_size.unwrap_or(30),
                gamma: options.gamma.unwrap_or(0.1),
            },
            Some("plateau") => Scheduler::Plateau {
                factor: options.factor.unwrap_or(0.1),
                patience: options.patience.unwrap_or(10),
            },
            Some(other) => {
                warn!("unknown scheduler `{other}`, using a constant learning rate");
                Scheduler::Constant
            }
        }
    }
}

/// Configuration for [`AdaptiveRunner`](super::AdaptiveRunner).
///
/// # Examples
///
/// ```
/// use u_optflow::adaptive::{AdaptiveConfig, Scheduler, Stepper};
///
/// let config = AdaptiveConfig::new(Stepper::Momentum { momentum: 0.9 })
///     .with_learning_rate(0.05)
///     .with_scheduler(Scheduler::Step { step_size: 10, gamma: 0.5 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveConfig {
    pub stepper: Stepper,
    pub scheduler: Scheduler,
    pub max_iterations: usize,
    pub learning_rate: f64,
    pub tolerance: f64,
}

impl AdaptiveConfig {
    pub fn new(stepper: Stepper) -> Self {
        Self {
            stepper,
            scheduler: Scheduler::Constant,
            max_iterations: defaults::FIRST_ORDER_MAX_ITERATIONS,
            learning_rate: 0.01,
            tolerance: defaults::TOLERANCE,
        }
    }

    fn with_common(stepper: Stepper, options: &OptimizationConfig) -> Self {
        let d = Self::new(stepper);
        Self {
            scheduler: Scheduler::from_options(options),
            max_iterations: options.max_iterations.unwrap_or(d.max_iterations),
            learning_rate: options.initial_learning_rate.unwrap_or(d.learning_rate),
            tolerance: options.tolerance.unwrap_or(d.tolerance),
            ..d
        }
    }

    /// Momentum SGD from the recognized keys (`momentum`, default 0.9).
    pub fn momentum(options: &OptimizationConfig) -> Self {
        let stepper = Stepper::Momentum {
            momentum: options.momentum.unwrap_or(0.9),
        };
        Self::with_common(stepper, options)
    }

    /// RMSprop from the recognized keys (`alpha` 0.99, `epsilon` 1e-8).
    pub fn rmsprop(options: &OptimizationConfig) -> Self {
        let stepper = Stepper::RmsProp {
            alpha: options.alpha.unwrap_or(0.99),
            epsilon: options.epsilon.unwrap_or(1e-8),
        };
        Self::with_common(stepper, options)
    }

    /// Adagrad from the recognized keys (`epsilon` 1e-10).
    pub fn adagrad(options: &OptimizationConfig) -> Self {
        let stepper = Stepper::Adagrad {
            epsilon: options.epsilon.unwrap_or(1e-10),
        };
        Self::with_common(stepper, options)
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
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
        match self.stepper {
            Stepper::Momentum { momentum } => {
                if !(0.0..1.0).contains(&momentum) {
                    return Err(format!("momentum must be in [0, 1), got {momentum}"));
                }
            }
            Stepper::RmsProp { alpha, epsilon } => {
                if !(0.0..1.0).contains(&alpha) {
                    return Err(format!("alpha must be in [0, 1), got {alpha}"));
                }
                if !(epsilon > 0.0) {
                    return Err(format!("epsilon must be positive, got {epsilon}"));
                }
            }
            Stepper::Adagrad { epsilon } => {
                if !(epsilon > 0.0) {
                    return Err(format!("epsilon must be positive, got {epsilon}"));
                }
            }
        }
        match self.scheduler {
            Scheduler::Step { step_size, gamma } => {
                if step_size == 0 {
                    return Err("step_size must be at least 1".into());
                }
                if !(gamma > 0.0) {
                    return Err(format!("gamma must be positive, got {gamma}"));
                }
            }
            Scheduler::Plateau { factor, .. } => {
                if !(factor > 0.0 && factor < 1.0) {
                    return Err(format!("factor must be in (0, 1), got {factor}"));
                }
            }
            Scheduler::Constant | Scheduler::Cosine => {}
        }
        Ok(())
    }
}
