//! Sequential hand-off between methods.

use crate::config::{defaults, OptimizationConfig};
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::objective::ObjectiveAdapter;
use crate::registry::MethodRegistry;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Number of trailing losses inspected by the early-stop rule.
const EARLY_STOP_WINDOW: usize = 10;

/// Configuration for [`HybridRunner`].
///
/// # Examples
///
/// ```
/// use u_optflow::composite::HybridConfig;
///
/// let config = HybridConfig::new(["sgd", "bfgs"])
///     .with_max_iterations(100)
///     .with_weight("bfgs", 0.3);
/// assert_eq!(config.budget("sgd"), 50);
/// assert_eq!(config.budget("bfgs"), 30);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HybridConfig {
    /// Methods in execution order.
    pub methods: Vec<String>,

    /// Total iteration budget shared by all stages.
    pub max_iterations: usize,

    /// Budget fraction per method name; missing entries get `1 / len`.
    pub method_weights: BTreeMap<String, f64>,

    /// Relative improvement below which the chain stops after a
    /// converged stage.
    pub switch_threshold: f64,
}

impl HybridConfig {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
            max_iterations: defaults::FIRST_ORDER_MAX_ITERATIONS,
            method_weights: BTreeMap::new(),
            switch_threshold: defaults::SWITCH_THRESHOLD,
        }
    }

    /// Chain `primary_method` followed by `secondary_methods`.
    pub fn from_options(options: &OptimizationConfig) -> Self {
        let methods = std::iter::once(options.primary_method_or_default().to_string())
            .chain(options.secondary_methods.iter().cloned());
        let mut config = Self::new(methods);
        config.max_iterations = options
            .max_iterations
            .unwrap_or(defaults::FIRST_ORDER_MAX_ITERATIONS);
        config.method_weights = options.hybrid_config.method_weights.clone();
        config.switch_threshold = options
            .hybrid_config
            .switch_threshold
            .unwrap_or(defaults::SWITCH_THRESHOLD);
        config
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_weight(mut self, method: impl Into<String>, weight: f64) -> Self {
        self.method_weights.insert(method.into(), weight);
        self
    }

    pub fn with_switch_threshold(mut self, threshold: f64) -> Self {
        self.switch_threshold = threshold;
        self
    }

    /// Iterations granted to `method`: `floor(max_iterations · weight)`.
    ///
    /// The runner caps each stage at what earlier stages left of
    /// `max_iterations`, so weights summing above 1 favour early stages.
    pub fn budget(&self, method: &str) -> usize {
        let weight = self
            .method_weights
            .get(method)
            .copied()
            .unwrap_or(1.0 / self.methods.len().max(1) as f64);
        (self.max_iterations as f64 * weight).floor() as usize
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.methods.is_empty() {
            return Err("hybrid chain needs at least one method".into());
        }
        for (method, &weight) in &self.method_weights {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(format!("weight of `{method}` must be non-negative, got {weight}"));
            }
        }
        if self.switch_threshold.is_nan() || self.switch_threshold < 0.0 {
            return Err(format!(
                "switch_threshold must be non-negative, got {}",
                self.switch_threshold
            ));
        }
        Ok(())
    }
}

/// Runs a hybrid chain on a parent context.
///
/// Each stage runs on a fresh sub-context `"{parent_id}_{method}"` that
/// shares the parent's cancellation flag and deadline. Its steps are
/// appended to the parent with continuous iteration numbers, so the parent
/// best is the minimum over all stages.
pub struct HybridRunner;

impl HybridRunner {
    pub const NAME: &'static str = "hybrid";

    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = HybridConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &HybridConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut current = ctx.current_parameters().to_vec();
        for method in &config.methods {
            if ctx.should_stop() {
                return Self::finish(ctx, current, TerminationReason::Cancelled);
            }

            let remaining = config.max_iterations.saturating_sub(ctx.steps().len());
            let budget = config.budget(method).min(remaining);
            if budget == 0 {
                warn!("hybrid {}: skipping `{method}`, no iteration budget left", ctx.id());
                continue;
            }

            let mut options = ctx.config().clone();
            options.primary_method = Some(method.clone());
            options.max_iterations = Some(budget);
            let mut stage = RunContext::new(format!("{}_{method}", ctx.id()), current.clone(), options)
                .with_control(ctx.control().clone());

            let algorithm = MethodRegistry::get(method);
            let stage_result = algorithm(&mut stage, objective)?;
            debug!(
                "hybrid {}: `{method}` finished ({:?}) after {} steps, loss {}",
                ctx.id(),
                stage_result.termination_reason,
                stage_result.iterations,
                stage_result.final_loss
            );

            for step in stage.steps() {
                let mut step = step.clone();
                step.iteration = ctx.steps().len();
                ctx.append_step(step)?;
            }
            current = stage.current_parameters().to_vec();

            match stage.termination_reason() {
                Some(TerminationReason::Cancelled) => {
                    return Self::finish(ctx, current, TerminationReason::Cancelled);
                }
                Some(TerminationReason::Converged) if ctx.loss_history().len() > 2 => {
                    let improvement = recent_relative_improvement(ctx.loss_history());
                    if improvement < config.switch_threshold {
                        info!(
                            "hybrid {}: stopping after `{method}`, relative improvement {improvement:.3e} below {}",
                            ctx.id(),
                            config.switch_threshold
                        );
                        break;
                    }
                }
                _ => {}
            }
        }

        Self::finish(ctx, current, TerminationReason::HybridCompleted)
    }

    fn finish(
        ctx: &mut RunContext,
        fallback: Vec<f64>,
        reason: TerminationReason,
    ) -> OptResult<RunResult> {
        let parameters = ctx
            .best_parameters()
            .map(<[f64]>::to_vec)
            .unwrap_or(fallback);
        ctx.complete(parameters, reason)
    }
}

/// `|last - first| / (|first| + 1e-10)` over the trailing window of losses.
fn recent_relative_improvement(history: &[f64]) -> f64 {
    let window = &history[history.len().saturating_sub(EARLY_STOP_WINDOW)..];
    match (window.first(), window.last()) {
        (Some(&first), Some(&last)) => (last - first).abs() / (first.abs() + 1e-10),
        _ => f64::INFINITY,
    }
}
