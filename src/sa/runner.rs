//! SA execution loop.

use super::config::SaConfig;
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::objective::ObjectiveAdapter;
use crate::random::rng_from;
use rand::Rng;
use rand_distr::StandardNormal;

/// Metropolis acceptance probability for a loss change `delta` at
/// `temperature`.
///
/// Returns exactly `1.0` for `delta <= 0`, `exp(-delta / temperature)` for
/// a worsening move, and `0.0` when `delta` is NaN or the temperature is not
/// positive.
///
/// ```
/// use u_optflow::sa::acceptance_probability;
///
/// assert!((acceptance_probability(1.0, 1.0) - (-1.0f64).exp()).abs() < 1e-12);
/// assert_eq!(acceptance_probability(-3.0, 0.5), 1.0);
/// ```
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta.is_nan() {
        0.0
    } else if delta <= 0.0 {
        1.0
    } else if temperature.is_nan() || temperature <= 0.0 {
        0.0
    } else {
        (-delta / temperature).exp()
    }
}

/// Executes Simulated Annealing.
pub struct SaRunner;

impl SaRunner {
    pub const NAME: &'static str = "sa";

    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = SaConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &SaConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut rng = rng_from(config.seed);

        let mut current = ctx.current_parameters().to_vec();
        let mut current_loss = objective.loss(&current)?;
        let mut best = current.clone();
        let mut best_loss = current_loss;
        let mut temperature = config.initial_temperature;

        ctx.log_step(0, current_loss, &current, None, &[("temperature", temperature)])?;

        for iteration in 1..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(best, TerminationReason::Cancelled);
            }

            let neighbor: Vec<f64> = current
                .iter()
                .map(|&x| {
                    let z: f64 = rng.sample(StandardNormal);
                    x + config.step_sigma * z
                })
                .collect();
            let neighbor_loss = objective.loss(&neighbor)?;

            // Metropolis acceptance criterion
            let delta = neighbor_loss - current_loss;
            let probability = acceptance_probability(delta, temperature);
            let accept = delta < 0.0 || rng.random::<f64>() < probability;
            if accept {
                current = neighbor;
                current_loss = neighbor_loss;
                if current_loss < best_loss {
                    best = current.clone();
                    best_loss = current_loss;
                }
            }

            ctx.log_step(
                iteration,
                best_loss,
                &best,
                None,
                &[
                    ("temperature", temperature),
                    ("acceptance_probability", probability),
                ],
            )?;

            if iteration > 1 && ctx.loss_delta_below(config.tolerance) {
                return ctx.complete(best, TerminationReason::Converged);
            }

            temperature *= config.cooling_rate;
            if temperature < config.min_temperature {
                return ctx.complete(best, TerminationReason::Cooled);
            }
        }

        ctx.complete(best, TerminationReason::MaxIterations)
    }
}
