//! PSO loop.

use super::config::PsoConfig;
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use crate::population;
use crate::random::rng_from;
use rand::Rng;

/// Executes PSO.
pub struct PsoRunner;

impl PsoRunner {
    pub const NAME: &'static str = "pso";

    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = PsoConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &PsoConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut rng = rng_from(config.seed);
        let (lb, ub) = (config.lower_bound, config.upper_bound);
        let n = ctx.dimension();
        let v_max = config.max_velocity();

        let mut positions = population::uniform_members(
            &mut rng,
            config.swarm_size,
            ctx.current_parameters(),
            lb,
            ub,
        );
        let mut velocities: Vec<Vec<f64>> = (0..config.swarm_size)
            .map(|_| (0..n).map(|_| rng.random_range(-1.0..1.0)).collect())
            .collect();

        let mut personal_best = positions.clone();
        let mut personal_best_loss =
            population::evaluate_losses(objective, &positions, config.parallel)?;
        let g = population::argmin(&personal_best_loss);
        let mut global_best = positions[g].clone();
        let mut global_best_loss = personal_best_loss[g];

        for iteration in 0..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(global_best, TerminationReason::Cancelled);
            }

            let diversity = linalg::std_dev(&personal_best_loss);
            ctx.log_step(
                iteration,
                global_best_loss,
                &global_best,
                None,
                &[("swarm_diversity", diversity)],
            )?;
            if ctx.loss_delta_below(config.tolerance) {
                return ctx.complete(global_best, TerminationReason::Converged);
            }

            for i in 0..config.swarm_size {
                let r1: f64 = rng.random();
                let r2: f64 = rng.random();
                let x = &mut positions[i];
                let v = &mut velocities[i];
                for k in 0..n {
                    let cognitive = config.cognitive_coef * r1 * (personal_best[i][k] - x[k]);
                    let social = config.social_coef * r2 * (global_best[k] - x[k]);
                    v[k] = (config.inertia_weight * v[k] + cognitive + social).clamp(-v_max, v_max);
                    x[k] = (x[k] + v[k]).clamp(lb, ub);
                }
            }

            let losses = population::evaluate_losses(objective, &positions, config.parallel)?;
            for (i, &loss) in losses.iter().enumerate() {
                if loss < personal_best_loss[i] {
                    personal_best[i] = positions[i].clone();
                    personal_best_loss[i] = loss;
                    if loss < global_best_loss {
                        global_best = positions[i].clone();
                        global_best_loss = loss;
                    }
                }
            }
        }

        ctx.complete(global_best, TerminationReason::MaxIterations)
    }
}
