//! GA generational loop.

use super::config::GaConfig;
use super::operators::{arithmetic_crossover, gaussian_mutation, tournament};
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use crate::population;
use crate::random::rng_from;
use rand::Rng;

/// Standard deviation of the Gaussian mutation.
const MUTATION_SIGMA: f64 = 0.1;

/// Executes the real-coded GA.
pub struct GaRunner;

impl GaRunner {
    pub const NAME: &'static str = "genetic";

    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = GaConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &GaConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut rng = rng_from(config.seed);
        let (lb, ub) = (config.lower_bound, config.upper_bound);
        let pop_size = config.population_size;
        let tournament_size = config.tournament_size();

        let mut population = population::uniform_members(
            &mut rng,
            pop_size,
            ctx.current_parameters(),
            lb,
            ub,
        );
        let mut best = ctx.current_parameters().to_vec();

        for generation in 0..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(best, TerminationReason::Cancelled);
            }

            let losses = population::evaluate_losses(objective, &population, config.parallel)?;
            let best_idx = population::argmin(&losses);
            best = population[best_idx].clone();

            let diversity = linalg::std_dev(&losses);
            ctx.log_step(
                generation,
                losses[best_idx],
                &best,
                None,
                &[("population_diversity", diversity)],
            )?;
            if ctx.loss_delta_below(config.tolerance) {
                return ctx.complete(best, TerminationReason::Converged);
            }

            // selection
            let mut next: Vec<Vec<f64>> = (0..pop_size)
                .map(|_| population[tournament(&losses, tournament_size, &mut rng)].clone())
                .collect();

            // crossover on consecutive pairs
            for i in (0..pop_size.saturating_sub(1)).step_by(2) {
                if rng.random::<f64>() < config.crossover_rate {
                    let alpha = rng.random::<f64>();
                    let (c1, c2) = arithmetic_crossover(&next[i], &next[i + 1], alpha);
                    next[i] = c1;
                    next[i + 1] = c2;
                }
            }

            // mutation
            for member in next.iter_mut() {
                if rng.random::<f64>() < config.mutation_rate {
                    gaussian_mutation(member, MUTATION_SIGMA, lb, ub, &mut rng);
                }
            }

            // elitism
            next[0] = best.clone();
            population = next;
        }

        ctx.complete(best, TerminationReason::MaxIterations)
    }
}
