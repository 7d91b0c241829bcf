//! Shared helpers for population-based methods.

use crate::error::ObjectiveError;
use crate::objective::ObjectiveAdapter;
use rand::Rng;

/// `size` members drawn uniformly from `[lower, upper)^n`, with member 0
/// replaced by `seed_member`.
pub(crate) fn uniform_members<R: Rng>(
    rng: &mut R,
    size: usize,
    seed_member: &[f64],
    lower: f64,
    upper: f64,
) -> Vec<Vec<f64>> {
    (0..size)
        .map(|i| {
            if i == 0 {
                seed_member.to_vec()
            } else {
                (0..seed_member.len())
                    .map(|_| rng.random_range(lower..upper))
                    .collect()
            }
        })
        .collect()
}

/// Sign-normalized loss of every member, on rayon workers when `parallel`
/// is set and the `parallel` feature is enabled.
pub(crate) fn evaluate_losses(
    objective: &ObjectiveAdapter,
    members: &[Vec<f64>],
    parallel: bool,
) -> Result<Vec<f64>, ObjectiveError> {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;
            return members.par_iter().map(|m| objective.loss(m)).collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    members.iter().map(|m| objective.loss(m)).collect()
}

/// Index of the smallest loss; the first one wins ties.
pub(crate) fn argmin(losses: &[f64]) -> usize {
    let mut best = 0;
    for (i, &loss) in losses.iter().enumerate().skip(1) {
        if loss < losses[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn clip(x: &mut [f64], lower: f64, upper: f64) {
    for v in x.iter_mut() {
        *v = v.clamp(lower, upper);
    }
}
