//! Real-coded genetic operators.
//!
//! - [`tournament`]: best of `k` distinct random members
//! - [`arithmetic_crossover`]: convex blend of two parents
//! - [`gaussian_mutation`]: isotropic Gaussian noise, clipped to the box

use crate::population;
use rand::seq::index;
use rand::Rng;
use rand_distr::StandardNormal;

// ============================================================================
// Selection
// ============================================================================

/// Tournament selection over losses (lower is better).
///
/// Draws `size` distinct indices (clamped to `1..=len`) and returns the one
/// with the smallest loss.
///
/// # Panics
/// Panics if `losses` is empty.
pub fn tournament<R: Rng>(losses: &[f64], size: usize, rng: &mut R) -> usize {
    let size = size.clamp(1, losses.len());
    let mut winner: Option<usize> = None;
    for i in index::sample(rng, losses.len(), size).iter() {
        if winner.is_none_or(|w| losses[i] < losses[w]) {
            winner = Some(i);
        }
    }
    winner.unwrap_or(0)
}

// ============================================================================
// Crossover
// ============================================================================

/// Arithmetic crossover with mixing coefficient `alpha`:
///
/// ```text
/// c1 = α·a + (1-α)·b
/// c2 = (1-α)·a + α·b
/// ```
pub fn arithmetic_crossover(a: &[f64], b: &[f64], alpha: f64) -> (Vec<f64>, Vec<f64>) {
    let c1 = a.iter().zip(b).map(|(x, y)| alpha * x + (1.0 - alpha) * y).collect();
    let c2 = a.iter().zip(b).map(|(x, y)| (1.0 - alpha) * x + alpha * y).collect();
    (c1, c2)
}

// ============================================================================
// Mutation
// ============================================================================

/// Adds `N(0, sigma²)` noise to every component, then clips to
/// `[lower, upper]`.
pub fn gaussian_mutation<R: Rng>(x: &mut [f64], sigma: f64, lower: f64, upper: f64, rng: &mut R) {
    for v in x.iter_mut() {
        let z: f64 = rng.sample(StandardNormal);
        *v += sigma * z;
    }
    population::clip(x, lower, upper);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_tournament_full_size_picks_best() {
        let mut rng = create_rng(1);
        let losses = [3.0, 0.5, 2.0, 9.0];
        for _ in 0..20 {
            assert_eq!(tournament(&losses, 4, &mut rng), 1);
        }
    }

    #[test]
    fn test_tournament_size_one_is_uniform() {
        let mut rng = create_rng(2);
        let losses = [0.0, 1.0, 2.0, 3.0];
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[tournament(&losses, 1, &mut rng)] = true;
        }
        assert!(seen.iter().all(|&s| s), "{seen:?}");
    }

    #[test]
    fn test_tournament_clamps_size() {
        let mut rng = create_rng(3);
        assert_eq!(tournament(&[1.0, 0.0], 10, &mut rng), 1);
        let pick = tournament(&[1.0, 0.0], 0, &mut rng);
        assert!(pick < 2);
    }

    #[test]
    fn test_arithmetic_crossover() {
        let (c1, c2) = arithmetic_crossover(&[0.0, 10.0], &[10.0, 0.0], 0.25);
        assert_eq!(c1, vec![7.5, 2.5]);
        assert_eq!(c2, vec![2.5, 7.5]);
    }

    #[test]
    fn test_gaussian_mutation_clips() {
        let mut rng = create_rng(4);
        let mut x = vec![0.99; 50];
        gaussian_mutation(&mut x, 0.1, -1.0, 1.0, &mut rng);
        assert!(x.iter().all(|v| (-1.0..=1.0).contains(v)));
        assert!(x.iter().any(|&v| v != 0.99));
    }
}
