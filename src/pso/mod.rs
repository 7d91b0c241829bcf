//! Particle Swarm Optimization.
//!
//! Particles start uniformly in the search box (particle 0 at the run's
//! initial vector) with velocities in `[-1, 1)`. Each iteration moves every
//! particle with
//!
//! ```text
//! v ← w·v + c1·r1·(p_best - x) + c2·r2·(g_best - x)
//! ```
//!
//! clamps `|v|` to `0.1·(ub - lb)`, clips the position to the box and then
//! re-evaluates the whole swarm (synchronous update, so evaluation can run
//! on rayon workers). Steps record the global best and the spread of the
//! personal-best losses as `swarm_diversity`.
//!
//! # References
//!
//! - Kennedy & Eberhart (1995), "Particle Swarm Optimization"
//! - Shi & Eberhart (1998), "A Modified Particle Swarm Optimizer" (inertia)

mod config;
mod runner;

pub use config::PsoConfig;
pub use runner::PsoRunner;
