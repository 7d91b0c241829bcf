//! Simulated Annealing over continuous parameters.
//!
//! A single current solution is perturbed with isotropic Gaussian noise
//! (`σ = 0.1`). Worse neighbors are accepted with the Metropolis
//! probability `exp(-Δ/T)`, and the temperature decays geometrically
//! (`T ← cooling_rate·T`). The best-ever solution is tracked separately
//! from the accepted one; every step logs it together with `temperature`
//! and `acceptance_probability`.
//!
//! The run ends when the best loss stops moving (`converged`), when the
//! temperature drops below `1e-6` (`cooled`), or when the budget is spent.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Metropolis et al. (1953), "Equation of State Calculations by Fast
//!   Computing Machines"

mod config;
mod runner;

pub use config::SaConfig;
pub use runner::{acceptance_probability, SaRunner};
