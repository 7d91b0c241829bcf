//! BFGS quasi-Newton method.
//!
//! Maintains a dense inverse-Hessian approximation `H` (initially the
//! identity), searches along `p = -H·g` with a backtracking Armijo line
//! search, and applies the rank-2 update
//!
//! ```text
//! H+ = (I - ρ s yᵀ) H (I - ρ y sᵀ) + ρ s sᵀ,   ρ = 1 / yᵀs
//! ```
//!
//! only when the curvature condition `yᵀs > 1e-10` holds. Steps record the
//! accepted step size (`alpha`) and whether `H` was updated
//! (`hessian_updated`).
//!
//! # References
//!
//! - Nocedal & Wright (2006), "Numerical Optimization", §6.1

mod config;
mod runner;

pub use config::BfgsConfig;
pub use runner::BfgsRunner;
