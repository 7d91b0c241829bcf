//! Nonlinear conjugate gradient (Polak–Ribière+).
//!
//! First direction `d = -g`, then `β = max(0, gᵀ(g - g_old) / ‖g_old‖²)` and
//! `d = -g + β·d`, restarting with `d = -g` whenever the result is not a
//! descent direction. Step sizes come from the same backtracking Armijo
//! search as BFGS. No Hessian or Hessian-vector products are involved.
//!
//! Registered as `nonlinear_cg`; the name `newton_cg` resolves here too.
//!
//! # References
//!
//! - Polak & Ribière (1969); Nocedal & Wright (2006), §5.2

mod config;
mod runner;

pub use config::CgConfig;
pub use runner::CgRunner;
