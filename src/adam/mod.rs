//! Adam: adaptive moment estimation.
//!
//! Keeps exponential moving averages of the gradient (`m`) and of its
//! elementwise square (`v`), bias-corrects both and steps
//! `x ← x - lr·m̂/(√v̂ + ε)`. Step records carry the moment norms as
//! `m_norm` / `v_norm`.
//!
//! # References
//!
//! - Kingma & Ba (2015), "Adam: A Method for Stochastic Optimization"

mod config;
mod runner;

pub use config::AdamConfig;
pub use runner::AdamRunner;
