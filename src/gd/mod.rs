//! Gradient descent with a fixed learning rate.
//!
//! Update `x ← x - lr·∇f(x)`; the run converges once two successive
//! losses differ by less than the tolerance.

mod config;
mod runner;

pub use config::GdConfig;
pub use runner::GdRunner;
