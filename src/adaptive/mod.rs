//! Adaptive first-order steppers with learning-rate schedules.
//!
//! Three update rules share one loop:
//!
//! - **Momentum** (heavy ball): `b ← μ·b + g`, `x ← x - lr·b`
//! - **RMSprop**: `s ← α·s + (1-α)·g²`, `x ← x - lr·g/(√s + ε)`
//! - **Adagrad**: `s ← s + g²`, `x ← x - lr·g/(√s + ε)`
//!
//! The learning rate may follow a [`Scheduler`]: cosine annealing over the
//! iteration budget, step decay, or reduce-on-plateau. The rate used for
//! each step is logged as the `learning_rate` diagnostic.

mod config;
mod runner;
mod schedule;

pub use config::{AdaptiveConfig, Scheduler, Stepper};
pub use runner::AdaptiveRunner;
