//! Objective contract and adapter.
//!
//! A user objective maps a parameter vector to a value and, optionally, a
//! gradient. [`ObjectiveAdapter`] is the single boundary that interprets
//! the shapes an objective may return, applies the minimize/maximize sign
//! convention, and fills in missing gradients through an injected
//! [`Differentiator`]. Every algorithm downstream of the adapter minimizes.

mod adapter;
mod diff;
mod types;

pub use adapter::ObjectiveAdapter;
pub use diff::{Differentiator, FiniteDifference, NoDifferentiation};
pub use types::{
    Direction, FallibleFn, GradientFn, JsonObjective, Objective, ObjectiveOutput,
    ObjectiveResult, ScalarFn,
};
