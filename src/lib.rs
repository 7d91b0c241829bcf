//! Pluggable numerical optimization engine.
//!
//! Runs a user objective through one of several optimization families and
//! tracks every run in a [`RunContext`]:
//!
//! - **First order**: fixed-step gradient descent ([`gd`]), Adam ([`adam`]),
//!   and momentum SGD, RMSprop and Adagrad with learning-rate schedulers
//!   ([`adaptive`]).
//! - **Line search**: BFGS ([`bfgs`]) and Polak–Ribière nonlinear conjugate
//!   gradient ([`cg`]), both with Armijo backtracking ([`line_search`]).
//! - **Population**: real-coded Genetic Algorithm ([`ga`]) and Particle
//!   Swarm Optimization ([`pso`]).
//! - **Annealing**: Simulated Annealing ([`sa`]).
//! - **Composition**: hybrid chains and ensembles ([`composite`]).
//!
//! # Architecture
//!
//! Objectives enter through [`ObjectiveAdapter`], which interprets the
//! shapes an objective may return and normalizes everything to a loss to
//! minimize. Each algorithm is a plain function
//! `(&mut RunContext, &ObjectiveAdapter) -> OptResult<RunResult>` reading
//! its hyperparameters from the context's [`OptimizationConfig`]; the
//! [`MethodRegistry`] maps names to those functions, and
//! [`OptimizationEngine`] stores runs by id.
//!
//! # Example
//!
//! ```
//! use u_optflow::objective::{GradientFn, ObjectiveAdapter};
//! use u_optflow::{MethodRegistry, OptimizationConfig, RunContext};
//!
//! let sphere = ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| {
//!     (x.iter().map(|v| v * v).sum(), x.iter().map(|v| 2.0 * v).collect())
//! }));
//! let config = OptimizationConfig::default().with_max_iterations(50);
//! let mut ctx = RunContext::new("demo", vec![3.0, -4.0], config);
//!
//! let result = MethodRegistry::get("bfgs")(&mut ctx, &sphere).unwrap();
//! assert!(result.final_loss < 1e-10);
//! assert_eq!(ctx.loss_history().len(), ctx.steps().len());
//! ```

pub mod adam;
pub mod adaptive;
pub mod bfgs;
pub mod cg;
pub mod composite;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod ga;
pub mod gd;
pub mod line_search;
pub mod linalg;
pub mod objective;
mod population;
pub mod pso;
pub mod random;
pub mod registry;
pub mod sa;

pub use config::{HybridOptions, OptimizationConfig};
pub use context::{Lifecycle, RunContext, RunControl, RunResult, StepRecord, TerminationReason};
pub use engine::OptimizationEngine;
pub use error::{ObjectiveError, OptError, OptResult};
pub use objective::{Direction, ObjectiveAdapter};
pub use registry::{Algorithm, MethodRegistry};
