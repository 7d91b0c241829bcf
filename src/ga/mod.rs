//! Real-coded Genetic Algorithm.
//!
//! A population of parameter vectors drawn uniformly from the search box
//! (member 0 is the run's initial vector) evolves by tournament selection,
//! arithmetic crossover and Gaussian mutation. The best member of each
//! generation survives unmodified into slot 0 of the next.
//!
//! Fitness is the negated sign-normalized loss, so higher is better.
//! Each step records the generation's best member and the spread of the
//! population's fitness as `population_diversity`.
//!
//! # References
//!
//! - Holland (1975), "Adaptation in Natural and Artificial Systems"
//! - Michalewicz (1996), "Genetic Algorithms + Data Structures = Evolution
//!   Programs" (arithmetic crossover)

mod config;
mod operators;
mod runner;

pub use config::GaConfig;
pub use operators::{arithmetic_crossover, gaussian_mutation, tournament};
pub use runner::GaRunner;
