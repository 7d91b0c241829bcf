//! Strategies built from several runs.
//!
//! - [`HybridRunner`]: methods run one after another under a shared
//!   iteration budget, each stage starting where the previous one ended.
//! - [`EnsembleRunner`]: methods run independently (on rayon workers with
//!   the `parallel` feature) and their final parameters are averaged.

mod ensemble;
mod hybrid;

pub use ensemble::{Ensemble, EnsembleResult, EnsembleRunner};
pub use hybrid::{HybridConfig, HybridRunner};
