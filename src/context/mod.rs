//! Per-run state.
//!
//! A [`RunContext`] owns everything one optimization run mutates: the
//! parameter vector, the append-only step history, the best-so-far
//! tracker and the `Created → Running → Finished` lifecycle. Algorithms
//! borrow it mutably for the duration of a call, so no two algorithms can
//! drive the same run concurrently.

mod control;
pub(crate) mod float_codec;
mod run;
mod step;

pub use control::RunControl;
pub use run::{Lifecycle, RunContext, RunResult};
pub use step::{StepRecord, TerminationReason};
