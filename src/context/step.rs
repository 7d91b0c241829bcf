//! Step records and termination reasons.

use super::float_codec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Successive loss delta (or gradient norm) fell below tolerance.
    Converged,
    /// The iteration budget was exhausted.
    MaxIterations,
    /// Line-search methods: absolute loss delta fell below tolerance.
    SmallImprovement,
    /// Simulated annealing: temperature fell below its floor.
    Cooled,
    /// A hybrid chain ran to completion (or stopped early by design).
    HybridCompleted,
    /// The cancellation flag was raised or the deadline passed.
    Cancelled,
    /// The loss or gradient at the current iterate was not finite.
    Diverged,
}

impl TerminationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::Converged => "converged",
            TerminationReason::MaxIterations => "max_iterations",
            TerminationReason::SmallImprovement => "small_improvement",
            TerminationReason::Cooled => "cooled",
            TerminationReason::HybridCompleted => "hybrid_completed",
            TerminationReason::Cancelled => "cancelled",
            TerminationReason::Diverged => "diverged",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged iteration. Immutable once appended to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub iteration: usize,

    /// Sign-normalized loss; lower is better.
    #[serde(with = "float_codec::scalar")]
    pub loss: f64,

    #[serde(with = "float_codec::seq")]
    pub parameters: Vec<f64>,

    #[serde(with = "float_codec::opt_seq")]
    pub gradient: Option<Vec<f64>>,

    #[serde(with = "float_codec::opt_scalar")]
    pub gradient_norm: Option<f64>,

    /// Algorithm-specific diagnostics (temperature, step size, diversity...).
    #[serde(with = "float_codec::map")]
    pub extra: BTreeMap<String, f64>,

    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl StepRecord {
    /// Looks up a diagnostic by name.
    pub fn extra(&self, key: &str) -> Option<f64> {
        self.extra.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_names_match_serde() {
        for reason in [
            TerminationReason::Converged,
            TerminationReason::MaxIterations,
            TerminationReason::SmallImprovement,
            TerminationReason::Cooled,
            TerminationReason::HybridCompleted,
            TerminationReason::Cancelled,
            TerminationReason::Diverged,
        ] {
            let encoded = serde_json::to_value(reason).unwrap();
            assert_eq!(encoded, serde_json::Value::String(reason.to_string()));
        }
    }

    #[test]
    fn test_step_extra_lookup() {
        let step = StepRecord {
            iteration: 3,
            loss: 1.0,
            parameters: vec![0.5],
            gradient: None,
            gradient_norm: None,
            extra: BTreeMap::from([("temperature".to_string(), 0.25)]),
            timestamp: 0.0,
        };
        assert_eq!(step.extra("temperature"), Some(0.25));
        assert_eq!(step.extra("alpha"), None);
    }
}
