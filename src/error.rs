//! Error taxonomy for the optimization engine.
//!
//! Hard failures surface as [`OptError`]. Soft conditions (unknown method
//! names, skipped BFGS updates, line-search underflow) never reach this type;
//! they are logged and the run continues.

use thiserror::Error;

/// Crate-wide result alias.
pub type OptResult<T> = Result<T, OptError>;

/// Failure raised while evaluating a user objective.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectiveError {
    /// The collaborator objective reported a failure.
    #[error("objective raised: {0}")]
    Raised(String),

    /// The objective returned a shape that is neither a scalar, a
    /// `(value, gradient)` pair, nor a keyed record.
    #[error("malformed objective output: {0}")]
    Malformed(String),

    /// A gradient was returned with the wrong number of components.
    #[error("gradient has {found} components, expected {expected}")]
    GradientLength { expected: usize, found: usize },
}

/// Engine-level error.
#[derive(Debug, Error)]
pub enum OptError {
    /// The objective (or its differentiation) failed; the run is aborted.
    #[error("objective evaluation failed: {0}")]
    ObjectiveEvaluation(#[from] ObjectiveError),

    /// No context is stored under the requested id.
    #[error("unknown optimization context `{0}`")]
    UnknownContext(String),

    /// Strict registry lookup of a name that is not registered.
    #[error("unknown optimization method `{0}`")]
    UnknownMethod(String),

    /// A recognized configuration value is out of range or mistyped.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A parameter or gradient vector does not match the run dimension.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// An operation was attempted in the wrong lifecycle state.
    #[error("cannot {operation} a run that is {state}")]
    Lifecycle {
        state: &'static str,
        operation: &'static str,
    },

    /// Checkpoint encoding or decoding failed.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_error_converts() {
        let err: OptError = ObjectiveError::Raised("boom".into()).into();
        assert!(matches!(err, OptError::ObjectiveEvaluation(_)));
        assert_eq!(err.to_string(), "objective evaluation failed: objective raised: boom");
    }

    #[test]
    fn test_lifecycle_message() {
        let err = OptError::Lifecycle {
            state: "finished",
            operation: "start",
        };
        assert_eq!(err.to_string(), "cannot start a run that is finished");
    }
}
