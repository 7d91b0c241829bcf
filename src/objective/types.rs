//! Objective trait and output shapes.

use crate::error::ObjectiveError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Optimization direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl Direction {
    /// Multiplier that turns the objective into a loss to minimize.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        }
    }
}

/// What a collaborator objective may return.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveOutput {
    /// A bare value; the gradient is obtained by differentiation.
    Scalar(f64),
    /// A `(value, gradient)` pair.
    Pair(f64, Vec<f64>),
    /// A keyed record `{value, gradients}` with an optional gradient.
    Record {
        value: f64,
        gradients: Option<Vec<f64>>,
    },
}

impl ObjectiveOutput {
    /// The raw objective value, whatever the shape.
    pub fn value(&self) -> f64 {
        match self {
            ObjectiveOutput::Scalar(v) => *v,
            ObjectiveOutput::Pair(v, _) => *v,
            ObjectiveOutput::Record { value, .. } => *value,
        }
    }

    /// Splits into value and optional gradient, checking the gradient
    /// length against the parameter dimension `n`.
    pub fn into_parts(self, n: usize) -> Result<(f64, Option<Vec<f64>>), ObjectiveError> {
        let (value, gradient) = match self {
            ObjectiveOutput::Scalar(v) => (v, None),
            ObjectiveOutput::Pair(v, g) => (v, Some(g)),
            ObjectiveOutput::Record { value, gradients } => (value, gradients),
        };
        if let Some(g) = &gradient {
            if g.len() != n {
                return Err(ObjectiveError::GradientLength {
                    expected: n,
                    found: g.len(),
                });
            }
        }
        Ok((value, gradient))
    }

    /// Interprets a loosely-typed JSON result.
    ///
    /// Accepted shapes:
    /// - a number
    /// - `[value, [g0, g1, ...]]` or `[value, null]`
    /// - `{"value": v, "gradients": [...]}` (`gradients` optional)
    pub fn from_json(raw: &Value) -> Result<Self, ObjectiveError> {
        match raw {
            Value::Number(n) => n
                .as_f64()
                .map(ObjectiveOutput::Scalar)
                .ok_or_else(|| ObjectiveError::Malformed(format!("unrepresentable number {n}"))),
            Value::Array(items) if items.len() == 2 => {
                let value = json_number(&items[0], "pair value")?;
                match json_gradient(&items[1])? {
                    Some(g) => Ok(ObjectiveOutput::Pair(value, g)),
                    None => Ok(ObjectiveOutput::Record {
                        value,
                        gradients: None,
                    }),
                }
            }
            Value::Object(map) => {
                let value = map
                    .get("value")
                    .ok_or_else(|| ObjectiveError::Malformed("record has no `value` key".into()))
                    .and_then(|v| json_number(v, "record value"))?;
                let gradients = match map.get("gradients") {
                    Some(g) => json_gradient(g)?,
                    None => None,
                };
                Ok(ObjectiveOutput::Record { value, gradients })
            }
            other => Err(ObjectiveError::Malformed(format!(
                "expected a number, a (value, gradient) pair or a keyed record, got {other}"
            ))),
        }
    }
}

fn json_number(raw: &Value, what: &str) -> Result<f64, ObjectiveError> {
    raw.as_f64()
        .ok_or_else(|| ObjectiveError::Malformed(format!("{what} is not a number: {raw}")))
}

fn json_gradient(raw: &Value) -> Result<Option<Vec<f64>>, ObjectiveError> {
    match raw {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|g| json_number(g, "gradient component"))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        other => Err(ObjectiveError::Malformed(format!(
            "gradient is not a sequence: {other}"
        ))),
    }
}

/// Sign-normalized evaluation produced by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveResult {
    /// Loss to minimize. Non-finite objective values become `+inf`.
    pub value: f64,
    pub gradient: Option<Vec<f64>>,
}

impl ObjectiveResult {
    /// Value and gradient, failing if no gradient is attached.
    pub fn into_value_and_gradient(self) -> Result<(f64, Vec<f64>), ObjectiveError> {
        match self.gradient {
            Some(g) => Ok((self.value, g)),
            None => Err(ObjectiveError::Malformed("gradient missing".into())),
        }
    }
}

/// A collaborator-supplied objective.
///
/// Implementations must be shareable across threads: ensemble members
/// evaluate the same objective on independent workers.
pub trait Objective: Send + Sync {
    /// Evaluates the objective at `x`.
    fn evaluate(&self, x: &[f64]) -> Result<ObjectiveOutput, ObjectiveError>;
}

/// Objective returning a bare value.
///
/// ```
/// use u_optflow::objective::{Objective, ScalarFn};
///
/// let sphere = ScalarFn(|x: &[f64]| x.iter().map(|v| v * v).sum::<f64>());
/// assert_eq!(sphere.evaluate(&[3.0, 4.0]).unwrap().value(), 25.0);
/// ```
pub struct ScalarFn<F>(pub F);

impl<F> Objective for ScalarFn<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, x: &[f64]) -> Result<ObjectiveOutput, ObjectiveError> {
        Ok(ObjectiveOutput::Scalar((self.0)(x)))
    }
}

/// Objective returning a `(value, gradient)` pair.
pub struct GradientFn<F>(pub F);

impl<F> Objective for GradientFn<F>
where
    F: Fn(&[f64]) -> (f64, Vec<f64>) + Send + Sync,
{
    fn evaluate(&self, x: &[f64]) -> Result<ObjectiveOutput, ObjectiveError> {
        let (value, gradient) = (self.0)(x);
        Ok(ObjectiveOutput::Pair(value, gradient))
    }
}

/// Objective that may fail.
pub struct FallibleFn<F>(pub F);

impl<F> Objective for FallibleFn<F>
where
    F: Fn(&[f64]) -> Result<ObjectiveOutput, ObjectiveError> + Send + Sync,
{
    fn evaluate(&self, x: &[f64]) -> Result<ObjectiveOutput, ObjectiveError> {
        (self.0)(x)
    }
}

/// Objective returning loosely-typed JSON, interpreted by
/// [`ObjectiveOutput::from_json`].
pub struct JsonObjective<F>(pub F);

impl<F> Objective for JsonObjective<F>
where
    F: Fn(&[f64]) -> Value + Send + Sync,
{
    fn evaluate(&self, x: &[f64]) -> Result<ObjectiveOutput, ObjectiveError> {
        ObjectiveOutput::from_json(&(self.0)(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Minimize.sign(), 1.0);
        assert_eq!(Direction::Maximize.sign(), -1.0);
        assert_eq!(Direction::default(), Direction::Minimize);
    }

    #[test]
    fn test_direction_serde_names() {
        assert_eq!(serde_json::to_value(Direction::Maximize).unwrap(), json!("maximize"));
        let d: Direction = serde_json::from_value(json!("minimize")).unwrap();
        assert_eq!(d, Direction::Minimize);
    }

    #[test]
    fn test_from_json_scalar() {
        assert_eq!(
            ObjectiveOutput::from_json(&json!(2.5)).unwrap(),
            ObjectiveOutput::Scalar(2.5)
        );
    }

    #[test]
    fn test_from_json_pair() {
        assert_eq!(
            ObjectiveOutput::from_json(&json!([1.0, [2.0, 3.0]])).unwrap(),
            ObjectiveOutput::Pair(1.0, vec![2.0, 3.0])
        );
        assert_eq!(
            ObjectiveOutput::from_json(&json!([1.0, null])).unwrap(),
            ObjectiveOutput::Record {
                value: 1.0,
                gradients: None
            }
        );
    }

    #[test]
    fn test_from_json_record() {
        assert_eq!(
            ObjectiveOutput::from_json(&json!({ "value": 4.0, "gradients": [1.0] })).unwrap(),
            ObjectiveOutput::Record {
                value: 4.0,
                gradients: Some(vec![1.0])
            }
        );
        assert_eq!(
            ObjectiveOutput::from_json(&json!({ "value": 4.0 })).unwrap().value(),
            4.0
        );
    }

    #[test]
    fn test_from_json_malformed() {
        for raw in [
            json!("text"),
            json!([1.0, 2.0, 3.0]),
            json!({ "gradients": [1.0] }),
            json!([1.0, "grad"]),
            json!({ "value": 1.0, "gradients": [true] }),
            json!(null),
        ] {
            assert!(
                matches!(ObjectiveOutput::from_json(&raw), Err(ObjectiveError::Malformed(_))),
                "expected malformed for {raw}"
            );
        }
    }

    #[test]
    fn test_into_parts_checks_gradient_length() {
        let err = ObjectiveOutput::Pair(1.0, vec![1.0, 2.0])
            .into_parts(3)
            .unwrap_err();
        assert_eq!(
            err,
            ObjectiveError::GradientLength {
                expected: 3,
                found: 2
            }
        );
        assert_eq!(
            ObjectiveOutput::Scalar(1.0).into_parts(3).unwrap(),
            (1.0, None)
        );
    }

    #[test]
    fn test_closure_objectives() {
        let pair = GradientFn(|x: &[f64]| (x[0] * x[0], vec![2.0 * x[0]]));
        assert_eq!(
            pair.evaluate(&[3.0]).unwrap(),
            ObjectiveOutput::Pair(9.0, vec![6.0])
        );

        let failing = FallibleFn(|_: &[f64]| -> Result<ObjectiveOutput, ObjectiveError> {
            Err(ObjectiveError::Raised("nope".into()))
        });
        assert!(failing.evaluate(&[0.0]).is_err());

        let legacy = JsonObjective(|x: &[f64]| json!({ "value": x[0] }));
        assert_eq!(legacy.evaluate(&[7.0]).unwrap().value(), 7.0);
    }
}
