//! Raw run configuration.
//!
//! [`OptimizationConfig`] carries every recognized option as an `Option`;
//! each algorithm family resolves the options it understands into its own
//! typed config (`GdConfig`, `BfgsConfig`, ...) whose `Default` declares the
//! family defaults. Unknown keys in JSON input are ignored with a warning.

use crate::error::{OptError, OptResult};
use crate::objective::Direction;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Defaults shared by more than one algorithm family.
pub mod defaults {
    /// Convergence threshold used by every family.
    pub const TOLERANCE: f64 = 1e-6;
    /// Iteration budget for first-order methods.
    pub const FIRST_ORDER_MAX_ITERATIONS: usize = 1000;
    /// Iteration budget for line-search, population and annealing methods.
    pub const SEARCH_MAX_ITERATIONS: usize = 100;
    /// Lower search-space bound for population methods.
    pub const LOWER_BOUND: f64 = -10.0;
    /// Upper search-space bound for population methods.
    pub const UPPER_BOUND: f64 = 10.0;
    /// Method used when none (or an unknown one) is requested.
    pub const PRIMARY_METHOD: &str = "adam";
    /// Relative improvement below which a hybrid chain stops early.
    pub const SWITCH_THRESHOLD: f64 = 0.1;
}

const KNOWN_KEYS: &[&str] = &[
    "max_iterations",
    "initial_learning_rate",
    "tolerance",
    "beta1",
    "beta2",
    "epsilon",
    "population_size",
    "mutation_rate",
    "crossover_rate",
    "selection_pressure",
    "lower_bound",
    "upper_bound",
    "swarm_size",
    "inertia_weight",
    "cognitive_coef",
    "social_coef",
    "initial_temperature",
    "cooling_rate",
    "primary_method",
    "secondary_methods",
    "hybrid_config",
    "objective_type",
    "seed",
    "time_limit_ms",
    "momentum",
    "alpha",
    "scheduler",
    "step_size",
    "gamma",
    "factor",
    "patience",
];

const KNOWN_HYBRID_KEYS: &[&str] = &["method_weights", "switch_threshold"];

/// Options controlling a hybrid chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridOptions {
    /// Fraction of the total iteration budget per method name.
    /// Methods without an entry share the budget equally.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub method_weights: BTreeMap<String, f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_threshold: Option<f64>,
}

/// Every option recognized by the engine.
///
/// Absent options fall back to the defaults of the algorithm that reads
/// them, so one config can drive any registered method.
///
/// # Examples
///
/// ```
/// use u_optflow::OptimizationConfig;
///
/// let config = OptimizationConfig::default()
///     .with_primary_method("bfgs")
///     .with_max_iterations(50)
///     .with_tolerance(1e-8);
/// assert_eq!(config.primary_method.as_deref(), Some("bfgs"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_learning_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub population_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossover_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub swarm_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inertia_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_coef: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_coef: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooling_rate: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_method: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secondary_methods: Vec<String>,
    pub hybrid_config: HybridOptions,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_type: Option<Direction>,

    /// Seed for the stochastic families. `None` draws a random seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Wall-clock budget, checked once per iteration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patience: Option<usize>,
}

impl OptimizationConfig {
    /// Parses a JSON object, warning about and ignoring unknown keys.
    ///
    /// A recognized key holding a value of the wrong type is an
    /// [`OptError::InvalidConfig`].
    pub fn from_json(value: &Value) -> OptResult<Self> {
        if !value.is_object() {
            return Err(OptError::InvalidConfig(
                "configuration must be a JSON object".into(),
            ));
        }
        for key in unknown_keys(value) {
            warn!("ignoring unknown configuration key `{key}`");
        }
        serde_json::from_value(value.clone()).map_err(|e| OptError::InvalidConfig(e.to_string()))
    }

    /// Parses a JSON document. See [`from_json`](Self::from_json).
    pub fn from_json_str(text: &str) -> OptResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| OptError::InvalidConfig(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Serializes the recognized options that are set.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The requested objective direction, minimizing by default.
    pub fn direction(&self) -> Direction {
        self.objective_type.unwrap_or_default()
    }

    /// The primary method name, `"adam"` by default.
    pub fn primary_method_or_default(&self) -> &str {
        self.primary_method
            .as_deref()
            .unwrap_or(defaults::PRIMARY_METHOD)
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.initial_learning_rate = Some(lr);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = Some(tol);
        self
    }

    pub fn with_primary_method(mut self, name: impl Into<String>) -> Self {
        self.primary_method = Some(name.into());
        self
    }

    pub fn with_secondary_methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_methods = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the budget fraction of one hybrid stage.
    pub fn with_method_weight(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.hybrid_config.method_weights.insert(name.into(), weight);
        self
    }

    pub fn with_switch_threshold(mut self, threshold: f64) -> Self {
        self.hybrid_config.switch_threshold = Some(threshold);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.objective_type = Some(direction);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = Some(lower);
        self.upper_bound = Some(upper);
        self
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = Some(n);
        self
    }

    pub fn with_swarm_size(mut self, n: usize) -> Self {
        self.swarm_size = Some(n);
        self
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = Some(t);
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = Some(rate);
        self
    }

    pub fn with_scheduler(mut self, name: impl Into<String>) -> Self {
        self.scheduler = Some(name.into());
        self
    }
}

/// Keys of a JSON configuration that the engine does not recognize,
/// including unknown keys nested in `hybrid_config`.
pub fn unknown_keys(value: &Value) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return Vec::new();
    };
    let mut unknown: Vec<String> = object
        .keys()
        .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
        .cloned()
        .collect();
    if let Some(hybrid) = object.get("hybrid_config").and_then(Value::as_object) {
        unknown.extend(
            hybrid
                .keys()
                .filter(|k| !KNOWN_HYBRID_KEYS.contains(&k.as_str()))
                .map(|k| format!("hybrid_config.{k}")),
        );
    }
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_empty() {
        let config = OptimizationConfig::default();
        assert!(config.max_iterations.is_none());
        assert_eq!(config.primary_method_or_default(), "adam");
        assert_eq!(config.direction(), Direction::Minimize);
        assert_eq!(config.to_json(), json!({ "hybrid_config": {} }));
    }

    #[test]
    fn test_from_json_recognized_keys() {
        let config = OptimizationConfig::from_json(&json!({
            "max_iterations": 250,
            "tolerance": 1e-8,
            "primary_method": "bfgs",
            "secondary_methods": ["sgd", "sa"],
            "hybrid_config": { "method_weights": { "bfgs": 0.5 }, "switch_threshold": 0.05 },
            "objective_type": "maximize"
        }))
        .unwrap();

        assert_eq!(config.max_iterations, Some(250));
        assert_eq!(config.tolerance, Some(1e-8));
        assert_eq!(config.secondary_methods, vec!["sgd", "sa"]);
        assert_eq!(config.hybrid_config.method_weights.get("bfgs"), Some(&0.5));
        assert_eq!(config.hybrid_config.switch_threshold, Some(0.05));
        assert_eq!(config.direction(), Direction::Maximize);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let raw = json!({
            "max_iterations": 10,
            "objective_function": "f",
            "hybrid_config": { "mystery": 1 }
        });
        assert_eq!(
            unknown_keys(&raw),
            vec!["objective_function".to_string(), "hybrid_config.mystery".to_string()]
        );

        let config = OptimizationConfig::from_json(&raw).unwrap();
        assert_eq!(config.max_iterations, Some(10));
    }

    #[test]
    fn test_wrong_type_is_invalid() {
        let err = OptimizationConfig::from_json(&json!({ "max_iterations": "many" })).unwrap_err();
        assert!(matches!(err, OptError::InvalidConfig(_)));
    }

    #[test]
    fn test_non_object_is_invalid() {
        assert!(OptimizationConfig::from_json(&json!([1, 2])).is_err());
        assert!(OptimizationConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = OptimizationConfig::default()
            .with_primary_method("pso")
            .with_bounds(-5.0, 5.0)
            .with_seed(7)
            .with_method_weight("pso", 0.25);
        let back = OptimizationConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(back, config);
    }
}
