//! Context store.
//!
//! [`OptimizationEngine`] keeps runs by id so that callers can create a run,
//! drive it with a single method or a hybrid chain, inspect it, and move it
//! in and out of JSON checkpoints. The objective direction is read from each
//! run's `objective_type`.

use crate::composite::{EnsembleResult, EnsembleRunner, HybridRunner};
use crate::config::OptimizationConfig;
use crate::context::{RunContext, RunResult};
use crate::error::{OptError, OptResult};
use crate::objective::{Differentiator, Objective, ObjectiveAdapter};
use crate::registry::MethodRegistry;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Runs stored by id.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_optflow::objective::ScalarFn;
/// use u_optflow::{OptimizationConfig, OptimizationEngine};
///
/// let mut engine = OptimizationEngine::new();
/// let config = OptimizationConfig::default().with_primary_method("bfgs");
/// let id = engine.create_context(vec![3.0, -1.0], config, None);
///
/// let sphere = Arc::new(ScalarFn(|x: &[f64]| x.iter().map(|v| v * v).sum::<f64>()));
/// let result = engine.run(&id, sphere).unwrap();
/// assert!(result.final_loss < 1e-8);
///
/// let saved = engine.checkpoint(&id).unwrap();
/// engine.remove(&id).unwrap();
/// assert_eq!(engine.restore(&saved).unwrap(), id);
/// ```
#[derive(Default)]
pub struct OptimizationEngine {
    contexts: HashMap<String, RunContext>,
    differentiator: Option<Arc<dyn Differentiator>>,
}

impl OptimizationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `differentiator` for objectives that return no gradient
    /// (central finite differences otherwise).
    pub fn with_differentiator(mut self, differentiator: Arc<dyn Differentiator>) -> Self {
        self.differentiator = Some(differentiator);
        self
    }

    /// Stores a new run and returns its id (a fresh UUID when `id` is
    /// `None`). An existing run with the same id is replaced.
    pub fn create_context(
        &mut self,
        initial_parameters: Vec<f64>,
        config: OptimizationConfig,
        id: Option<String>,
    ) -> String {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let ctx = RunContext::new(id.clone(), initial_parameters, config);
        if self.contexts.insert(id.clone(), ctx).is_some() {
            debug!("replaced optimization context {id}");
        }
        id
    }

    /// Runs the stored context with its `primary_method` (Adam by default,
    /// and for unknown names).
    pub fn run(&mut self, id: &str, objective: Arc<dyn Objective>) -> OptResult<RunResult> {
        let adapter = self.adapter(id, objective)?;
        let ctx = self.context_mut(id)?;
        let algorithm = MethodRegistry::get(ctx.config().primary_method_or_default());
        algorithm(ctx, &adapter)
    }

    /// Runs the stored context as a hybrid chain of `primary_method`
    /// followed by `secondary_methods`.
    pub fn run_hybrid(&mut self, id: &str, objective: Arc<dyn Objective>) -> OptResult<RunResult> {
        let adapter = self.adapter(id, objective)?;
        let ctx = self.context_mut(id)?;
        HybridRunner::run(ctx, &adapter)
    }

    /// Runs one stored member per variant from `initial_parameters` and
    /// folds the results.
    pub fn run_ensemble<S: AsRef<str> + Sync>(
        &mut self,
        base: &OptimizationConfig,
        initial_parameters: &[f64],
        variants: &[S],
        objective: Arc<dyn Objective>,
    ) -> OptResult<EnsembleResult> {
        let adapter = self.make_adapter(objective, base);
        let ensemble = EnsembleRunner::run(base, initial_parameters, variants, &adapter)?;
        for member in ensemble.members {
            self.contexts.insert(member.id().to_string(), member);
        }
        Ok(ensemble.result)
    }

    pub fn context(&self, id: &str) -> OptResult<&RunContext> {
        self.contexts
            .get(id)
            .ok_or_else(|| OptError::UnknownContext(id.to_string()))
    }

    /// JSON checkpoint of a stored run.
    pub fn checkpoint(&self, id: &str) -> OptResult<String> {
        self.context(id)?.serialize()
    }

    /// Stores a run decoded from a checkpoint and returns its id.
    pub fn restore(&mut self, checkpoint: &str) -> OptResult<String> {
        let ctx = RunContext::deserialize(checkpoint)?;
        let id = ctx.id().to_string();
        self.contexts.insert(id.clone(), ctx);
        Ok(id)
    }

    /// Stores a fresh run continuing from the best parameters of `id` and
    /// returns the new id.
    pub fn resume(&mut self, id: &str) -> OptResult<String> {
        let next = self.context(id)?.resume(Uuid::new_v4().to_string());
        let next_id = next.id().to_string();
        self.contexts.insert(next_id.clone(), next);
        Ok(next_id)
    }

    pub fn remove(&mut self, id: &str) -> OptResult<RunContext> {
        self.contexts
            .remove(id)
            .ok_or_else(|| OptError::UnknownContext(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn context_mut(&mut self, id: &str) -> OptResult<&mut RunContext> {
        self.contexts
            .get_mut(id)
            .ok_or_else(|| OptError::UnknownContext(id.to_string()))
    }

    fn adapter(&self, id: &str, objective: Arc<dyn Objective>) -> OptResult<ObjectiveAdapter> {
        let config = self.context(id)?.config();
        Ok(self.make_adapter(objective, config))
    }

    fn make_adapter(&self, objective: Arc<dyn Objective>, config: &OptimizationConfig) -> ObjectiveAdapter {
        let adapter = ObjectiveAdapter::new(objective, config.direction());
        match &self.differentiator {
            Some(d) => adapter.with_differentiator(Arc::clone(d)),
            None => adapter,
        }
    }
}
