//! Run context, lifecycle and results.

use super::control::RunControl;
use super::float_codec;
use super::step::{StepRecord, TerminationReason};
use crate::config::OptimizationConfig;
use crate::error::{OptError, OptResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lifecycle state of a run. Transitions are strictly one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    Finished(TerminationReason),
}

impl Lifecycle {
    fn name(self) -> &'static str {
        match self {
            Lifecycle::Created => "created",
            Lifecycle::Running => "running",
            Lifecycle::Finished(_) => "finished",
        }
    }
}

/// Immutable summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub id: String,

    /// Best sign-normalized loss observed.
    #[serde(with = "float_codec::scalar")]
    pub final_loss: f64,

    /// Parameters achieving `final_loss` (current parameters if no step
    /// was logged).
    #[serde(with = "float_codec::seq")]
    pub parameters: Vec<f64>,

    /// Number of recorded steps.
    pub iterations: usize,

    pub elapsed_ms: f64,
    pub termination_reason: Option<TerminationReason>,
    pub method: String,
}

/// Mutable state of one optimization run.
///
/// # Examples
///
/// ```
/// use u_optflow::{OptimizationConfig, RunContext, TerminationReason};
///
/// let mut ctx = RunContext::new("demo", vec![1.0], OptimizationConfig::default());
/// ctx.start("manual").unwrap();
/// ctx.log_step(0, 4.0, &[1.0], None, &[]).unwrap();
/// ctx.log_step(1, 1.0, &[0.5], Some(&[1.0]), &[("alpha", 0.5)]).unwrap();
/// ctx.finish(TerminationReason::MaxIterations).unwrap();
///
/// let result = ctx.result();
/// assert_eq!(result.final_loss, 1.0);
/// assert_eq!(result.parameters, vec![0.5]);
/// assert_eq!(result.iterations, 2);
/// ```
#[derive(Debug, Clone)]
pub struct RunContext {
    id: String,
    initial_parameters: Vec<f64>,
    current_parameters: Vec<f64>,
    config: OptimizationConfig,
    method: Option<String>,
    steps: Vec<StepRecord>,
    loss_history: Vec<f64>,
    best_loss: f64,
    best_parameters: Option<Vec<f64>>,
    start_time: Option<f64>,
    end_time: Option<f64>,
    termination_reason: Option<TerminationReason>,
    control: RunControl,
}

impl RunContext {
    /// Creates a run in the `Created` state. The parameter dimension is
    /// fixed for the lifetime of the run.
    pub fn new(id: impl Into<String>, initial_parameters: Vec<f64>, config: OptimizationConfig) -> Self {
        let control = control_from(&config);
        Self {
            id: id.into(),
            current_parameters: initial_parameters.clone(),
            initial_parameters,
            config,
            method: None,
            steps: Vec::new(),
            loss_history: Vec::new(),
            best_loss: f64::INFINITY,
            best_parameters: None,
            start_time: None,
            end_time: None,
            termination_reason: None,
            control,
        }
    }

    /// Attaches a cancellation flag checked at every iteration boundary.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.control = self.control.with_cancel(flag);
        self
    }

    /// Replaces the stop conditions of this run.
    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dimension(&self) -> usize {
        self.initial_parameters.len()
    }

    pub fn initial_parameters(&self) -> &[f64] {
        &self.initial_parameters
    }

    pub fn current_parameters(&self) -> &[f64] {
        &self.current_parameters
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    /// Name of the method driving the run, once started.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Loss of each recorded step, in order.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    /// Best loss so far; `+inf` before the first step.
    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_parameters(&self) -> Option<&[f64]> {
        self.best_parameters.as_deref()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination_reason
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match (self.termination_reason, self.start_time) {
            (Some(reason), _) => Lifecycle::Finished(reason),
            (None, Some(_)) => Lifecycle::Running,
            (None, None) => Lifecycle::Created,
        }
    }

    /// Transitions `Created → Running`, recording the start time and the
    /// method name, and arms the deadline if one is configured.
    pub fn start(&mut self, method: &str) -> OptResult<()> {
        self.expect_state(Lifecycle::Created, "start")?;
        if self.initial_parameters.is_empty() {
            return Err(OptError::InvalidConfig(
                "parameter vector must not be empty".into(),
            ));
        }
        self.start_time = Some(now_secs());
        self.method = Some(method.to_string());
        self.control.arm();
        debug!("run {} started with {method} (n = {})", self.id, self.dimension());
        Ok(())
    }

    /// Appends a step and updates the best-so-far on strict improvement.
    pub fn log_step(
        &mut self,
        iteration: usize,
        loss: f64,
        parameters: &[f64],
        gradient: Option<&[f64]>,
        extra: &[(&str, f64)],
    ) -> OptResult<()> {
        let step = StepRecord {
            iteration,
            loss,
            parameters: parameters.to_vec(),
            gradient: gradient.map(<[f64]>::to_vec),
            gradient_norm: gradient.map(crate::linalg::norm),
            extra: extra
                .iter()
                .map(|&(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
            timestamp: now_secs(),
        };
        self.append_step(step)
    }

    /// Appends an already-built record (used when folding sub-runs).
    pub(crate) fn append_step(&mut self, step: StepRecord) -> OptResult<()> {
        self.expect_state(Lifecycle::Running, "log a step in")?;
        self.check_dimension(step.parameters.len())?;
        if let Some(g) = &step.gradient {
            self.check_dimension(g.len())?;
        }
        if step.loss < self.best_loss {
            self.best_loss = step.loss;
            self.best_parameters = Some(step.parameters.clone());
        }
        self.loss_history.push(step.loss);
        self.steps.push(step);
        Ok(())
    }

    /// Replaces the current parameter vector.
    pub fn set_parameters(&mut self, parameters: Vec<f64>) -> OptResult<()> {
        self.check_dimension(parameters.len())?;
        self.current_parameters = parameters;
        Ok(())
    }

    /// Transitions `Running → Finished(reason)`.
    pub fn finish(&mut self, reason: TerminationReason) -> OptResult<()> {
        self.expect_state(Lifecycle::Running, "finish")?;
        self.end_time = Some(now_secs());
        self.termination_reason = Some(reason);
        debug!(
            "run {} finished: {reason} after {} steps, best loss {}",
            self.id,
            self.steps.len(),
            self.best_loss
        );
        Ok(())
    }

    /// Stores the final parameters, finishes the run and summarizes it.
    pub(crate) fn complete(
        &mut self,
        parameters: Vec<f64>,
        reason: TerminationReason,
    ) -> OptResult<RunResult> {
        self.set_parameters(parameters)?;
        self.finish(reason)?;
        Ok(self.result())
    }

    /// Parameters of the most recent step, or the current parameters when
    /// nothing was logged yet.
    pub(crate) fn last_logged_parameters(&self) -> Vec<f64> {
        self.steps
            .last()
            .map(|s| s.parameters.clone())
            .unwrap_or_else(|| self.current_parameters.clone())
    }

    /// Whether the last two recorded losses differ by less than `tol`.
    pub(crate) fn loss_delta_below(&self, tol: f64) -> bool {
        match self.loss_history.as_slice() {
            [.., prev, last] => (last - prev).abs() < tol,
            _ => false,
        }
    }

    /// Whether cancellation was requested or the deadline has passed.
    pub fn should_stop(&self) -> bool {
        self.control.should_stop()
    }

    pub fn result(&self) -> RunResult {
        let elapsed_ms = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).max(0.0) * 1000.0,
            _ => 0.0,
        };
        RunResult {
            id: self.id.clone(),
            final_loss: self.best_loss,
            parameters: self
                .best_parameters
                .clone()
                .unwrap_or_else(|| self.current_parameters.clone()),
            iterations: self.steps.len(),
            elapsed_ms,
            termination_reason: self.termination_reason,
            method: self.method.clone().unwrap_or_else(|| "unknown".into()),
        }
    }

    /// Encodes the run as a JSON checkpoint.
    pub fn serialize(&self) -> OptResult<String> {
        let checkpoint = Checkpoint {
            id: self.id.clone(),
            initial_parameters: self.initial_parameters.clone(),
            current_parameters: self.current_parameters.clone(),
            config: self.config.clone(),
            method: self.method.clone(),
            steps: self.steps.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            best_loss: self.best_loss,
            best_parameters: self.best_parameters.clone(),
            termination_reason: self.termination_reason,
        };
        Ok(serde_json::to_string(&checkpoint)?)
    }

    /// Restores a run from a JSON checkpoint. The loss history is rebuilt
    /// from the step records.
    pub fn deserialize(text: &str) -> OptResult<Self> {
        let cp: Checkpoint = serde_json::from_str(text)?;
        let n = cp.initial_parameters.len();
        let lengths = std::iter::once(cp.current_parameters.len())
            .chain(cp.best_parameters.iter().map(Vec::len))
            .chain(cp.steps.iter().map(|s| s.parameters.len()))
            .chain(cp.steps.iter().filter_map(|s| s.gradient.as_ref().map(Vec::len)));
        for found in lengths {
            if found != n {
                return Err(OptError::DimensionMismatch { expected: n, found });
            }
        }

        let control = control_from(&cp.config);
        Ok(Self {
            id: cp.id,
            initial_parameters: cp.initial_parameters,
            current_parameters: cp.current_parameters,
            config: cp.config,
            method: cp.method,
            loss_history: cp.steps.iter().map(|s| s.loss).collect(),
            steps: cp.steps,
            best_loss: cp.best_loss,
            best_parameters: cp.best_parameters,
            start_time: cp.start_time,
            end_time: cp.end_time,
            termination_reason: cp.termination_reason,
            control,
        })
    }

    /// A fresh `Created` run continuing from this run's best parameters
    /// with the same configuration.
    pub fn resume(&self, id: impl Into<String>) -> Self {
        let start = self
            .best_parameters
            .clone()
            .unwrap_or_else(|| self.current_parameters.clone());
        Self::new(id, start, self.config.clone())
    }

    fn expect_state(&self, expected: Lifecycle, operation: &'static str) -> OptResult<()> {
        let state = self.lifecycle();
        let ok = matches!(
            (expected, state),
            (Lifecycle::Created, Lifecycle::Created) | (Lifecycle::Running, Lifecycle::Running)
        );
        if ok {
            Ok(())
        } else {
            Err(OptError::Lifecycle {
                state: state.name(),
                operation,
            })
        }
    }

    fn check_dimension(&self, found: usize) -> OptResult<()> {
        let expected = self.dimension();
        if found == expected {
            Ok(())
        } else {
            Err(OptError::DimensionMismatch { expected, found })
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Checkpoint {
    id: String,
    #[serde(with = "float_codec::seq")]
    initial_parameters: Vec<f64>,
    #[serde(with = "float_codec::seq")]
    current_parameters: Vec<f64>,
    config: OptimizationConfig,
    #[serde(default)]
    method: Option<String>,
    steps: Vec<StepRecord>,
    start_time: Option<f64>,
    end_time: Option<f64>,
    #[serde(with = "float_codec::scalar")]
    best_loss: f64,
    #[serde(with = "float_codec::opt_seq")]
    best_parameters: Option<Vec<f64>>,
    termination_reason: Option<TerminationReason>,
}

fn control_from(config: &OptimizationConfig) -> RunControl {
    match config.time_limit_ms {
        Some(ms) => RunControl::default().with_time_limit(Duration::from_millis(ms)),
        None => RunControl::default(),
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
