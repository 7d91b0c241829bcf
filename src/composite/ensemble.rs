//! Independent runs folded into one answer.

use crate::config::OptimizationConfig;
use crate::context::{float_codec, RunContext, RunResult};
use crate::error::{OptError, OptResult};
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use crate::registry::MethodRegistry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Elementwise mean of the members' final parameters.
    #[serde(with = "float_codec::seq")]
    pub ensemble_parameters: Vec<f64>,

    /// Variant name (as requested) of the member with the lowest loss.
    pub best_method: String,

    #[serde(with = "float_codec::scalar")]
    pub best_loss: f64,

    /// Member results, in variant order.
    pub method_results: Vec<RunResult>,
}

/// Ensemble result together with the finished member contexts.
#[derive(Debug, Clone)]
pub struct Ensemble {
    pub result: EnsembleResult,
    pub members: Vec<RunContext>,
}

/// Runs one member per method variant and folds the results.
///
/// Members share nothing but the objective, so with the `parallel` feature
/// they run on rayon workers. The first member error aborts the ensemble.
///
/// # Examples
///
/// ```
/// use u_optflow::composite::EnsembleRunner;
/// use u_optflow::objective::{GradientFn, ObjectiveAdapter};
/// use u_optflow::OptimizationConfig;
///
/// let objective = ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| {
///     (x[0] * x[0], vec![2.0 * x[0]])
/// }));
/// let base = OptimizationConfig::default().with_max_iterations(50);
/// let ensemble = EnsembleRunner::run(&base, &[2.0], &["bfgs", "nonlinear_cg"], &objective).unwrap();
/// assert_eq!(ensemble.result.method_results.len(), 2);
/// ```
pub struct EnsembleRunner;

impl EnsembleRunner {
    pub fn run<S: AsRef<str> + Sync>(
        base: &OptimizationConfig,
        initial_parameters: &[f64],
        variants: &[S],
        objective: &ObjectiveAdapter,
    ) -> OptResult<Ensemble> {
        if variants.is_empty() {
            return Err(OptError::InvalidConfig(
                "ensemble needs at least one method variant".into(),
            ));
        }

        let run_member = |variant: &S| -> OptResult<RunContext> {
            let mut options = base.clone();
            options.primary_method = Some(variant.as_ref().to_string());
            let mut ctx = RunContext::new(
                Uuid::new_v4().to_string(),
                initial_parameters.to_vec(),
                options,
            );
            MethodRegistry::get(variant.as_ref())(&mut ctx, objective)?;
            Ok(ctx)
        };

        #[cfg(feature = "parallel")]
        let members: Vec<RunContext> = {
            use rayon::prelude::*;
            variants.par_iter().map(run_member).collect::<OptResult<_>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let members: Vec<RunContext> = variants.iter().map(run_member).collect::<OptResult<_>>()?;

        let method_results: Vec<RunResult> = members.iter().map(RunContext::result).collect();
        let result = fold(variants, method_results)?;
        Ok(Ensemble { result, members })
    }
}

fn fold<S: AsRef<str>>(variants: &[S], method_results: Vec<RunResult>) -> OptResult<EnsembleResult> {
    let finals: Vec<Vec<f64>> = method_results.iter().map(|r| r.parameters.clone()).collect();
    let ensemble_parameters = linalg::mean_rows(&finals).ok_or_else(|| {
        OptError::InvalidConfig("ensemble members returned no parameters".into())
    })?;

    let mut best = 0;
    for (i, r) in method_results.iter().enumerate().skip(1) {
        if r.final_loss < method_results[best].final_loss {
            best = i;
        }
    }

    Ok(EnsembleResult {
        ensemble_parameters,
        best_method: variants[best].as_ref().to_string(),
        best_loss: method_results[best].final_loss,
        method_results,
    })
}
