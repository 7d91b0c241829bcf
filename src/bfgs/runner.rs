//! BFGS loop and inverse-Hessian update.

use super::config::BfgsConfig;
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::line_search;
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use log::debug;

/// Executes BFGS.
pub struct BfgsRunner;

impl BfgsRunner {
    pub const NAME: &'static str = "bfgs";

    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = BfgsConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &BfgsConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut x = ctx.current_parameters().to_vec();
        let n = x.len();
        let mut h = InverseHessian::identity(n);

        let (mut f, mut g) = objective.loss_and_gradient(&x)?;
        if !f.is_finite() || !linalg::all_finite(&g) {
            debug!("bfgs: non-finite loss or gradient at the starting point");
            return ctx.complete(x, TerminationReason::Diverged);
        }
        ctx.log_step(0, f, &x, Some(&g), &[])?;

        for i in 1..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(x, TerminationReason::Cancelled);
            }

            let p: Vec<f64> = h.apply(&g).into_iter().map(|v| -v).collect();
            let slope = linalg::dot(&g, &p);
            let step = line_search::backtracking(objective, &x, f, slope, &p)?;

            let (f_new, g_new) = objective.loss_and_gradient(&step.point)?;
            if !f_new.is_finite() || !linalg::all_finite(&g_new) {
                debug!("bfgs diverged at iteration {i}");
                return ctx.complete(x, TerminationReason::Diverged);
            }

            let s = linalg::sub(&step.point, &x);
            let y = linalg::sub(&g_new, &g);
            let ys = linalg::dot(&y, &s);
            let updated = ys > config.curvature_threshold;
            if updated {
                h.update(&s, &y, ys);
            } else {
                debug!("bfgs: curvature yᵀs = {ys:e} too small, keeping H");
            }

            let extra = [
                ("alpha", step.alpha),
                ("hessian_updated", if updated { 1.0 } else { 0.0 }),
            ];
            ctx.log_step(i, f_new, &step.point, Some(&g_new), &extra)?;

            if linalg::norm(&g_new) < config.tolerance {
                return ctx.complete(step.point, TerminationReason::Converged);
            }
            if (f_new - f).abs() < config.tolerance {
                return ctx.complete(step.point, TerminationReason::SmallImprovement);
            }

            x = step.point;
            f = f_new;
            g = g_new;
        }

        ctx.complete(x, TerminationReason::MaxIterations)
    }
}

/// Dense symmetric `n × n` matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
struct InverseHessian {
    n: usize,
    data: Vec<f64>,
}

impl InverseHessian {
    fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self { n, data }
    }

    fn apply(&self, v: &[f64]) -> Vec<f64> {
        self.data
            .chunks(self.n)
            .map(|row| linalg::dot(row, v))
            .collect()
    }

    /// `H ← H - ρ(s·(Hy)ᵀ + Hy·sᵀ) + (ρ²·yᵀHy + ρ)·s·sᵀ`, the expanded
    /// form of the product update for symmetric `H`.
    fn update(&mut self, s: &[f64], y: &[f64], ys: f64) {
        let rho = 1.0 / ys;
        let hy = self.apply(y);
        let yhy = linalg::dot(y, &hy);
        let ss_coef = rho * rho * yhy + rho;
        let n = self.n;
        for i in 0..n {
            for j in 0..n {
                self.data[i * n + j] += -rho * (s[i] * hy[j] + hy[i] * s[j]) + ss_coef * s[i] * s[j];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizationConfig;
    use crate::objective::{GradientFn, ScalarFn};

    fn sphere() -> ObjectiveAdapter {
        ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| {
            (x.iter().map(|v| v * v).sum(), x.iter().map(|v| 2.0 * v).collect())
        }))
    }

    /// f(x, y) = (1 - x)² + 100 (y - x²)²
    fn rosenbrock() -> ObjectiveAdapter {
        ObjectiveAdapter::minimize(GradientFn(|p: &[f64]| {
            let (x, y) = (p[0], p[1]);
            let f = (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2);
            let gx = -2.0 * (1.0 - x) - 400.0 * x * (y - x * x);
            let gy = 200.0 * (y - x * x);
            (f, vec![gx, gy])
        }))
    }

    #[test]
    fn test_converges_on_sphere() {
        let mut ctx = RunContext::new("b", vec![5.0], OptimizationConfig::default());
        let result = BfgsRunner::run(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.termination_reason, Some(TerminationReason::Converged));
        assert!(result.iterations <= 50);
        let last = ctx.steps().last().unwrap();
        assert!(last.gradient_norm.unwrap() < 1e-6);
        assert_eq!(last.extra("alpha"), Some(0.5));
    }

    #[test]
    fn test_converges_on_sphere_3d() {
        let mut ctx = RunContext::new("b", vec![5.0, -2.0, 1.0], OptimizationConfig::default());
        let result = BfgsRunner::run(&mut ctx, &sphere()).unwrap();
        assert!(result.iterations <= 50);
        assert!(result.final_loss < 1e-10);
    }

    #[test]
    fn test_rosenbrock() {
        let options = OptimizationConfig::default()
            .with_max_iterations(500)
            .with_tolerance(1e-12);
        let mut ctx = RunContext::new("b", vec![-1.2, 1.0], options);
        let result = BfgsRunner::run(&mut ctx, &rosenbrock()).unwrap();
        assert!(
            (result.parameters[0] - 1.0).abs() < 1e-3 && (result.parameters[1] - 1.0).abs() < 1e-3,
            "x = {:?}",
            result.parameters
        );
    }

    #[test]
    fn test_budget_counts_initial_point() {
        let options = OptimizationConfig::default()
            .with_max_iterations(3)
            .with_tolerance(0.0);
        let mut ctx = RunContext::new("b", vec![-1.2, 1.0], options);
        let result = BfgsRunner::run(&mut ctx, &rosenbrock()).unwrap();
        assert_eq!(result.iterations, 3);
        assert_eq!(result.termination_reason, Some(TerminationReason::MaxIterations));
        assert_eq!(ctx.steps()[0].iteration, 0);
        assert!(ctx.steps()[0].extra.is_empty());
    }

    #[test]
    fn test_single_step_budget() {
        let options = OptimizationConfig::default().with_max_iterations(1);
        let mut ctx = RunContext::new("b", vec![5.0], options);
        let result = BfgsRunner::run(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_flat_objective_skips_update() {
        // linear objective: y = 0 so the curvature test fails every time
        let linear = ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| (x[0], vec![1.0])));
        let options = OptimizationConfig::default()
            .with_max_iterations(4)
            .with_tolerance(0.0);
        let mut ctx = RunContext::new("b", vec![0.0], options);
        BfgsRunner::run(&mut ctx, &linear).unwrap();
        for step in &ctx.steps()[1..] {
            assert_eq!(step.extra("hessian_updated"), Some(0.0));
            assert_eq!(step.extra("alpha"), Some(1.0));
        }
    }

    #[test]
    fn test_diverged_at_start() {
        let bad = ObjectiveAdapter::minimize(ScalarFn(|_: &[f64]| f64::NAN));
        let mut ctx = RunContext::new("b", vec![1.0], OptimizationConfig::default());
        let result = BfgsRunner::run(&mut ctx, &bad).unwrap();
        assert_eq!(result.termination_reason, Some(TerminationReason::Diverged));
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_update_matches_secant_equation() {
        let mut h = InverseHessian::identity(2);
        let s = [1.0, 0.5];
        let y = [2.0, 3.0];
        h.update(&s, &y, linalg::dot(&y, &s));
        // H+ y = s
        let hy = h.apply(&y);
        assert!((hy[0] - s[0]).abs() < 1e-12 && (hy[1] - s[1]).abs() < 1e-12);
        // symmetric
        assert!((h.data[1] - h.data[2]).abs() < 1e-12);
    }
}
