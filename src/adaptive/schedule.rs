//! Learning-rate schedule state.

use super::config::Scheduler;
use std::f64::consts::PI;

/// Relative improvement a plateau schedule requires.
const PLATEAU_THRESHOLD: f64 = 1e-4;

/// Smallest change a plateau reduction is allowed to make.
const PLATEAU_EPS: f64 = 1e-8;

#[derive(Debug, Clone)]
pub(crate) struct LearningRate {
    scheduler: Scheduler,
    base: f64,
    current: f64,
    horizon: usize,
    steps: usize,
    best: f64,
    bad_steps: usize,
}

impl LearningRate {
    pub(crate) fn new(scheduler: Scheduler, base: f64, horizon: usize) -> Self {
        Self {
            scheduler,
            base,
            current: base,
            horizon,
            steps: 0,
            best: f64::INFINITY,
            bad_steps: 0,
        }
    }

    pub(crate) fn current(&self) -> f64 {
        self.current
    }

    /// Advances the schedule after an update; `loss` feeds the plateau rule.
    pub(crate) fn advance(&mut self, loss: f64) {
        self.steps += 1;
        match self.scheduler {
            Scheduler::Constant => {}
            Scheduler::Cosine => {
                let t = self.steps.min(self.horizon) as f64;
                self.current = 0.5 * self.base * (1.0 + (PI * t / self.horizon as f64).cos());
            }
            Scheduler::Step { step_size, gamma } => {
                let decays = (self.steps / step_size) as i32;
                self.current = self.base * gamma.powi(decays);
            }
            Scheduler::Plateau { factor, patience } => {
                let improved =
                    self.best.is_infinite() || loss < self.best - self.best.abs() * PLATEAU_THRESHOLD;
                if improved {
                    self.best = loss;
                    self.bad_steps = 0;
                } else {
                    self.bad_steps += 1;
                }
                if self.bad_steps > patience {
                    let reduced = self.current * factor;
                    if self.current - reduced > PLATEAU_EPS {
                        self.current = reduced;
                    }
                    self.bad_steps = 0;
                }
            }
        }
    }
}
