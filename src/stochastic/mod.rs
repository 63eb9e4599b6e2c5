//! Stochastic gradient methods.
//!
//! The objective's gradient is treated as a (possibly noisy) estimate: each
//! step moves along `-g` with a decaying rate `η / (1 + η·decay·t)` and never
//! searches along the direction. The objective value is only evaluated when
//! progress is reported, once per epoch.

mod average;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc;

use num_traits::Float;

use crate::callbacks::Callbacks;
use crate::convergence::cst;
use crate::error::ConfigError;
use crate::objective::Objective;
use crate::result::{OptimResult, TerminationReason};
use crate::state::{value_order, OptimState};

pub use average::AverageVector;

/// Stochastic method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StochMethod {
    /// Plain stochastic gradient descent.
    Sgd,
    /// SGD returning the uniform running mean of the iterates (Polyak averaging).
    Asgd,
    /// Stochastic iterative average: SGD with a running mean weighted by the
    /// step index, reported once per epoch.
    Sia,
}

impl StochMethod {
    /// All methods, in declaration order.
    pub const ALL: [StochMethod; 3] = [StochMethod::Sgd, StochMethod::Asgd, StochMethod::Sia];

    /// Textual name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            StochMethod::Sgd => "sgd",
            StochMethod::Asgd => "asgd",
            StochMethod::Sia => "sia",
        }
    }
}

impl fmt::Display for StochMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StochMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StochMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ConfigError::UnknownName {
                kind: "stochastic method",
                name: s.to_string(),
            })
    }
}

/// Configuration for [`StochasticOptimizer`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StochConfig<F> {
    /// Update rule (default: sgd).
    pub method: StochMethod,
    /// Number of epochs (default: 16).
    pub epochs: usize,
    /// Steps per epoch; progress is reported once per epoch (default: 100).
    pub epoch_size: usize,
    /// Initial learning rate, or `None` to pick one from `candidates` with
    /// short trial runs (default: `None`).
    pub alpha0: Option<F>,
    /// Learning-rate decay (default: 0.5).
    pub decay: F,
    /// Relative gradient tolerance (default: 1e-6).
    pub epsilon: F,
    /// Learning rates tried when `alpha0` is `None`
    /// (default: 1e-5, 1e-4, 1e-3, 1e-2, 1e-1, 1, 2, 5, 10).
    pub candidates: Vec<F>,
}

impl<F: Float> StochConfig<F> {
    /// Defaults for `method`.
    pub fn new(method: StochMethod) -> Self {
        let candidates = [1e-5, 1e-4, 1e-3, 1e-2, 1e-1, 1.0, 2.0, 5.0, 10.0]
            .into_iter()
            .filter_map(F::from)
            .collect();
        StochConfig {
            method,
            epochs: 16,
            epoch_size: 100,
            alpha0: None,
            decay: cst(0.5, F::one() / (F::one() + F::one())),
            epsilon: cst(1e-6, F::epsilon().sqrt()),
            candidates,
        }
    }

    /// Total number of steps of a full run, `epochs · epoch_size`.
    pub fn iterations(&self) -> usize {
        self.epochs.saturating_mul(self.epoch_size)
    }

    /// Number of steps of each learning-rate trial, `max(1, iterations / 20)`.
    pub fn tune_iterations(&self) -> usize {
        (self.iterations() / 20).max(1)
    }
}

impl Default for StochConfig<f64> {
    fn default() -> Self {
        StochConfig::new(StochMethod::Sgd)
    }
}

impl Default for StochConfig<f32> {
    fn default() -> Self {
        let mut config = StochConfig::new(StochMethod::Sgd);
        config.epsilon = 1e-4;
        config
    }
}

/// SGD, ASGD and SIA with optional learning-rate tuning.
#[derive(Debug, Clone)]
pub struct StochasticOptimizer<F> {
    config: StochConfig<F>,
}

fn check_rate<F: Float>(rate: F) -> Result<(), ConfigError> {
    if rate > F::zero() && rate.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidLearningRate(rate.to_f64().unwrap_or(f64::NAN)))
    }
}

impl<F: Float> StochasticOptimizer<F> {
    /// Validate `config`; nothing is evaluated yet.
    pub fn new(config: StochConfig<F>) -> Result<Self, ConfigError> {
        if config.epochs == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if config.epoch_size == 0 {
            return Err(ConfigError::ZeroEpochSize);
        }
        if !(config.decay >= F::zero()) || !config.decay.is_finite() {
            return Err(ConfigError::InvalidDecay(config.decay.to_f64().unwrap_or(f64::NAN)));
        }
        if !(config.epsilon > F::zero()) || !config.epsilon.is_finite() {
            return Err(ConfigError::InvalidTolerance(
                config.epsilon.to_f64().unwrap_or(f64::NAN),
            ));
        }
        match config.alpha0 {
            Some(rate) => check_rate(rate)?,
            None if config.candidates.is_empty() => return Err(ConfigError::NoCandidates),
            None => {
                for &rate in &config.candidates {
                    check_rate(rate)?;
                }
            }
        }
        Ok(StochasticOptimizer { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &StochConfig<F> {
        &self.config
    }

    /// Minimize `problem` from `x0`, reporting diagnostics through `log`.
    pub fn minimize<O: Objective<F> + ?Sized>(&self, problem: &O, x0: &[F]) -> OptimResult<F> {
        self.minimize_with(problem, x0, &mut Callbacks::new())
    }

    /// Minimize `problem` from `x0`, tuning the learning rate first if none was configured.
    ///
    /// # Panics
    ///
    /// Panics if `x0.len() != problem.dim()`.
    pub fn minimize_with<O: Objective<F> + ?Sized>(
        &self,
        problem: &O,
        x0: &[F],
        callbacks: &mut Callbacks<'_, F>,
    ) -> OptimResult<F> {
        assert_eq!(x0.len(), problem.dim(), "x0 length must match problem dimension");
        let rate = match self.config.alpha0 {
            Some(rate) => rate,
            None => self.tune(problem, x0),
        };
        self.run(problem, x0, rate, self.config.epoch_size, self.config.iterations(), callbacks)
    }

    /// Like [`StochasticOptimizer::minimize`], but runs the learning-rate
    /// trials concurrently on `pool`.
    pub fn minimize_par<O>(&self, problem: &O, x0: &[F], pool: &rayon::ThreadPool) -> OptimResult<F>
    where
        O: Objective<F> + Sync + ?Sized,
        F: Send + Sync,
    {
        self.minimize_par_with(problem, x0, pool, &mut Callbacks::new())
    }

    /// Like [`StochasticOptimizer::minimize_with`], but runs the learning-rate
    /// trials concurrently on `pool`. Only the final run reports to `callbacks`.
    ///
    /// # Panics
    ///
    /// Panics if `x0.len() != problem.dim()`.
    pub fn minimize_par_with<O>(
        &self,
        problem: &O,
        x0: &[F],
        pool: &rayon::ThreadPool,
        callbacks: &mut Callbacks<'_, F>,
    ) -> OptimResult<F>
    where
        O: Objective<F> + Sync + ?Sized,
        F: Send + Sync,
    {
        assert_eq!(x0.len(), problem.dim(), "x0 length must match problem dimension");
        let rate = match self.config.alpha0 {
            Some(rate) => rate,
            None => self.tune_par(problem, x0, pool),
        };
        let iters = self.config.iterations();
        self.run(problem, x0, rate, self.config.epoch_size, iters, callbacks)
    }

    /// Pick the candidate learning rate whose short trial run ends on the
    /// lowest objective value; ties go to the earlier candidate.
    pub fn tune<O: Objective<F> + ?Sized>(&self, problem: &O, x0: &[F]) -> F {
        let scores: Vec<(usize, F)> = self
            .config
            .candidates
            .iter()
            .enumerate()
            .map(|(i, &rate)| (i, self.trial(problem, x0, rate)))
            .collect();
        self.select(scores)
    }

    /// [`StochasticOptimizer::tune`] with one trial per candidate running on `pool`.
    pub fn tune_par<O>(&self, problem: &O, x0: &[F], pool: &rayon::ThreadPool) -> F
    where
        O: Objective<F> + Sync + ?Sized,
        F: Send + Sync,
    {
        let (tx, rx) = mpsc::channel();
        pool.scope(move |s| {
            for (i, &rate) in self.config.candidates.iter().enumerate() {
                let tx = tx.clone();
                s.spawn(move |_| {
                    // the receiver lives until after the scope
                    let _ = tx.send((i, self.trial(problem, x0, rate)));
                });
            }
        });

        let mut scores: Vec<(usize, F)> = rx.into_iter().collect();
        scores.sort_by_key(|&(i, _)| i);
        self.select(scores)
    }

    fn select(&self, scores: Vec<(usize, F)>) -> F {
        let method = self.config.method;
        let mut best: Option<(usize, F)> = None;
        for (i, f) in scores {
            let rate = self.config.candidates[i];
            log::debug!(
                "{method}: learning rate {:e} reaches f = {:e}",
                rate.to_f64().unwrap_or(f64::NAN),
                f.to_f64().unwrap_or(f64::NAN),
            );
            let better = match best {
                None => true,
                Some((_, fb)) => value_order(f, fb) == Ordering::Less,
            };
            if better {
                best = Some((i, f));
            }
        }

        let rate = best.map_or(F::one(), |(i, _)| self.config.candidates[i]);
        log::info!(
            "{method}: selected learning rate {:e}",
            rate.to_f64().unwrap_or(f64::NAN)
        );
        rate
    }

    /// Objective value at the end of a short run at `rate`; a diverging rate
    /// scores its last (possibly non-finite) value, not the starting point.
    fn trial<O: Objective<F> + ?Sized>(&self, problem: &O, x0: &[F], rate: F) -> F {
        let iters = self.config.tune_iterations();
        let mut last = F::nan();
        let mut callbacks = Callbacks::new().on_iteration(|s: &OptimState<F>| {
            last = s.f;
            true
        });
        self.run(problem, x0, rate, iters, iters, &mut callbacks);
        drop(callbacks);
        last
    }

    fn run<O: Objective<F> + ?Sized>(
        &self,
        problem: &O,
        x0: &[F],
        rate0: F,
        report_every: usize,
        iters: usize,
        callbacks: &mut Callbacks<'_, F>,
    ) -> OptimResult<F> {
        let mut state = OptimState::new(problem, x0);
        let mut result = OptimResult::new(&state);
        let mut avg = AverageVector::new(x0.len());
        let mut termination = TerminationReason::MaxIterations;
        let method = self.config.method;
        let eps = self.config.epsilon;

        for t in 0..iters {
            // the gradient at x is fresh: every step re-evaluates it
            if method != StochMethod::Sia && state.converged(eps) {
                result.update(&state);
                callbacks.iteration(&state);
                termination = TerminationReason::Converged;
                break;
            }

            let rate = self.rate(rate0, t);
            state.steepest_descent();
            state.step(problem, rate);

            match method {
                StochMethod::Sgd => {}
                StochMethod::Asgd => avg.update(&state.x, F::one()),
                StochMethod::Sia => avg.update(&state.x, index(t + 1)),
            }

            if (t + 1) % report_every != 0 && t + 1 != iters {
                continue;
            }

            let reported = match method {
                // progress of SIA is that of its average; the trajectory is left alone
                StochMethod::Sia => probe(problem, &mut state, avg.value()),
                StochMethod::Sgd | StochMethod::Asgd => state.clone(),
            };
            result.update(&reported);
            if !callbacks.iteration(&reported) {
                termination = TerminationReason::UserTerminated;
                break;
            }
            if reported.converged(eps) {
                termination = TerminationReason::Converged;
                break;
            }
        }

        let last = match method {
            StochMethod::Sgd => state,
            StochMethod::Asgd | StochMethod::Sia if avg.total_weight() > F::zero() => {
                probe(problem, &mut state, avg.value())
            }
            StochMethod::Asgd | StochMethod::Sia => state,
        };
        result.finish(&last, termination);
        log::debug!(
            "{method}: {} after {} reports (f = {:e})",
            result.termination,
            result.iterations(),
            result.value().to_f64().unwrap_or(f64::NAN),
        );
        result
    }

    /// `η / (1 + η·decay·t)`.
    fn rate(&self, rate0: F, t: usize) -> F {
        rate0 / (F::one() + rate0 * self.config.decay * index(t))
    }
}

fn index<F: Float>(t: usize) -> F {
    F::from(t).unwrap_or_else(F::max_value)
}

/// State evaluated at `x`, charging the evaluation to `state`'s counters.
fn probe<F: Float, O: Objective<F> + ?Sized>(
    problem: &O,
    state: &mut OptimState<F>,
    x: &[F],
) -> OptimState<F> {
    let mut probed = state.clone();
    probed.reset_to(problem, x);
    state.n_grad_calls = probed.n_grad_calls;
    probed
}
