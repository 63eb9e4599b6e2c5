use std::fmt;
use std::str::FromStr;

use num_traits::Float;

use super::cgd::CgdBeta;
use super::lbfgs::History;
use crate::callbacks::Callbacks;
use crate::convergence::{cst, ConvergenceParams};
use crate::error::ConfigError;
use crate::line_search::{LineSearch, LineSearchKind, StepInit, StepInitializer};
use crate::objective::Objective;
use crate::result::{OptimResult, TerminationReason};
use crate::state::OptimState;

/// Deterministic (full-gradient) method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BatchMethod {
    /// Gradient descent, `d = -g`.
    Gd,
    /// Nonlinear conjugate gradient with the given update formula.
    Cgd(CgdBeta),
    /// Limited-memory BFGS.
    Lbfgs,
}

impl BatchMethod {
    /// Every method, gradient descent first.
    pub fn all() -> impl Iterator<Item = BatchMethod> {
        std::iter::once(BatchMethod::Gd)
            .chain(CgdBeta::ALL.into_iter().map(BatchMethod::Cgd))
            .chain(std::iter::once(BatchMethod::Lbfgs))
    }
}

impl fmt::Display for BatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchMethod::Gd => f.write_str("gd"),
            BatchMethod::Cgd(beta) => write!(f, "cgd-{beta}"),
            BatchMethod::Lbfgs => f.write_str("lbfgs"),
        }
    }
}

impl FromStr for BatchMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownName {
            kind: "batch method",
            name: s.to_string(),
        };
        match s.to_ascii_lowercase().as_str() {
            "gd" => Ok(BatchMethod::Gd),
            "lbfgs" => Ok(BatchMethod::Lbfgs),
            other => match other.strip_prefix("cgd-") {
                Some(beta) => beta.parse().map(BatchMethod::Cgd).map_err(|_| unknown()),
                None => Err(unknown()),
            },
        }
    }
}

/// Configuration for [`BatchOptimizer`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchConfig<F> {
    /// Direction update.
    pub method: BatchMethod,
    /// Line-search strategy (default: interpolation-cubic, cg-descent for CGD).
    pub line_search: LineSearchKind,
    /// Sufficient-decrease constant (default: 1e-4).
    pub c1: F,
    /// Curvature constant (default: 0.9 for L-BFGS, 0.1 otherwise).
    pub c2: F,
    /// Iteration budget and gradient tolerance.
    pub convergence: ConvergenceParams<F>,
    /// Number of L-BFGS pairs kept (default: 6).
    pub history_size: usize,
    /// First trial length of each line search (default: consistent for GD, unit otherwise).
    pub step_init: StepInit,
    /// Restart CGD with `d = -g` every this many iterations; 0 never restarts (default: 0).
    pub restart_interval: usize,
}

impl<F: Float> BatchConfig<F> {
    /// Defaults suited to `method`.
    pub fn new(method: BatchMethod) -> Self {
        let (line_search, c2, step_init) = match method {
            BatchMethod::Gd => (LineSearchKind::InterpolationCubic, 0.1, StepInit::Consistent),
            BatchMethod::Cgd(_) => (LineSearchKind::CgDescent, 0.1, StepInit::Unit),
            BatchMethod::Lbfgs => (LineSearchKind::InterpolationCubic, 0.9, StepInit::Unit),
        };
        let half = F::one() / (F::one() + F::one());
        BatchConfig {
            method,
            line_search,
            c1: cst(1e-4, F::epsilon().sqrt()),
            c2: cst(c2, half),
            convergence: ConvergenceParams {
                max_iter: 1000,
                epsilon: cst(1e-6, F::epsilon().sqrt()),
            },
            history_size: 6,
            step_init,
            restart_interval: 0,
        }
    }
}

impl Default for BatchConfig<f64> {
    fn default() -> Self {
        BatchConfig::new(BatchMethod::Lbfgs)
    }
}

impl Default for BatchConfig<f32> {
    fn default() -> Self {
        let mut config = BatchConfig::new(BatchMethod::Lbfgs);
        config.convergence = ConvergenceParams::default();
        config
    }
}

/// Gradient descent, nonlinear conjugate gradient and L-BFGS behind one loop.
#[derive(Debug, Clone)]
pub struct BatchOptimizer<F> {
    config: BatchConfig<F>,
    line_search: LineSearch<F>,
}

impl<F: Float> BatchOptimizer<F> {
    /// Validate `config`; nothing is evaluated yet.
    pub fn new(config: BatchConfig<F>) -> Result<Self, ConfigError> {
        let line_search = LineSearch::new(config.line_search, config.c1, config.c2)?;
        let eps = config.convergence.epsilon;
        if !(eps > F::zero()) || !eps.is_finite() {
            return Err(ConfigError::InvalidTolerance(eps.to_f64().unwrap_or(f64::NAN)));
        }
        if config.convergence.max_iter == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(BatchOptimizer {
            config,
            line_search,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &BatchConfig<F> {
        &self.config
    }

    /// Minimize `problem` from `x0`, reporting diagnostics through `log`.
    pub fn minimize<O: Objective<F> + ?Sized>(&self, problem: &O, x0: &[F]) -> OptimResult<F> {
        self.minimize_with(problem, x0, &mut Callbacks::new())
    }

    /// Minimize `problem` from `x0`.
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

        let method = self.config.method;
        let mut state = OptimState::new(problem, x0);
        let mut result = OptimResult::new(&state);
        let mut init = StepInitializer::new(self.config.step_init);
        let mut direction = Direction::new(method, self.config.history_size);
        let mut termination = TerminationReason::MaxIterations;

        for i in 0..self.config.convergence.max_iter {
            result.update(&state);
            if !callbacks.iteration(&state) {
                termination = TerminationReason::UserTerminated;
                break;
            }

            if state.converged(self.config.convergence.epsilon) {
                termination = TerminationReason::Converged;
                break;
            }

            let restart = i == 0
                || (self.config.restart_interval > 0 && i % self.config.restart_interval == 0);
            direction.compute(&mut state, restart);

            // zero or near-orthogonal directions are refused by the line search too
            if !(state.slope() < -F::epsilon()) {
                callbacks.warn(&format!("not a descent direction ({method})"));
                state.steepest_descent();
            }

            let dphi0 = state.slope();
            let t0 = init.initial(dphi0);
            let x_old = state.x.clone();
            let g_old = state.g.clone();
            match self.line_search.update(problem, t0, &mut state) {
                Some(alpha) => {
                    init.accepted(alpha, dphi0);
                    direction.accepted(&x_old, &g_old, &state);
                }
                None => {
                    callbacks.error(&format!("line-search failed ({method})"));
                    termination = TerminationReason::LineSearchFailed;
                    break;
                }
            }
        }

        result.finish(&state, termination);
        log::debug!(
            "{method}: {} after {} iterations (f = {:e}, {} gradient calls)",
            result.termination,
            result.iterations(),
            result.value().to_f64().unwrap_or(f64::NAN),
            result.n_grad_calls(),
        );
        result
    }
}

/// Method-specific memory between iterations.
enum Direction<F> {
    Gd,
    Cgd {
        beta: CgdBeta,
        g_prev: Vec<F>,
        d_prev: Vec<F>,
    },
    Lbfgs(History<F>),
}

impl<F: Float> Direction<F> {
    fn new(method: BatchMethod, history_size: usize) -> Self {
        match method {
            BatchMethod::Gd => Direction::Gd,
            BatchMethod::Cgd(beta) => Direction::Cgd {
                beta,
                g_prev: Vec::new(),
                d_prev: Vec::new(),
            },
            BatchMethod::Lbfgs => Direction::Lbfgs(History::new(history_size)),
        }
    }

    /// Set `state.d` for the current iterate.
    fn compute(&mut self, state: &mut OptimState<F>, restart: bool) {
        match self {
            Direction::Gd => state.steepest_descent(),
            Direction::Cgd {
                beta,
                g_prev,
                d_prev,
            } => {
                let b = if restart || g_prev.is_empty() {
                    F::zero()
                } else {
                    beta.beta(g_prev, d_prev, &state.g)
                };
                state.steepest_descent();
                if b.is_finite() && b != F::zero() {
                    for (di, &dp) in state.d.iter_mut().zip(d_prev.iter()) {
                        *di = *di + b * dp;
                    }
                }
            }
            Direction::Lbfgs(history) => state.d = history.direction(&state.g),
        }
    }

    /// Remember what the next direction needs after a successful step from `(x_old, g_old)`.
    fn accepted(&mut self, x_old: &[F], g_old: &[F], state: &OptimState<F>) {
        match self {
            Direction::Gd => {}
            Direction::Cgd { g_prev, d_prev, .. } => {
                g_prev.clear();
                g_prev.extend_from_slice(g_old);
                d_prev.clear();
                d_prev.extend_from_slice(&state.d);
            }
            Direction::Lbfgs(history) => {
                history.push(x_old, g_old, &state.x, &state.g);
            }
        }
    }
}
