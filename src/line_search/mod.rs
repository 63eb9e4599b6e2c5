//! Line searches along a descent direction.
//!
//! Every strategy works on the 1-D restriction `φ(t) = f(x + t·d)` through
//! memoized [`LsStep`]s and either returns a valid step or signals failure
//! with a step whose length is at most machine epsilon.

mod backtracking;
mod cg_descent;
mod interpolation;
pub mod step;

use std::fmt;
use std::str::FromStr;

use num_traits::Float;

use crate::convergence::cst;
use crate::error::ConfigError;
use crate::objective::Objective;
use crate::state::OptimState;

pub use step::{LsStep, StepContext};

/// Line-search strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineSearchKind {
    /// Shrink until the Armijo condition holds.
    BacktrackArmijo,
    /// Backtracking until Armijo and Wolfe hold.
    BacktrackWolfe,
    /// Backtracking until Armijo and strong Wolfe hold.
    BacktrackStrongWolfe,
    /// Bracketing then bisection zoom until strong Wolfe holds.
    InterpolationBisection,
    /// Bracketing then safeguarded cubic zoom until strong Wolfe holds.
    InterpolationCubic,
    /// Hager-Zhang CG_DESCENT bracketing / secant search.
    CgDescent,
}

impl LineSearchKind {
    /// All strategies, in declaration order.
    pub const ALL: [LineSearchKind; 6] = [
        LineSearchKind::BacktrackArmijo,
        LineSearchKind::BacktrackWolfe,
        LineSearchKind::BacktrackStrongWolfe,
        LineSearchKind::InterpolationBisection,
        LineSearchKind::InterpolationCubic,
        LineSearchKind::CgDescent,
    ];

    /// Textual name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            LineSearchKind::BacktrackArmijo => "backtrack-armijo",
            LineSearchKind::BacktrackWolfe => "backtrack-wolfe",
            LineSearchKind::BacktrackStrongWolfe => "backtrack-strong-wolfe",
            LineSearchKind::InterpolationBisection => "interpolation-bisection",
            LineSearchKind::InterpolationCubic => "interpolation-cubic",
            LineSearchKind::CgDescent => "cg-descent",
        }
    }

    /// Whether accepted steps always satisfy the Armijo condition.
    pub fn enforces_armijo(self) -> bool {
        !matches!(self, LineSearchKind::CgDescent)
    }
}

impl fmt::Display for LineSearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LineSearchKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LineSearchKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ConfigError::UnknownName {
                kind: "line-search strategy",
                name: s.to_string(),
            })
    }
}

/// A line-search strategy with validated constants `0 < c1 < c2 < 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSearch<F> {
    kind: LineSearchKind,
    c1: F,
    c2: F,
}

impl<F: Float> LineSearch<F> {
    /// Build a line search; `c1` is the sufficient-decrease constant, `c2` the curvature constant.
    pub fn new(kind: LineSearchKind, c1: F, c2: F) -> Result<Self, ConfigError> {
        let ok = c1 > F::zero() && c1 < c2 && c2 < F::one();
        if !ok {
            return Err(ConfigError::InvalidLineSearchConstants {
                c1: c1.to_f64().unwrap_or(f64::NAN),
                c2: c2.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(LineSearch { kind, c1, c2 })
    }

    /// Strategy selector.
    pub fn kind(&self) -> LineSearchKind {
        self.kind
    }

    /// Sufficient-decrease constant.
    pub fn c1(&self) -> F {
        self.c1
    }

    /// Curvature constant.
    pub fn c2(&self) -> F {
        self.c2
    }

    /// Search along `state.d` starting from the trial length `t0`.
    ///
    /// On success the state is advanced to the accepted point and the step
    /// length is returned. Returns `None` when `d` is not a descent direction,
    /// `t0` is not positive, or no valid step was found; the state's point is
    /// then left untouched. Evaluations are added to the state's counters either way.
    pub fn update<O: Objective<F> + ?Sized>(
        &self,
        problem: &O,
        t0: F,
        state: &mut OptimState<F>,
    ) -> Option<F> {
        let eps = F::epsilon();

        let (accepted, value_calls, grad_calls) = {
            let ctx = StepContext::new(problem, &state.x, &state.d, state.f, &state.g);
            if !(ctx.dphi0() < -eps) || !(t0 >= eps) {
                return None;
            }

            let mut step = match self.kind {
                LineSearchKind::BacktrackArmijo
                | LineSearchKind::BacktrackWolfe
                | LineSearchKind::BacktrackStrongWolfe => {
                    backtracking::search(&ctx, self.kind, self.c1, self.c2, t0)
                }
                LineSearchKind::InterpolationBisection | LineSearchKind::InterpolationCubic => {
                    interpolation::search(&ctx, self.kind, self.c1, self.c2, t0)
                }
                LineSearchKind::CgDescent => cg_descent::search(&ctx, self.c1, self.c2, t0),
            };

            let accepted = if step.is_valid() {
                Some(step.into_parts())
            } else {
                None
            };
            (accepted, ctx.value_calls(), ctx.grad_calls())
        };

        state.add_calls(value_calls, grad_calls);
        let (alpha, f, g) = accepted?;
        state.update(alpha, f, g);
        Some(alpha)
    }
}

impl Default for LineSearch<f64> {
    fn default() -> Self {
        LineSearch {
            kind: LineSearchKind::InterpolationCubic,
            c1: 1e-4,
            c2: 0.1,
        }
    }
}

impl Default for LineSearch<f32> {
    fn default() -> Self {
        LineSearch {
            kind: LineSearchKind::InterpolationCubic,
            c1: 1e-4,
            c2: 0.1,
        }
    }
}

/// Smallest bracket width the searches distinguish, `sqrt(ε_machine)`.
pub(crate) fn min_step<F: Float>() -> F {
    F::epsilon().sqrt()
}

/// Largest trial length, `1 / sqrt(ε_machine)`.
pub(crate) fn max_step<F: Float>() -> F {
    F::one() / min_step::<F>()
}

/// Policy for the first trial length of each line search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepInit {
    /// Always start from `t0 = 1`.
    Unit,
    /// Assume the first-order change matches the previous iteration:
    /// `t0 = t_prev · φ'_prev(0) / φ'(0)`.
    Consistent,
}

impl StepInit {
    /// Textual name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            StepInit::Unit => "unit",
            StepInit::Consistent => "consistent",
        }
    }
}

impl fmt::Display for StepInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StepInit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unit" => Ok(StepInit::Unit),
            "consistent" => Ok(StepInit::Consistent),
            _ => Err(ConfigError::UnknownName {
                kind: "step initializer",
                name: s.to_string(),
            }),
        }
    }
}

/// Tracks what [`StepInit::Consistent`] needs from the previous iteration.
#[derive(Debug, Clone)]
pub(crate) struct StepInitializer<F> {
    policy: StepInit,
    previous: Option<(F, F)>,
}

impl<F: Float> StepInitializer<F> {
    pub(crate) fn new(policy: StepInit) -> Self {
        StepInitializer {
            policy,
            previous: None,
        }
    }

    /// First trial length for a search whose initial slope is `dphi0`.
    pub(crate) fn initial(&self, dphi0: F) -> F {
        match (self.policy, self.previous) {
            (StepInit::Consistent, Some((alpha, prev_dphi0))) => {
                let t0 = alpha * prev_dphi0 / dphi0;
                if t0.is_finite() && t0 > min_step() {
                    t0.min(max_step())
                } else {
                    F::one()
                }
            }
            _ => F::one(),
        }
    }

    /// Remember the accepted length and the slope it was searched from.
    pub(crate) fn accepted(&mut self, alpha: F, dphi0: F) {
        self.previous = Some((alpha, dphi0));
    }
}

/// `0.1` as `F`, the safeguard fraction used by interpolating searches.
pub(crate) fn tenth<F: Float>() -> F {
    cst(0.1, F::one() / (F::one() + F::one()))
}
