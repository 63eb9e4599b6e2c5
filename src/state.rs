use std::cmp::Ordering;

use num_traits::Float;

use crate::convergence::{converged, dot};
use crate::objective::Objective;

/// Current iterate of an optimizer.
///
/// `f` and `g` always correspond to `x`: every mutation of `x` goes through a
/// method that refreshes them.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimState<F> {
    /// Current point.
    pub x: Vec<F>,
    /// Objective value at `x`.
    pub f: F,
    /// Gradient at `x`.
    pub g: Vec<F>,
    /// Search direction.
    pub d: Vec<F>,
    /// Number of value-only objective evaluations so far.
    pub n_value_calls: usize,
    /// Number of value-and-gradient evaluations so far.
    pub n_grad_calls: usize,
}

impl<F: Float> OptimState<F> {
    /// Evaluate `problem` at `x0` and build the initial state.
    pub fn new<O: Objective<F> + ?Sized>(problem: &O, x0: &[F]) -> Self {
        let (f, g) = problem.value_grad(x0);
        OptimState {
            x: x0.to_vec(),
            f,
            d: vec![F::zero(); x0.len()],
            g,
            n_value_calls: 0,
            n_grad_calls: 1,
        }
    }

    /// Advance along the search direction: `x += alpha * d`, with `f`/`g`
    /// already evaluated at the new point (typically by a line search).
    pub fn update(&mut self, alpha: F, f: F, g: Vec<F>) {
        debug_assert_eq!(g.len(), self.x.len());
        for (xi, &di) in self.x.iter_mut().zip(&self.d) {
            *xi = *xi + alpha * di;
        }
        self.f = f;
        self.g = g;
    }

    /// Advance along the search direction and evaluate the objective at the new point.
    pub fn step<O: Objective<F> + ?Sized>(&mut self, problem: &O, alpha: F) {
        for (xi, &di) in self.x.iter_mut().zip(&self.d) {
            *xi = *xi + alpha * di;
        }
        self.refresh(problem);
    }

    /// Move to `x` and evaluate the objective there.
    pub fn reset_to<O: Objective<F> + ?Sized>(&mut self, problem: &O, x: &[F]) {
        self.x.clear();
        self.x.extend_from_slice(x);
        self.refresh(problem);
    }

    /// Re-evaluate `f` and `g` at the current point.
    pub fn refresh<O: Objective<F> + ?Sized>(&mut self, problem: &O) {
        let (f, g) = problem.value_grad(&self.x);
        self.f = f;
        self.g = g;
        self.n_grad_calls += 1;
    }

    /// Account for objective evaluations performed on behalf of this state.
    pub fn add_calls(&mut self, value_calls: usize, grad_calls: usize) {
        self.n_value_calls += value_calls;
        self.n_grad_calls += grad_calls;
    }

    /// Set the search direction to steepest descent, `d = -g`.
    pub fn steepest_descent(&mut self) {
        self.d.clear();
        self.d.extend(self.g.iter().map(|&gi| -gi));
    }

    /// Directional derivative `d · g`.
    pub fn slope(&self) -> F {
        dot(&self.d, &self.g)
    }

    /// Relative gradient stopping test, see [`crate::convergence::converged`].
    pub fn converged(&self, epsilon: F) -> bool {
        converged(self.f, &self.g, epsilon)
    }

    /// Whether this state has a strictly smaller objective value than `other`
    /// under [`value_order`].
    pub fn is_better_than(&self, other: &Self) -> bool {
        value_order(self.f, other.f) == Ordering::Less
    }
}

/// Total order on objective values: finite values by magnitude, then `+inf`,
/// then NaN. A NaN value is never minimal unless everything is NaN.
pub fn value_order<F: Float>(a: F, b: F) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
