use std::fmt;

use num_traits::Float;

use crate::convergence::norm_inf;
use crate::state::OptimState;
use crate::stats::RunningStats;

/// Result of an optimization run.
///
/// Tracks the best state seen so far; the optimum's value never increases
/// over the lifetime of the tracker.
#[derive(Debug, Clone)]
pub struct OptimResult<F> {
    optimum: OptimState<F>,
    iterations: usize,
    convergence_speed: RunningStats<F>,
    n_value_calls: usize,
    n_grad_calls: usize,
    /// Reason for termination.
    pub termination: TerminationReason,
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// Relative gradient norm fell below tolerance.
    Converged,
    /// Reached the maximum number of iterations.
    MaxIterations,
    /// Line search could not find an acceptable step.
    LineSearchFailed,
    /// The iteration callback asked to stop.
    UserTerminated,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Converged => write!(f, "gradient norm below tolerance"),
            TerminationReason::MaxIterations => write!(f, "maximum iterations reached"),
            TerminationReason::LineSearchFailed => write!(f, "line search failed"),
            TerminationReason::UserTerminated => write!(f, "stopped by callback"),
        }
    }
}

impl<F: Float> OptimResult<F> {
    /// Start tracking from `initial`, before any iteration is recorded.
    pub fn new(initial: &OptimState<F>) -> Self {
        OptimResult {
            optimum: initial.clone(),
            iterations: 0,
            convergence_speed: RunningStats::new(),
            n_value_calls: initial.n_value_calls,
            n_grad_calls: initial.n_grad_calls,
            termination: TerminationReason::MaxIterations,
        }
    }

    /// Record one iteration.
    ///
    /// Feeds `|f_opt - f| / max(1, |f_opt|)` to the convergence-speed statistic
    /// (from the second call on) and replaces the optimum if `state` is strictly better.
    pub fn update(&mut self, state: &OptimState<F>) {
        if self.iterations > 0 {
            let df = (self.optimum.f - state.f).abs();
            let speed = df / F::one().max(self.optimum.f.abs());
            if speed.is_finite() {
                self.convergence_speed.add(speed);
            }
        }

        self.iterations += 1;
        self.observe(state);
    }

    /// Close the run: keep `state` if it beats the optimum (without counting
    /// an iteration) and record why the run stopped.
    pub fn finish(&mut self, state: &OptimState<F>, termination: TerminationReason) {
        self.observe(state);
        self.termination = termination;
    }

    fn observe(&mut self, state: &OptimState<F>) {
        self.n_value_calls = self.n_value_calls.max(state.n_value_calls);
        self.n_grad_calls = self.n_grad_calls.max(state.n_grad_calls);
        if state.is_better_than(&self.optimum) {
            self.optimum = state.clone();
        }
    }

    /// Best state seen.
    pub fn optimum(&self) -> &OptimState<F> {
        &self.optimum
    }

    /// Consume the tracker and return the best state.
    pub fn into_optimum(self) -> OptimState<F> {
        self.optimum
    }

    /// Solution point.
    pub fn x(&self) -> &[F] {
        &self.optimum.x
    }

    /// Objective value at the solution.
    pub fn value(&self) -> F {
        self.optimum.f
    }

    /// Infinity norm of the gradient at the solution.
    pub fn gradient_norm(&self) -> F {
        norm_inf(&self.optimum.g)
    }

    /// Number of recorded iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Statistic of the relative decrease between consecutive updates.
    pub fn convergence_speed(&self) -> &RunningStats<F> {
        &self.convergence_speed
    }

    /// Value-only evaluations spent by the run.
    pub fn n_value_calls(&self) -> usize {
        self.n_value_calls
    }

    /// Value-and-gradient evaluations spent by the run.
    pub fn n_grad_calls(&self) -> usize {
        self.n_grad_calls
    }

    /// Whether the run stopped on the gradient test.
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(f: f64) -> OptimState<f64> {
        OptimState {
            x: vec![f],
            f,
            g: vec![0.0],
            d: vec![0.0],
            n_value_calls: 0,
            n_grad_calls: 0,
        }
    }

    #[test]
    fn optimum_is_monotone() {
        let mut r = OptimResult::new(&state(10.0));
        for f in [10.0, 4.0, 6.0, f64::NAN, 3.0, f64::INFINITY] {
            let before = r.value();
            r.update(&state(f));
            assert!(r.value() <= before);
        }
        assert_eq!(r.value(), 3.0);
        assert_eq!(r.iterations(), 6);
    }

    #[test]
    fn ties_keep_first() {
        let mut r = OptimResult::new(&state(1.0));
        let mut later = state(1.0);
        later.x = vec![42.0];
        r.update(&later);
        assert_eq!(r.x(), &[1.0]);
    }

    #[test]
    fn finish_keeps_better_state_without_counting() {
        let mut r = OptimResult::new(&state(5.0));
        r.update(&state(5.0));
        let mut last = state(1.0);
        last.n_grad_calls = 7;
        r.finish(&last, TerminationReason::LineSearchFailed);
        assert_eq!(r.iterations(), 1);
        assert_eq!(r.value(), 1.0);
        assert_eq!(r.n_grad_calls(), 7);
        assert!(!r.converged());
    }

    #[test]
    fn convergence_speed_skips_first_update() {
        let mut r = OptimResult::new(&state(8.0));
        r.update(&state(8.0));
        assert_eq!(r.convergence_speed().count(), 0);
        r.update(&state(4.0));
        assert_eq!(r.convergence_speed().count(), 1);
        assert_eq!(r.convergence_speed().mean(), 0.5);
    }
}
