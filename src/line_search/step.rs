use std::cell::Cell;
use std::cmp::Ordering;

use num_traits::Float;

use crate::convergence::{axpy_into, dot};
use crate::objective::Objective;
use crate::state::value_order;

/// The 1-D restriction `φ(t) = f(x + t·d)` of an objective along a direction.
///
/// Shared by every [`LsStep`] of one line search; counts the objective
/// evaluations the steps perform.
pub struct StepContext<'a, F, O: ?Sized> {
    problem: &'a O,
    x: &'a [F],
    d: &'a [F],
    g0: &'a [F],
    phi0: F,
    dphi0: F,
    value_calls: Cell<usize>,
    grad_calls: Cell<usize>,
}

impl<'a, F: Float, O: Objective<F> + ?Sized> StepContext<'a, F, O> {
    /// Restrict `problem` to the ray from `x` along `d`, where `f0`/`g0` are the
    /// value and gradient at `x`.
    pub fn new(problem: &'a O, x: &'a [F], d: &'a [F], f0: F, g0: &'a [F]) -> Self {
        debug_assert_eq!(x.len(), d.len());
        debug_assert_eq!(x.len(), g0.len());
        StepContext {
            problem,
            x,
            d,
            g0,
            phi0: f0,
            dphi0: dot(g0, d),
            value_calls: Cell::new(0),
            grad_calls: Cell::new(0),
        }
    }

    /// `φ(0)`.
    pub fn phi0(&self) -> F {
        self.phi0
    }

    /// `φ'(0) = ∇f(x)·d`.
    pub fn dphi0(&self) -> F {
        self.dphi0
    }

    /// The fully evaluated step at `t = 0`.
    pub fn step0(&'a self) -> LsStep<'a, F, O> {
        LsStep {
            ctx: self,
            alpha: F::zero(),
            eval: Eval::ValueGrad {
                phi: self.phi0,
                dphi: self.dphi0,
                grad: self.g0.to_vec(),
            },
        }
    }

    /// An unevaluated step at `t = alpha`.
    pub fn step(&'a self, alpha: F) -> LsStep<'a, F, O> {
        LsStep {
            ctx: self,
            alpha,
            eval: Eval::Unevaluated,
        }
    }

    /// Value-only evaluations performed so far.
    pub fn value_calls(&self) -> usize {
        self.value_calls.get()
    }

    /// Value-and-gradient evaluations performed so far.
    pub fn grad_calls(&self) -> usize {
        self.grad_calls.get()
    }

    fn point(&self, alpha: F) -> Vec<F> {
        let mut xt = Vec::with_capacity(self.x.len());
        axpy_into(&mut xt, self.x, alpha, self.d);
        xt
    }

    fn eval_value(&self, alpha: F) -> F {
        self.value_calls.set(self.value_calls.get() + 1);
        self.problem.value(&self.point(alpha))
    }

    fn eval_value_grad(&self, alpha: F) -> (F, F, Vec<F>) {
        self.grad_calls.set(self.grad_calls.get() + 1);
        let (phi, grad) = self.problem.value_grad(&self.point(alpha));
        let dphi = dot(&grad, self.d);
        (phi, dphi, grad)
    }
}

/// What has been computed for a step so far.
#[derive(Debug, Clone)]
enum Eval<F> {
    Unevaluated,
    Value { phi: F },
    ValueGrad { phi: F, dphi: F, grad: Vec<F> },
}

/// A candidate step length with memoized `φ(t)` and `φ'(t)`.
///
/// Each quantity is computed at most once per [`LsStep::reset`]; asking for
/// `φ'` also memoizes `φ`.
pub struct LsStep<'a, F, O: ?Sized> {
    ctx: &'a StepContext<'a, F, O>,
    alpha: F,
    eval: Eval<F>,
}

impl<F: Clone, O: ?Sized> Clone for LsStep<'_, F, O> {
    fn clone(&self) -> Self {
        LsStep {
            ctx: self.ctx,
            alpha: self.alpha.clone(),
            eval: self.eval.clone(),
        }
    }
}

impl<'a, F: Float, O: Objective<F> + ?Sized> LsStep<'a, F, O> {
    /// Move to a new step length and drop the memoized values.
    pub fn reset(&mut self, alpha: F) {
        self.alpha = alpha;
        self.eval = Eval::Unevaluated;
    }

    /// Move to a new step length and evaluate `φ` and `φ'` right away.
    pub fn reset_with_grad(&mut self, alpha: F) {
        self.reset(alpha);
        self.dphi();
    }

    /// Current step length.
    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// `φ(0)`.
    pub fn phi0(&self) -> F {
        self.ctx.phi0
    }

    /// `φ'(0)`.
    pub fn dphi0(&self) -> F {
        self.ctx.dphi0
    }

    /// `φ(alpha)`, evaluating the objective on first use.
    pub fn phi(&mut self) -> F {
        match self.eval {
            Eval::Value { phi } | Eval::ValueGrad { phi, .. } => phi,
            Eval::Unevaluated => {
                let phi = self.ctx.eval_value(self.alpha);
                self.eval = Eval::Value { phi };
                phi
            }
        }
    }

    /// `φ'(alpha)`, evaluating the objective and gradient on first use.
    pub fn dphi(&mut self) -> F {
        if let Eval::ValueGrad { dphi, .. } = self.eval {
            return dphi;
        }
        let (phi, dphi, grad) = self.ctx.eval_value_grad(self.alpha);
        self.eval = Eval::ValueGrad { phi, dphi, grad };
        dphi
    }

    /// `φ(alpha)` if it has already been computed.
    pub fn memoized_phi(&self) -> Option<F> {
        match self.eval {
            Eval::Unevaluated => None,
            Eval::Value { phi } | Eval::ValueGrad { phi, .. } => Some(phi),
        }
    }

    /// Sufficient decrease: `φ(t) <= φ(0) + c1·t·φ'(0)`.
    pub fn has_armijo(&mut self, c1: F) -> bool {
        let bound = self.phi0() + c1 * self.alpha * self.dphi0();
        self.phi() <= bound
    }

    /// Curvature: `φ'(t) >= c2·φ'(0)`.
    pub fn has_wolfe(&mut self, c2: F) -> bool {
        self.dphi() >= c2 * self.dphi0()
    }

    /// Strong curvature: `c2·φ'(0) <= φ'(t) <= -c2·φ'(0)`.
    pub fn has_strong_wolfe(&mut self, c2: F) -> bool {
        let dphi = self.dphi();
        let bound = c2 * self.dphi0();
        dphi >= bound && dphi <= -bound
    }

    /// Approximate Wolfe (Hager & Zhang):
    /// `(2c1 - 1)·φ'(0) >= φ'(t) >= c2·φ'(0)` and `φ(t) <= φ(0) + epsilon`.
    pub fn has_approx_wolfe(&mut self, c1: F, c2: F, epsilon: F) -> bool {
        let dphi0 = self.dphi0();
        let dphi = self.dphi();
        let two_c1 = c1 + c1;
        (two_c1 - F::one()) * dphi0 >= dphi && dphi >= c2 * dphi0 && self.phi() <= self.phi0() + epsilon
    }

    /// A step is usable when `φ` and `φ'` are finite and `alpha > ε_machine`.
    pub fn is_valid(&mut self) -> bool {
        self.alpha > F::epsilon() && self.dphi().is_finite() && self.phi().is_finite()
    }

    /// Order two steps by `φ`; non-finite values sort last.
    pub fn cmp_phi(&mut self, other: &mut Self) -> Ordering {
        value_order(self.phi(), other.phi())
    }

    /// Keep the step with the smaller `φ`; ties keep `self`.
    pub fn min(mut self, mut other: Self) -> Self {
        if other.cmp_phi(&mut self) == Ordering::Less {
            other
        } else {
            self
        }
    }

    /// Accepted step as `(alpha, φ(alpha), ∇f(x + alpha·d))`, evaluating the gradient if needed.
    pub fn into_parts(mut self) -> (F, F, Vec<F>) {
        self.dphi();
        match self.eval {
            Eval::ValueGrad { phi, grad, .. } => (self.alpha, phi, grad),
            // dphi() above always leaves the gradient memoized
            Eval::Unevaluated | Eval::Value { .. } => {
                let (phi, _, grad) = self.ctx.eval_value_grad(self.alpha);
                (self.alpha, phi, grad)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Problem;

    fn parabola() -> Problem<'static, f64> {
        // φ(t) = (1 - t)^2 along d = 1 from x = 0, minimum at t = 1
        Problem::new(1, |x: &[f64]| (x[0] - 1.0).powi(2))
            .with_gradient(|x: &[f64]| ((x[0] - 1.0).powi(2), vec![2.0 * (x[0] - 1.0)]))
    }

    #[test]
    fn phi_is_memoized() {
        let p = parabola();
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 1.0, &[-2.0]);
        let mut step = ctx.step(0.5);
        assert_eq!(step.phi(), 0.25);
        assert_eq!(step.phi(), 0.25);
        assert_eq!(ctx.value_calls(), 1);
        assert_eq!(ctx.grad_calls(), 0);
    }

    #[test]
    fn dphi_memoizes_phi_too() {
        let p = parabola();
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 1.0, &[-2.0]);
        let mut step = ctx.step(0.5);
        assert_eq!(step.dphi(), -1.0);
        assert_eq!(step.phi(), 0.25);
        assert_eq!(step.dphi(), -1.0);
        assert_eq!(ctx.value_calls(), 0);
        assert_eq!(ctx.grad_calls(), 1);

        step.reset(1.0);
        assert_eq!(step.memoized_phi(), None);
        assert_eq!(step.phi(), 0.0);
        assert_eq!(ctx.value_calls(), 1);
    }

    #[test]
    fn acceptance_conditions() {
        let p = parabola();
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 1.0, &[-2.0]);

        let mut exact = ctx.step(1.0);
        assert!(exact.has_armijo(1e-4));
        assert!(exact.has_wolfe(0.9));
        assert!(exact.has_strong_wolfe(0.1));
        assert!(exact.has_approx_wolfe(1e-4, 0.9, 1e-6));

        let mut short = ctx.step(0.01);
        assert!(short.has_armijo(1e-4));
        assert!(!short.has_wolfe(0.9));

        let mut long = ctx.step(2.5);
        assert!(!long.has_armijo(1e-4));
        assert!(long.has_wolfe(0.9));
        assert!(!long.has_strong_wolfe(0.9));
    }

    #[test]
    fn validity() {
        let p = Problem::new(1, |x: &[f64]| if x[0] > 1.0 { f64::NAN } else { x[0] });
        let g0 = [1.0];
        let ctx = StepContext::new(&p, &[0.0], &[-1.0], 0.0, &g0);
        assert!(!ctx.step0().is_valid());
        assert!(ctx.step(0.5).is_valid());

        let ctx = StepContext::new(&p, &[0.0], &[1.0], 0.0, &g0);
        assert!(!ctx.step(2.0).is_valid());
    }

    #[test]
    fn min_prefers_smaller_phi_and_never_nan() {
        let p = Problem::new(1, |x: &[f64]| if x[0] > 3.0 { f64::NAN } else { (x[0] - 1.0).powi(2) });
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 1.0, &[-2.0]);
        let best = ctx.step(4.0).min(ctx.step(0.5));
        assert_eq!(best.alpha(), 0.5);
        let best = ctx.step(0.5).min(ctx.step(1.5));
        assert_eq!(best.alpha(), 0.5);
    }
}
