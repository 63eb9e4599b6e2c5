use num_traits::Float;

use crate::convergence::cst;

/// Trait for optimization objectives.
///
/// Implementors provide function evaluation and, optionally, an analytic gradient.
/// Methods take `&self`: evaluation counts are tracked by the optimizer state, not
/// by the objective, so one objective can be shared across threads during grid search.
pub trait Objective<F: Float> {
    /// Number of input variables.
    fn dim(&self) -> usize;

    /// Evaluate the objective at `x`.
    ///
    /// A non-finite result marks `x` as infeasible; optimizers reject such points.
    fn value(&self, x: &[F]) -> F;

    /// Evaluate the objective and its gradient at `x`.
    ///
    /// Returns `(f(x), ∇f(x))`. The default implementation approximates the
    /// gradient with central differences, costing `2 * dim()` extra calls to
    /// [`Objective::value`].
    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let g = central_difference(self, x);
        (self.value(x), g)
    }
}

/// Central finite-difference gradient with step `1e-6`.
///
/// `g_i = (f(x + h e_i) - f(x - h e_i)) / 2h`.
pub fn central_difference<F: Float, O: Objective<F> + ?Sized>(obj: &O, x: &[F]) -> Vec<F> {
    let h = cst(1e-6, F::epsilon().sqrt());
    let two_h = h + h;
    let mut xp = x.to_vec();
    let mut xn = x.to_vec();
    let mut g = vec![F::zero(); x.len()];

    for i in 0..x.len() {
        if i > 0 {
            xp[i - 1] = x[i - 1];
            xn[i - 1] = x[i - 1];
        }
        xp[i] = x[i] + h;
        xn[i] = x[i] - h;
        g[i] = (obj.value(&xp) - obj.value(&xn)) / two_h;
    }

    g
}

/// Largest relative difference between the analytic gradient and its
/// central-difference approximation at `x`.
///
/// Each component contributes `|g_a - g_fd| / max(1, |g_a|, |g_fd|)`.
pub fn gradient_check<F: Float, O: Objective<F> + ?Sized>(obj: &O, x: &[F]) -> F {
    let (_, ga) = obj.value_grad(x);
    let gf = central_difference(obj, x);

    ga.iter().zip(&gf).fold(F::zero(), |worst, (&a, &b)| {
        let scale = F::one().max(a.abs()).max(b.abs());
        worst.max((a - b).abs() / scale)
    })
}

type ValueFn<'a, F> = dyn Fn(&[F]) -> F + Send + Sync + 'a;
type ValueGradFn<'a, F> = dyn Fn(&[F]) -> (F, Vec<F>) + Send + Sync + 'a;

/// Adapter wrapping plain closures as an [`Objective`].
///
/// Without [`Problem::with_gradient`] the gradient falls back to central differences.
pub struct Problem<'a, F> {
    dim: usize,
    value: Box<ValueFn<'a, F>>,
    value_grad: Option<Box<ValueGradFn<'a, F>>>,
}

impl<'a, F: Float> Problem<'a, F> {
    /// Create a problem of dimension `dim` from a value-only closure.
    pub fn new(dim: usize, value: impl Fn(&[F]) -> F + Send + Sync + 'a) -> Self {
        assert!(dim > 0, "problem dimension must be at least 1");
        Problem {
            dim,
            value: Box::new(value),
            value_grad: None,
        }
    }

    /// Attach an analytic value-and-gradient closure.
    pub fn with_gradient(
        mut self,
        value_grad: impl Fn(&[F]) -> (F, Vec<F>) + Send + Sync + 'a,
    ) -> Self {
        self.value_grad = Some(Box::new(value_grad));
        self
    }

    /// Whether an analytic gradient was supplied.
    pub fn has_gradient(&self) -> bool {
        self.value_grad.is_some()
    }
}

impl<F: Float> Objective<F> for Problem<'_, F> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn value(&self, x: &[F]) -> F {
        (self.value)(x)
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        match &self.value_grad {
            Some(op) => op(x),
            None => {
                let g = central_difference(self, x);
                (self.value(x), g)
            }
        }
    }
}

impl<F> std::fmt::Debug for Problem<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("dim", &self.dim)
            .field("analytic_gradient", &self.value_grad.is_some())
            .finish()
    }
}
