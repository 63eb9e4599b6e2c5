//! Standard unconstrained test functions with analytic gradients.
//!
//! Used by the test suite and the benchmarks; each knows a minimizer and a
//! starting point inside that minimizer's basin.

use num_traits::Float;

use crate::convergence::cst;
use crate::objective::Objective;

/// A benchmark objective with a known minimizer.
pub trait TestFunction<F: Float>: Objective<F> + Send + Sync {
    /// Short identifier.
    fn name(&self) -> &'static str;

    /// A (local or global) minimizer reachable from [`TestFunction::start`].
    fn minimizer(&self) -> Vec<F>;

    /// Starting point.
    fn start(&self) -> Vec<F>;

    /// Objective value at [`TestFunction::minimizer`].
    fn minimum(&self) -> F {
        self.value(&self.minimizer())
    }
}

fn c<F: Float>(v: f64) -> F {
    cst(v, F::nan())
}

/// `Σ x_i²`.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    /// Number of variables.
    pub dim: usize,
}

impl<F: Float> Objective<F> for Sphere {
    fn dim(&self) -> usize {
        self.dim
    }

    fn value(&self, x: &[F]) -> F {
        x.iter().fold(F::zero(), |s, &v| s + v * v)
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let two = c::<F>(2.0);
        (self.value(x), x.iter().map(|&v| two * v).collect())
    }
}

impl<F: Float> TestFunction<F> for Sphere {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn minimizer(&self) -> Vec<F> {
        vec![F::zero(); self.dim]
    }

    fn start(&self) -> Vec<F> {
        (0..self.dim).map(|i| c(1.0 + i as f64)).collect()
    }
}

/// `Σ (i + 1)·x_i²`, condition number `dim`.
#[derive(Debug, Clone, Copy)]
pub struct SumSquares {
    /// Number of variables.
    pub dim: usize,
}

impl<F: Float> Objective<F> for SumSquares {
    fn dim(&self) -> usize {
        self.dim
    }

    fn value(&self, x: &[F]) -> F {
        x.iter()
            .enumerate()
            .fold(F::zero(), |s, (i, &v)| s + c::<F>((i + 1) as f64) * v * v)
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let g = x
            .iter()
            .enumerate()
            .map(|(i, &v)| c::<F>(2.0 * (i + 1) as f64) * v)
            .collect();
        (self.value(x), g)
    }
}

impl<F: Float> TestFunction<F> for SumSquares {
    fn name(&self) -> &'static str {
        "sum-squares"
    }

    fn minimizer(&self) -> Vec<F> {
        vec![F::zero(); self.dim]
    }

    fn start(&self) -> Vec<F> {
        (0..self.dim)
            .map(|i| c(if i % 2 == 0 { 1.5 } else { -0.5 }))
            .collect()
    }
}

/// `(x + 2y - 7)² + (2x + y - 5)²`, minimum 0 at `(1, 3)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Booth;

impl<F: Float> Objective<F> for Booth {
    fn dim(&self) -> usize {
        2
    }

    fn value(&self, x: &[F]) -> F {
        let a = x[0] + c::<F>(2.0) * x[1] - c(7.0);
        let b = c::<F>(2.0) * x[0] + x[1] - c(5.0);
        a * a + b * b
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let two = c::<F>(2.0);
        let a = x[0] + two * x[1] - c(7.0);
        let b = two * x[0] + x[1] - c(5.0);
        let g = vec![two * a + c::<F>(4.0) * b, c::<F>(4.0) * a + two * b];
        (a * a + b * b, g)
    }
}

impl<F: Float> TestFunction<F> for Booth {
    fn name(&self) -> &'static str {
        "booth"
    }

    fn minimizer(&self) -> Vec<F> {
        vec![c(1.0), c(3.0)]
    }

    fn start(&self) -> Vec<F> {
        vec![c(-4.0), c(7.0)]
    }
}

/// `(x² + y - 11)² + (x + y² - 7)²`, four minima of value 0; `(3, 2)` is the
/// one reached from [`TestFunction::start`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Himmelblau;

impl<F: Float> Objective<F> for Himmelblau {
    fn dim(&self) -> usize {
        2
    }

    fn value(&self, x: &[F]) -> F {
        let a = x[0] * x[0] + x[1] - c(11.0);
        let b = x[0] + x[1] * x[1] - c(7.0);
        a * a + b * b
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let two = c::<F>(2.0);
        let four = c::<F>(4.0);
        let a = x[0] * x[0] + x[1] - c(11.0);
        let b = x[0] + x[1] * x[1] - c(7.0);
        let g = vec![four * x[0] * a + two * b, two * a + four * x[1] * b];
        (a * a + b * b, g)
    }
}

impl<F: Float> TestFunction<F> for Himmelblau {
    fn name(&self) -> &'static str {
        "himmelblau"
    }

    fn minimizer(&self) -> Vec<F> {
        vec![c(3.0), c(2.0)]
    }

    fn start(&self) -> Vec<F> {
        vec![c(2.0), c(1.5)]
    }
}

/// `sin(x + y) + (x - y)² - 1.5x + 2.5y + 1`, local minimum near `(-0.547, -1.547)`.
///
/// Unbounded below along `x = y → -∞`; only meaningful from a nearby start.
#[derive(Debug, Clone, Copy, Default)]
pub struct McCormick;

impl<F: Float> Objective<F> for McCormick {
    fn dim(&self) -> usize {
        2
    }

    fn value(&self, x: &[F]) -> F {
        let d = x[0] - x[1];
        (x[0] + x[1]).sin() + d * d - c::<F>(1.5) * x[0] + c::<F>(2.5) * x[1] + F::one()
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let two = c::<F>(2.0);
        let cs = (x[0] + x[1]).cos();
        let d = x[0] - x[1];
        let g = vec![cs + two * d - c(1.5), cs - two * d + c(2.5)];
        (self.value(x), g)
    }
}

impl<F: Float> TestFunction<F> for McCormick {
    fn name(&self) -> &'static str {
        "mccormick"
    }

    fn minimizer(&self) -> Vec<F> {
        // stationary where x - y = 1 and cos(x + y) = -1/2
        let s = -2.0 * std::f64::consts::FRAC_PI_3;
        vec![c((s + 1.0) / 2.0), c((s - 1.0) / 2.0)]
    }

    fn start(&self) -> Vec<F> {
        vec![c(-0.3), c(-1.2)]
    }
}

/// Extended Rosenbrock `Σ 100·(x_{i+1} - x_i²)² + (1 - x_i)²`, minimum 0 at `(1, …, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Rosenbrock {
    /// Number of variables.
    pub dim: usize,
}

impl<F: Float> Objective<F> for Rosenbrock {
    fn dim(&self) -> usize {
        self.dim
    }

    fn value(&self, x: &[F]) -> F {
        let hundred = c::<F>(100.0);
        x.windows(2).fold(F::zero(), |s, w| {
            let a = w[1] - w[0] * w[0];
            let b = F::one() - w[0];
            s + hundred * a * a + b * b
        })
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let hundred = c::<F>(100.0);
        let two = c::<F>(2.0);
        let mut g = vec![F::zero(); x.len()];
        let mut f = F::zero();
        for i in 0..x.len().saturating_sub(1) {
            let a = x[i + 1] - x[i] * x[i];
            let b = F::one() - x[i];
            f = f + hundred * a * a + b * b;
            g[i] = g[i] - c::<F>(400.0) * x[i] * a - two * b;
            g[i + 1] = g[i + 1] + c::<F>(200.0) * a;
        }
        (f, g)
    }
}

impl<F: Float> TestFunction<F> for Rosenbrock {
    fn name(&self) -> &'static str {
        "rosenbrock"
    }

    fn minimizer(&self) -> Vec<F> {
        vec![F::one(); self.dim]
    }

    fn start(&self) -> Vec<F> {
        (0..self.dim)
            .map(|i| c(if i % 2 == 0 { -1.2 } else { 1.0 }))
            .collect()
    }
}

/// `2x² - 1.05x⁴ + x⁶/6 + xy + y²`, global minimum 0 at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeHumpCamel;

impl<F: Float> Objective<F> for ThreeHumpCamel {
    fn dim(&self) -> usize {
        2
    }

    fn value(&self, x: &[F]) -> F {
        let (u, v) = (x[0], x[1]);
        let u2 = u * u;
        c::<F>(2.0) * u2 - c::<F>(1.05) * u2 * u2 + u2 * u2 * u2 / c(6.0) + u * v + v * v
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let (u, v) = (x[0], x[1]);
        let u2 = u * u;
        let g = vec![
            c::<F>(4.0) * u - c::<F>(4.2) * u2 * u + u2 * u2 * u + v,
            u + c::<F>(2.0) * v,
        ];
        (self.value(x), g)
    }
}

impl<F: Float> TestFunction<F> for ThreeHumpCamel {
    fn name(&self) -> &'static str {
        "three-hump-camel"
    }

    fn minimizer(&self) -> Vec<F> {
        vec![F::zero(), F::zero()]
    }

    fn start(&self) -> Vec<F> {
        vec![c(0.5), c(-0.4)]
    }
}

/// Goldstein-Price, global minimum 3 at `(0, -1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoldsteinPrice;

impl GoldsteinPrice {
    /// `(a, ∂a, b, ∂b)` for `f = a·b`.
    fn parts<F: Float>(x: &[F]) -> (F, [F; 2], F, [F; 2]) {
        let (u, v) = (x[0], x[1]);
        let s = u + v + F::one();
        let p = c::<F>(19.0) - c::<F>(14.0) * u + c::<F>(3.0) * u * u - c::<F>(14.0) * v
            + c::<F>(6.0) * u * v
            + c::<F>(3.0) * v * v;
        let a = F::one() + s * s * p;
        let dp_du = c::<F>(-14.0) + c::<F>(6.0) * u + c::<F>(6.0) * v;
        let dp_dv = c::<F>(-14.0) + c::<F>(6.0) * u + c::<F>(6.0) * v;
        let two_s_p = c::<F>(2.0) * s * p;
        let da = [two_s_p + s * s * dp_du, two_s_p + s * s * dp_dv];

        let t = c::<F>(2.0) * u - c::<F>(3.0) * v;
        let q = c::<F>(18.0) - c::<F>(32.0) * u + c::<F>(12.0) * u * u + c::<F>(48.0) * v
            - c::<F>(36.0) * u * v
            + c::<F>(27.0) * v * v;
        let b = c::<F>(30.0) + t * t * q;
        let dq_du = c::<F>(-32.0) + c::<F>(24.0) * u - c::<F>(36.0) * v;
        let dq_dv = c::<F>(48.0) - c::<F>(36.0) * u + c::<F>(54.0) * v;
        let db = [
            c::<F>(4.0) * t * q + t * t * dq_du,
            c::<F>(-6.0) * t * q + t * t * dq_dv,
        ];
        (a, da, b, db)
    }
}

impl<F: Float> Objective<F> for GoldsteinPrice {
    fn dim(&self) -> usize {
        2
    }

    fn value(&self, x: &[F]) -> F {
        let (a, _, b, _) = GoldsteinPrice::parts(x);
        a * b
    }

    fn value_grad(&self, x: &[F]) -> (F, Vec<F>) {
        let (a, da, b, db) = GoldsteinPrice::parts(x);
        (a * b, vec![da[0] * b + a * db[0], da[1] * b + a * db[1]])
    }
}

impl<F: Float> TestFunction<F> for GoldsteinPrice {
    fn name(&self) -> &'static str {
        "goldstein-price"
    }

    fn minimizer(&self) -> Vec<F> {
        vec![F::zero(), -F::one()]
    }

    fn start(&self) -> Vec<F> {
        vec![c(0.1), c(-0.9)]
    }
}

/// Every test function, the dimension-parameterized ones at `dim`.
pub fn suite<F: Float + 'static>(dim: usize) -> Vec<Box<dyn TestFunction<F>>> {
    vec![
        Box::new(Sphere { dim }),
        Box::new(SumSquares { dim }),
        Box::new(Booth),
        Box::new(Himmelblau),
        Box::new(McCormick),
        Box::new(Rosenbrock { dim }),
        Box::new(ThreeHumpCamel),
        Box::new(GoldsteinPrice),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::gradient_check;

    #[test]
    fn analytic_gradients_match_finite_differences() {
        for f in suite::<f64>(4) {
            let mut x = f.start();
            for v in x.iter_mut() {
                *v += 0.137;
            }
            let err = gradient_check(f.as_ref(), &x);
            assert!(err < 1e-6, "{}: relative gradient error {err}", f.name());
        }
    }

    #[test]
    fn minimizers_are_stationary() {
        for f in suite::<f64>(3) {
            let (_, g) = f.value_grad(&f.minimizer());
            let gmax = g.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            assert!(gmax < 1e-9, "{}: |g| = {gmax}", f.name());
        }
    }

    #[test]
    fn known_minimum_values() {
        assert_eq!(TestFunction::<f64>::minimum(&Booth), 0.0);
        assert_eq!(TestFunction::<f64>::minimum(&Rosenbrock { dim: 5 }), 0.0);
        assert!((TestFunction::<f64>::minimum(&GoldsteinPrice) - 3.0).abs() < 1e-12);
        assert!((TestFunction::<f64>::minimum(&McCormick) + 1.9133).abs() < 1e-4);
    }
}
