use num_traits::Float;

/// Parameters controlling convergence checks.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceParams<F> {
    /// Maximum number of outer iterations (default: 1000).
    pub max_iter: usize,
    /// Relative gradient tolerance: stop when `||g||_inf < epsilon * (1 + |f|)` (default: 1e-6).
    pub epsilon: F,
}

impl Default for ConvergenceParams<f64> {
    fn default() -> Self {
        ConvergenceParams {
            max_iter: 1000,
            epsilon: 1e-6,
        }
    }
}

impl Default for ConvergenceParams<f32> {
    fn default() -> Self {
        ConvergenceParams {
            max_iter: 1000,
            epsilon: 1e-4,
        }
    }
}

/// Relative gradient stopping test: `||g||_inf < epsilon * (1 + |f|)`.
///
/// A non-finite `f` or gradient never counts as converged.
pub fn converged<F: Float>(f: F, g: &[F], epsilon: F) -> bool {
    let gmax = norm_inf(g);
    f.is_finite() && gmax.is_finite() && gmax < epsilon * (F::one() + f.abs())
}

/// Compute the L2 norm of a vector.
pub fn norm<F: Float>(v: &[F]) -> F {
    let mut s = F::zero();
    for &x in v {
        s = s + x * x;
    }
    s.sqrt()
}

/// Compute the infinity norm (largest absolute component) of a vector.
pub fn norm_inf<F: Float>(v: &[F]) -> F {
    v.iter().fold(F::zero(), |m, &x| {
        let a = x.abs();
        // NaN propagates instead of being swallowed by `max`.
        if a > m || a.is_nan() {
            a
        } else {
            m
        }
    })
}

/// Compute the dot product of two vectors.
pub fn dot<F: Float>(a: &[F], b: &[F]) -> F {
    debug_assert_eq!(a.len(), b.len());
    let mut s = F::zero();
    for i in 0..a.len() {
        s = s + a[i] * b[i];
    }
    s
}

/// `out = x + alpha * d`.
pub(crate) fn axpy_into<F: Float>(out: &mut Vec<F>, x: &[F], alpha: F, d: &[F]) {
    debug_assert_eq!(x.len(), d.len());
    out.clear();
    out.extend(x.iter().zip(d).map(|(&xi, &di)| xi + alpha * di));
}

/// Convert an `f64` literal into `F`, falling back to `fallback` if it is not representable.
pub(crate) fn cst<F: Float>(v: f64, fallback: F) -> F {
    F::from(v).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norms_and_dot() {
        let v = [3.0_f64, -4.0];
        assert_eq!(norm(&v), 5.0);
        assert_eq!(norm_inf(&v), 4.0);
        assert_eq!(dot(&v, &[1.0, 1.0]), -1.0);
    }

    #[test]
    fn norm_inf_propagates_nan() {
        assert!(norm_inf(&[1.0_f64, f64::NAN, 2.0]).is_nan());
    }

    #[test]
    fn relative_gradient_test() {
        // epsilon * (1 + |f|) = 1e-3 * 11
        assert!(converged(10.0_f64, &[1e-2, -5e-3], 1e-3));
        assert!(!converged(10.0_f64, &[2e-2], 1e-3));
        assert!(!converged(f64::NAN, &[0.0], 1e-3));
        assert!(!converged(0.0_f64, &[f64::INFINITY], 1e-3));
    }
}
