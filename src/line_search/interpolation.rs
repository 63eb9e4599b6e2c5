use num_traits::Float;

use super::step::{LsStep, StepContext};
use super::{tenth, LineSearchKind};
use crate::convergence::cst;
use crate::objective::Objective;

const MAX_ITERS: usize = 64;

/// Strong-Wolfe search (Nocedal & Wright, algorithms 3.5 and 3.6).
///
/// Tracks forward (`t *= 3`, capped at 1000) until a bracket containing an
/// acceptable step is found, then zooms into it by bisection or by
/// safeguarded cubic interpolation.
pub(super) fn search<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    kind: LineSearchKind,
    c1: F,
    c2: F,
    t0: F,
) -> LsStep<'a, F, O> {
    let cubic = kind == LineSearchKind::InterpolationCubic;
    let t_max = cst(1000.0, F::max_value());
    let three = cst(3.0, F::one() + F::one() + F::one());

    let mut prev = ctx.step0();
    let mut curr = ctx.step(t0.min(t_max));

    for i in 0..MAX_ITERS {
        curr.dphi();

        if !curr.has_armijo(c1) || (i > 0 && curr.phi() >= prev.phi()) {
            return zoom(ctx, prev, curr, c1, c2, cubic);
        }

        if curr.has_strong_wolfe(c2) {
            return curr;
        }

        if curr.dphi() >= F::zero() {
            return zoom(ctx, curr, prev, c1, c2, cubic);
        }

        let next = (curr.alpha() * three).min(t_max);
        if next <= curr.alpha() {
            // stuck at the cap with sufficient decrease only
            return curr;
        }
        prev = curr.clone();
        curr.reset(next);
    }

    ctx.step0()
}

/// Zoom inside `[lo, hi]` (either order) where `lo` has the lowest `φ` seen so far
/// among Armijo steps.
fn zoom<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    mut lo: LsStep<'a, F, O>,
    mut hi: LsStep<'a, F, O>,
    c1: F,
    c2: F,
    cubic: bool,
) -> LsStep<'a, F, O> {
    for _ in 0..MAX_ITERS {
        if (hi.alpha() - lo.alpha()).abs() < F::epsilon() {
            break;
        }

        let t = if cubic {
            cubic_trial(&mut lo, &mut hi)
        } else {
            bisection(&lo, &hi)
        };

        let mut trial = ctx.step(t);
        trial.dphi();

        if !trial.has_armijo(c1) || trial.phi() >= lo.phi() {
            hi = trial;
        } else {
            if trial.has_strong_wolfe(c2) {
                return trial;
            }
            if trial.dphi() * (hi.alpha() - lo.alpha()) >= F::zero() {
                hi = lo;
            }
            lo = trial;
        }
    }

    ctx.step0()
}

fn bisection<F: Float, O: Objective<F> + ?Sized>(lo: &LsStep<'_, F, O>, hi: &LsStep<'_, F, O>) -> F {
    (lo.alpha() + hi.alpha()) / (F::one() + F::one())
}

/// Minimizer of the cubic interpolating `φ` and `φ'` at both ends,
/// falling back to bisection when it is not finite or too close to an end.
fn cubic_trial<F: Float, O: Objective<F> + ?Sized>(
    lo: &mut LsStep<'_, F, O>,
    hi: &mut LsStep<'_, F, O>,
) -> F {
    let (a, b) = (lo.alpha(), hi.alpha());
    let (fa, fb) = (lo.phi(), hi.phi());
    let (ga, gb) = (lo.dphi(), hi.dphi());

    let t = cubic_minimizer(a, fa, ga, b, fb, gb);

    let (left, right) = (a.min(b), a.max(b));
    let margin = tenth::<F>() * (right - left);
    if t.is_finite() && t >= left + margin && t <= right - margin {
        t
    } else {
        bisection(lo, hi)
    }
}

/// Nocedal & Wright (3.59).
pub(super) fn cubic_minimizer<F: Float>(a: F, fa: F, ga: F, b: F, fb: F, gb: F) -> F {
    let three = cst(3.0, F::one() + F::one() + F::one());
    let two = F::one() + F::one();

    let d1 = ga + gb - three * (fa - fb) / (a - b);
    let disc = d1 * d1 - ga * gb;
    if !(disc >= F::zero()) {
        return F::nan();
    }
    let d2 = (b - a).signum() * disc.sqrt();
    b - (b - a) * (gb + d2 - d1) / (gb - ga + two * d2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Problem;

    #[test]
    fn cubic_is_exact_on_cubics() {
        // φ(t) = t^3 - 3t, local minimum at t = 1
        let phi = |t: f64| t * t * t - 3.0 * t;
        let dphi = |t: f64| 3.0 * t * t - 3.0;
        let t = cubic_minimizer(0.0, phi(0.0), dphi(0.0), 2.0, phi(2.0), dphi(2.0));
        assert!((t - 1.0).abs() < 1e-12, "t = {t}");
    }

    #[test]
    fn cubic_without_real_minimizer_is_nan() {
        // both slopes negative and decreasing values: no interior stationary point
        assert!(cubic_minimizer(0.0_f64, 0.0, -1.0, 1.0, -10.0, -30.0).is_nan());
    }

    #[test]
    fn extrapolates_on_shallow_slope() {
        // φ(t) = (t - 20)^2 / 400, minimum far beyond t0 = 1
        let p = Problem::new(1, |x: &[f64]| (x[0] - 20.0).powi(2) / 400.0)
            .with_gradient(|x: &[f64]| ((x[0] - 20.0).powi(2) / 400.0, vec![(x[0] - 20.0) / 200.0]));
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 1.0, &[-0.1]);
        for kind in [
            LineSearchKind::InterpolationBisection,
            LineSearchKind::InterpolationCubic,
        ] {
            let mut step = search(&ctx, kind, 1e-4, 0.1, 1.0);
            assert!(step.is_valid());
            assert!(step.has_strong_wolfe(0.1), "{kind}: alpha = {}", step.alpha());
            assert!(step.alpha() > 3.0);
        }
    }

    #[test]
    fn zooms_on_overshoot() {
        // φ(t) = (t - 0.01)^2, t0 = 1 overshoots
        let p = Problem::new(1, |x: &[f64]| (x[0] - 0.01).powi(2))
            .with_gradient(|x: &[f64]| ((x[0] - 0.01).powi(2), vec![2.0 * (x[0] - 0.01)]));
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 1e-4, &[-0.02]);
        let mut step = search(&ctx, LineSearchKind::InterpolationCubic, 1e-4, 0.1, 1.0);
        assert!(step.is_valid());
        assert!((step.alpha() - 0.01).abs() < 2e-3, "alpha = {}", step.alpha());
    }
}
