//! CG_DESCENT line search.
//!
//! Hager & Zhang, "A new conjugate gradient method with guaranteed descent and
//! an efficient line search" (SIAM J. Optim., 2005), and "Algorithm 851" (2006).
//! Accepts a step satisfying either the Wolfe conditions or the approximate
//! Wolfe conditions, which stay reliable near a minimizer where the Armijo
//! test drowns in rounding error.

use num_traits::Float;

use super::min_step;
use super::step::{LsStep, StepContext};
use crate::convergence::cst;
use crate::objective::Objective;

const MAX_ITERS: usize = 128;

struct Params<F> {
    c1: F,
    c2: F,
    /// Absolute tolerance on `φ` for the approximate Wolfe test, `ε·|φ(0)|`.
    eps_k: F,
    theta: F,
    gamma: F,
    rho: F,
}

/// Run CG_DESCENT from `t0`; returns the best of the bracket ends and `t = 0`
/// when no acceptable step is found.
pub(super) fn search<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    c1: F,
    c2: F,
    t0: F,
) -> LsStep<'a, F, O> {
    let epsilon = cst(1e-6, F::epsilon().sqrt());
    let params = Params {
        c1,
        c2,
        eps_k: epsilon * ctx.phi0().abs(),
        theta: cst(0.5, F::one() / (F::one() + F::one())),
        gamma: cst(0.66, F::one() / (F::one() + F::one())),
        rho: cst(5.0, F::one() + F::one()),
    };

    let mut c = ctx.step(t0);
    c.dphi();
    if accepts(&mut c, &params) {
        return c;
    }

    let (mut a, mut b) = bracket(ctx, c, &params);

    for _ in 0..MAX_ITERS {
        if !(b.alpha() - a.alpha() > min_step()) {
            break;
        }

        if b.cmp_phi(&mut a) == std::cmp::Ordering::Less {
            if accepts(&mut b, &params) {
                return b;
            }
        } else if a.alpha() > F::zero() && accepts(&mut a, &params) {
            return a;
        }

        let width = b.alpha() - a.alpha();
        let (sa, sb) = secant2(ctx, a, b, &params);

        if sb.alpha() - sa.alpha() > params.gamma * width {
            let mut mid = ctx.step((sa.alpha() + sb.alpha()) / (F::one() + F::one()));
            mid.dphi();
            let (na, nb) = update(ctx, sa, sb, mid, &params);
            a = na;
            b = nb;
        } else {
            a = sa;
            b = sb;
        }
    }

    a.min(b).min(ctx.step0())
}

/// Wolfe or approximate Wolfe.
fn accepts<F: Float, O: Objective<F> + ?Sized>(step: &mut LsStep<'_, F, O>, p: &Params<F>) -> bool {
    if !step.dphi().is_finite() || !step.phi().is_finite() {
        return false;
    }
    (step.has_armijo(p.c1) && step.has_wolfe(p.c2)) || step.has_approx_wolfe(p.c1, p.c2, p.eps_k)
}

/// Expand `[0, c]` until it brackets a point with `φ' >= 0`, or until `φ` rises
/// above `φ(0) + ε_k` (then shrink with the bisection-like update).
fn bracket<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    mut c: LsStep<'a, F, O>,
    p: &Params<F>,
) -> (LsStep<'a, F, O>, LsStep<'a, F, O>) {
    let mut a = ctx.step0();
    let cap = super::max_step::<F>();

    for _ in 0..MAX_ITERS {
        if !c.phi().is_finite() || !c.dphi().is_finite() {
            // back off toward the last good point
            let t = (a.alpha() + c.alpha()) / (F::one() + F::one());
            c.reset_with_grad(t);
            continue;
        }
        if c.dphi() >= F::zero() {
            return (a, c);
        }
        if c.phi() > c.phi0() + p.eps_k {
            return shrink(ctx, ctx.step0(), c, p);
        }

        let next = c.alpha() * p.rho;
        if !(next < cap) {
            break;
        }
        a = c.clone();
        c.reset_with_grad(next);
    }

    (a, c)
}

/// Hager-Zhang update: shrink `[a, b]` using the interior point `c`.
fn update<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    a: LsStep<'a, F, O>,
    b: LsStep<'a, F, O>,
    mut c: LsStep<'a, F, O>,
    p: &Params<F>,
) -> (LsStep<'a, F, O>, LsStep<'a, F, O>) {
    if !(c.alpha() > a.alpha() && c.alpha() < b.alpha()) {
        return (a, b);
    }
    if c.dphi() >= F::zero() {
        return (a, c);
    }
    if c.phi() <= c.phi0() + p.eps_k {
        return (c, b);
    }
    shrink(ctx, a, c, p)
}

/// Bisection-like shrink of `[a, b]` where `φ'(b) < 0` and `φ(b) > φ(0) + ε_k`.
fn shrink<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    mut a: LsStep<'a, F, O>,
    mut b: LsStep<'a, F, O>,
    p: &Params<F>,
) -> (LsStep<'a, F, O>, LsStep<'a, F, O>) {
    for _ in 0..MAX_ITERS {
        if !(b.alpha() - a.alpha() > min_step()) {
            break;
        }
        let t = (F::one() - p.theta) * a.alpha() + p.theta * b.alpha();
        let mut d = ctx.step(t);
        if d.dphi() >= F::zero() {
            return (a, d);
        }
        if d.phi() <= d.phi0() + p.eps_k {
            a = d;
        } else {
            b = d;
        }
    }
    (a, b)
}

/// Secant step on `φ'` between `a` and `b`, bisection when it is not finite.
fn secant<F: Float, O: Objective<F> + ?Sized>(a: &mut LsStep<'_, F, O>, b: &mut LsStep<'_, F, O>) -> F {
    let (ta, tb) = (a.alpha(), b.alpha());
    let (ga, gb) = (a.dphi(), b.dphi());
    let t = (ta * gb - tb * ga) / (gb - ga);
    if t.is_finite() {
        t
    } else {
        (ta + tb) / (F::one() + F::one())
    }
}

/// Double secant step.
fn secant2<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    mut a: LsStep<'a, F, O>,
    mut b: LsStep<'a, F, O>,
    p: &Params<F>,
) -> (LsStep<'a, F, O>, LsStep<'a, F, O>) {
    let tc = secant(&mut a, &mut b);
    let mut c = ctx.step(tc);
    c.dphi();

    let (a_old, b_old) = (a.clone(), b.clone());
    let (mut na, mut nb) = update(ctx, a, b, c, p);

    let tbar = if nb.alpha() == tc {
        let mut b_old = b_old;
        secant(&mut b_old, &mut nb)
    } else if na.alpha() == tc {
        let mut a_old = a_old;
        secant(&mut a_old, &mut na)
    } else {
        return (na, nb);
    };

    let mut cbar = ctx.step(tbar);
    cbar.dphi();
    update(ctx, na, nb, cbar, p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Problem;

    fn quartic() -> Problem<'static, f64> {
        // φ(t) = (t - 2)^4 + (t - 2)^2 along d = 1 from x = 0
        let f = |x: &[f64]| (x[0] - 2.0).powi(4) + (x[0] - 2.0).powi(2);
        Problem::new(1, f).with_gradient(move |x: &[f64]| {
            let u = x[0] - 2.0;
            (f(x), vec![4.0 * u.powi(3) + 2.0 * u])
        })
    }

    #[test]
    fn accepts_wolfe_step() {
        let p = quartic();
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 20.0, &[-36.0]);
        for t0 in [0.05, 1.0, 7.0] {
            let mut step = search(&ctx, 1e-4, 0.9, t0);
            assert!(step.is_valid(), "t0 = {t0}");
            assert!(step.phi() < 20.0);
            let wolfe = step.has_armijo(1e-4) && step.has_wolfe(0.9);
            let approx = step.has_approx_wolfe(1e-4, 0.9, 1e-6 * 20.0);
            assert!(wolfe || approx, "t0 = {t0}, alpha = {}", step.alpha());
        }
    }

    #[test]
    fn secant_hits_quadratic_minimum() {
        let p = Problem::new(1, |x: &[f64]| (x[0] - 3.0).powi(2))
            .with_gradient(|x: &[f64]| ((x[0] - 3.0).powi(2), vec![2.0 * (x[0] - 3.0)]));
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 9.0, &[-6.0]);
        let mut a = ctx.step0();
        let mut b = ctx.step(5.0);
        assert!((secant(&mut a, &mut b) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn never_worse_than_not_moving() {
        // every positive step is infeasible
        let p = Problem::new(1, |x: &[f64]| if x[0] > 0.0 { f64::INFINITY } else { -x[0] });
        let ctx = StepContext::new(&p, &[0.0], &[1.0], 0.0, &[-1.0]);
        let mut step = search(&ctx, 1e-4, 0.9, 1.0);
        assert!(!step.is_valid());
    }
}
