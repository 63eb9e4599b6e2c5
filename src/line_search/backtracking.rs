use num_traits::Float;

use super::step::{LsStep, StepContext};
use super::LineSearchKind;
use crate::convergence::cst;
use crate::objective::Objective;

const MAX_ITERS: usize = 64;

/// Backtracking search: shrink the step while the Armijo condition fails and,
/// for the Wolfe variants, grow it while the curvature condition says it is too short.
pub(super) fn search<'a, F: Float, O: Objective<F> + ?Sized>(
    ctx: &'a StepContext<'a, F, O>,
    kind: LineSearchKind,
    c1: F,
    c2: F,
    t0: F,
) -> LsStep<'a, F, O> {
    let decrement = cst(0.7, F::one() / (F::one() + F::one()));
    let increment = cst(2.1, F::one() + F::one());

    let mut step = ctx.step(t0);
    for _ in 0..MAX_ITERS {
        let alpha = step.alpha();
        if !(alpha > F::epsilon()) {
            break;
        }

        // non-finite φ fails the comparison and shrinks the step
        if !step.has_armijo(c1) {
            step.reset(alpha * decrement);
            continue;
        }

        match kind {
            LineSearchKind::BacktrackWolfe => {
                if step.has_wolfe(c2) {
                    return step;
                }
                step.reset(alpha * increment);
            }
            LineSearchKind::BacktrackStrongWolfe => {
                if !step.has_wolfe(c2) {
                    step.reset(alpha * increment);
                } else if step.has_strong_wolfe(c2) {
                    return step;
                } else {
                    step.reset(alpha * decrement);
                }
            }
            _ => return step,
        }
    }

    ctx.step0()
}
