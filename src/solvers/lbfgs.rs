use std::collections::VecDeque;

use num_traits::Float;

use crate::convergence::dot;

/// One curvature pair `s = x_k - x_{k-1}`, `y = g_k - g_{k-1}`, with `ρ = 1 / s·y`.
#[derive(Debug, Clone)]
struct Pair<F> {
    s: Vec<F>,
    y: Vec<F>,
    rho: F,
}

/// Bounded L-BFGS history: the newest `capacity` pairs, oldest evicted first.
#[derive(Debug, Clone)]
pub struct History<F> {
    capacity: usize,
    pairs: VecDeque<Pair<F>>,
}

impl<F: Float> History<F> {
    /// Empty history keeping at most `capacity` pairs. A zero capacity never
    /// stores anything, so the direction is always steepest descent.
    pub fn new(capacity: usize) -> Self {
        History {
            capacity,
            pairs: VecDeque::with_capacity(capacity),
        }
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Record the step from `(x_old, g_old)` to `(x_new, g_new)`.
    ///
    /// Returns `false` (and stores nothing) when the curvature `s·y` is not
    /// positive or capacity is zero.
    pub fn push(&mut self, x_old: &[F], g_old: &[F], x_new: &[F], g_new: &[F]) -> bool {
        if self.capacity == 0 {
            return false;
        }

        let s: Vec<F> = x_new.iter().zip(x_old).map(|(&a, &b)| a - b).collect();
        let y: Vec<F> = g_new.iter().zip(g_old).map(|(&a, &b)| a - b).collect();
        let sy = dot(&s, &y);
        if !(sy > F::zero()) || !sy.is_finite() {
            return false;
        }

        if self.pairs.len() == self.capacity {
            self.pairs.pop_front();
        }
        self.pairs.push_back(Pair {
            s,
            y,
            rho: F::one() / sy,
        });
        true
    }

    /// Drop every stored pair.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Two-loop recursion: `-H_k·g` for the inverse-Hessian approximation
    /// built from the stored pairs, or `-g` when the history is empty.
    pub fn direction(&self, g: &[F]) -> Vec<F> {
        let mut q = g.to_vec();

        // newest to oldest
        let mut alpha = Vec::with_capacity(self.pairs.len());
        for pair in self.pairs.iter().rev() {
            let a = pair.rho * dot(&pair.s, &q);
            for (qi, &yi) in q.iter_mut().zip(&pair.y) {
                *qi = *qi - a * yi;
            }
            alpha.push(a);
        }

        // H_0 = (s·y / y·y) I from the newest pair
        let mut r = q;
        if let Some(last) = self.pairs.back() {
            let yy = dot(&last.y, &last.y);
            let gamma = F::one() / (last.rho * yy);
            if gamma.is_finite() && gamma > F::zero() {
                for v in r.iter_mut() {
                    *v = *v * gamma;
                }
            }
        }

        // oldest to newest
        for (pair, &a) in self.pairs.iter().zip(alpha.iter().rev()) {
            let b = pair.rho * dot(&pair.y, &r);
            for (ri, &si) in r.iter_mut().zip(&pair.s) {
                *ri = *ri + (a - b) * si;
            }
        }

        for v in r.iter_mut() {
            *v = -*v;
        }
        r
    }
}
