//! Greedy search for a positive 1-D hyperparameter on a log10 scale.
//!
//! Each round evaluates `splits` evenly spaced exponents in `[minlog, maxlog]`,
//! then narrows the interval around the best exponent seen in any round. Rounds
//! stop once the interval is no wider than `epslog`.

use std::cmp::Ordering;
use std::sync::mpsc;

use num_traits::Float;

use crate::convergence::cst;

/// Smallest number of points evaluated per round.
pub const MIN_SPLITS: usize = 4;

/// Every `(result, exponent)` evaluated so far, kept sorted best first.
struct History<R, F> {
    values: Vec<(R, F)>,
}

impl<R: PartialOrd, F: Float> History<R, F> {
    fn new() -> Self {
        History { values: Vec::new() }
    }

    fn insert(&mut self, value: (R, F)) {
        let pos = self
            .values
            .partition_point(|probe| order(probe, &value) != Ordering::Greater);
        self.values.insert(pos, value);
    }

    fn best_log(&self) -> Option<F> {
        self.values.first().map(|&(_, log)| log)
    }

    fn into_best(self) -> Option<(R, F)> {
        self.values
            .into_iter()
            .next()
            .map(|(result, log)| (result, param(log)))
    }
}

/// Lexicographic order on `(result, exponent)`; results that do not compare
/// with themselves (NaN) sort last.
fn order<R: PartialOrd, F: Float>(a: &(R, F), b: &(R, F)) -> Ordering {
    let by_result = match a.0.partial_cmp(&b.0) {
        Some(o) => o,
        None => {
            let a_bad = a.0.partial_cmp(&a.0).is_none();
            let b_bad = b.0.partial_cmp(&b.0).is_none();
            match (a_bad, b_bad) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => Ordering::Equal,
            }
        }
    };
    by_result.then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
}

fn param<F: Float>(log: F) -> F {
    cst(10.0, F::one() + F::one()).powf(log)
}

fn exponent<F: Float>(minlog: F, varlog: F, i: usize) -> F {
    minlog + varlog * F::from(i).unwrap_or_else(F::max_value)
}

/// `(best ± varlog·(splits - 1)/splits)`.
fn narrow<F: Float>(best: F, varlog: F, splits: usize) -> (F, F) {
    let n = F::from(splits).unwrap_or_else(F::max_value);
    let half = varlog * (n - F::one()) / n;
    (best - half, best + half)
}

fn round_width<F: Float>(minlog: F, maxlog: F, splits: usize) -> F {
    (maxlog - minlog) / F::from(splits - 1).unwrap_or_else(F::one)
}

/// Minimize `op(10^log)` over `log ∈ [minlog, maxlog]`.
///
/// `splits` is raised to [`MIN_SPLITS`] if smaller. Returns the best result and
/// the parameter `10^log` that produced it, or `None` when no round ran
/// (`maxlog - minlog <= epslog` or `epslog <= 0`).
pub fn log10_min_search<R, F, Op>(
    op: Op,
    mut minlog: F,
    mut maxlog: F,
    epslog: F,
    splits: usize,
) -> Option<(R, F)>
where
    R: PartialOrd,
    F: Float,
    Op: Fn(F) -> R,
{
    let splits = splits.max(MIN_SPLITS);
    let mut history = History::new();

    while maxlog - minlog > epslog && epslog > F::zero() {
        let varlog = round_width(minlog, maxlog, splits);
        for i in 0..splits {
            let log = exponent(minlog, varlog, i);
            history.insert((op(param(log)), log));
        }

        let best = history.best_log()?;
        (minlog, maxlog) = narrow(best, varlog, splits);
    }

    history.into_best()
}

/// [`log10_min_search`] evaluating the points of each round concurrently on `pool`.
///
/// Each evaluation is its own task; results come back over a channel and are
/// inserted by the calling thread. A round finishes completely before the
/// interval is narrowed.
pub fn log10_min_search_mt<R, F, Op>(
    op: Op,
    pool: &rayon::ThreadPool,
    mut minlog: F,
    mut maxlog: F,
    epslog: F,
    splits: usize,
) -> Option<(R, F)>
where
    R: PartialOrd + Send,
    F: Float + Send + Sync,
    Op: Fn(F) -> R + Sync,
{
    let splits = splits.max(MIN_SPLITS);
    let mut history = History::new();
    let op = &op;
    let (tx, rx) = mpsc::channel();

    while maxlog - minlog > epslog && epslog > F::zero() {
        let varlog = round_width(minlog, maxlog, splits);
        let round_tx = tx.clone();
        pool.scope(move |s| {
            for i in 0..splits {
                let tx = round_tx.clone();
                s.spawn(move |_| {
                    let log = exponent(minlog, varlog, i);
                    let _ = tx.send((op(param(log)), log));
                });
            }
        });

        for value in rx.try_iter() {
            history.insert(value);
        }

        let best = history.best_log()?;
        (minlog, maxlog) = narrow(best, varlog, splits);
    }

    history.into_best()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_sorts_nan_last_and_ties_by_exponent() {
        let mut h = History::new();
        h.insert((f64::NAN, 0.0));
        h.insert((2.0, 1.0));
        h.insert((1.0, 3.0));
        h.insert((1.0, 2.0));
        let logs: Vec<f64> = h.values.iter().map(|v| v.1).collect();
        assert_eq!(logs, vec![2.0, 3.0, 1.0, 0.0]);
    }

    #[test]
    fn empty_range_runs_nothing() {
        let calls = std::cell::Cell::new(0);
        let out = log10_min_search(
            |p: f64| {
                calls.set(calls.get() + 1);
                p
            },
            0.0,
            0.0,
            0.1,
            5,
        );
        assert!(out.is_none());
        assert_eq!(calls.get(), 0);
        assert!(log10_min_search(|p: f64| p, -1.0, 1.0, 0.0, 5).is_none());
    }

    #[test]
    fn splits_are_raised_to_the_minimum() {
        let calls = std::cell::Cell::new(0);
        // one round: after it the width is 2 * 3/4 * (2/3) = 1 < 1.5
        log10_min_search(
            |p: f64| {
                calls.set(calls.get() + 1);
                p
            },
            0.0,
            2.0,
            1.5,
            1,
        );
        assert_eq!(calls.get(), MIN_SPLITS);
    }
}
