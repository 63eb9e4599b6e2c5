#![allow(dead_code)]

use nano_optim::Problem;

// ─── Starting points ───────────────────────────────────────────────────────

/// Alternating `-1.2, 1.0, ...`, the classic Rosenbrock start.
pub fn rosenbrock_start(n: usize) -> Vec<f64> {
    (0..n).map(|i| if i % 2 == 0 { -1.2 } else { 1.0 }).collect()
}

pub fn ones(n: usize) -> Vec<f64> {
    vec![1.0; n]
}

// ─── Ill-conditioned quadratic ─────────────────────────────────────────────
// f(x) = Σ κ^(i/(n-1)) x_i², condition number κ.

pub fn scaled_quadratic(n: usize, kappa: f64) -> Problem<'static, f64> {
    let weights: Vec<f64> = (0..n)
        .map(|i| kappa.powf(i as f64 / (n.max(2) - 1) as f64))
        .collect();
    let w = weights.clone();
    Problem::new(n, move |x: &[f64]| {
        x.iter().zip(&w).map(|(v, w)| w * v * v).sum()
    })
    .with_gradient(move |x: &[f64]| {
        let f = x.iter().zip(&weights).map(|(v, w)| w * v * v).sum();
        let g = x.iter().zip(&weights).map(|(v, w)| 2.0 * w * v).collect();
        (f, g)
    })
}
