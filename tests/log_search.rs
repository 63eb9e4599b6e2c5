use approx::assert_abs_diff_eq;
use nano_optim::{log10_min_search, log10_min_search_mt};

fn bowl(p: f64) -> f64 {
    (p.log10() - 0.7).powi(2)
}

#[test]
fn finds_the_minimizing_exponent() {
    let (value, p) = log10_min_search(bowl, -3.0, 3.0, 1e-4, 7).unwrap();
    assert_abs_diff_eq!(p.log10(), 0.7, epsilon = 1e-3);
    assert!(value < 1e-6);
}

#[test]
fn threaded_search_matches_serial() {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    for splits in [1, 4, 9] {
        let serial = log10_min_search(bowl, -3.0, 3.0, 1e-3, splits).unwrap();
        let threaded = log10_min_search_mt(bowl, &pool, -3.0, 3.0, 1e-3, splits).unwrap();
        assert_eq!(serial, threaded, "splits = {splits}");
    }
}

#[test]
fn increasing_objective_drives_to_the_low_end() {
    let (_, p) = log10_min_search(|p: f64| p, -2.0, 1.0, 1e-3, 5).unwrap();
    assert!(p <= 10f64.powf(-1.99), "p = {p}");
}

#[test]
fn non_finite_results_never_win() {
    let op = |p: f64| if p > 1.0 { f64::NAN } else { -p };
    let (value, p) = log10_min_search(op, -1.0, 2.0, 1e-3, 6).unwrap();
    assert!(value.is_finite());
    assert!(p <= 1.0);
    assert_abs_diff_eq!(p, 1.0, epsilon = 1e-2);
}

#[test]
fn works_with_ordered_tuples() {
    // ties on the first field fall back to the second
    let op = |p: f64| (0, (p.log10() + 1.0).abs());
    let ((_, dist), p) = log10_min_search(op, -2.0, 2.0, 1e-4, 4).unwrap();
    assert!(dist < 1e-3);
    assert_abs_diff_eq!(p.log10(), -1.0, epsilon = 1e-3);
}
