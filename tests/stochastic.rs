use nano_optim::functions::Rosenbrock;
use nano_optim::{
    Callbacks, Objective, OptimState, Problem, StochConfig, StochMethod, StochasticOptimizer,
    TerminationReason,
};

/// f(x) = 0.5 (x0^2 + 4 x1^2)
fn valley() -> Problem<'static, f64> {
    let f = |x: &[f64]| 0.5 * (x[0] * x[0] + 4.0 * x[1] * x[1]);
    Problem::new(2, f).with_gradient(move |x: &[f64]| (f(x), vec![x[0], 4.0 * x[1]]))
}

fn small(method: StochMethod) -> StochConfig<f64> {
    StochConfig {
        epochs: 4,
        epoch_size: 50,
        ..StochConfig::new(method)
    }
}

fn pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap()
}

// ============================================================
// Learning-rate tuning
// ============================================================

#[test]
fn tuning_avoids_both_extremes() {
    let config = small(StochMethod::Sgd);
    let first = config.candidates[0];
    let last = *config.candidates.last().unwrap();
    let opt = StochasticOptimizer::new(config).unwrap();

    let rate = opt.tune(&valley(), &[1.0, 1.0]);
    assert!(rate != first && rate != last, "picked {rate}");
    // rate 1 zeroes both coordinates exactly within the trial
    assert_eq!(rate, 1.0);
}

#[test]
fn parallel_tuning_matches_serial() {
    let p = Rosenbrock { dim: 3 };
    let x0 = p_start();
    for method in StochMethod::ALL {
        let opt = StochasticOptimizer::new(small(method)).unwrap();
        let pool = pool();
        assert_eq!(opt.tune(&p, &x0), opt.tune_par(&p, &x0, &pool), "{method}");

        let serial = opt.minimize(&p, &x0);
        let parallel = opt.minimize_par(&p, &x0, &pool);
        assert_eq!(serial.x(), parallel.x(), "{method}");
        assert_eq!(serial.value(), parallel.value(), "{method}");
        assert_eq!(serial.iterations(), parallel.iterations(), "{method}");
    }
}

fn p_start() -> Vec<f64> {
    vec![-1.2, 1.0, -1.2]
}

// ============================================================
// Runs with a fixed learning rate
// ============================================================

#[test]
fn one_report_per_epoch() {
    let p = Rosenbrock { dim: 2 };
    for method in StochMethod::ALL {
        let config = StochConfig {
            epochs: 5,
            epoch_size: 20,
            alpha0: Some(1e-3),
            ..StochConfig::new(method)
        };
        let opt = StochasticOptimizer::new(config).unwrap();

        let mut reports = Vec::new();
        let mut cb = Callbacks::new().on_iteration(|s: &OptimState<f64>| {
            reports.push(s.f);
            true
        });
        let r = opt.minimize_with(&p, &[-1.2, 1.0], &mut cb);
        drop(cb);

        assert_eq!(reports.len(), 5, "{method}");
        assert_eq!(r.iterations(), 5, "{method}");
        assert_eq!(r.termination, TerminationReason::MaxIterations);
        assert!(r.value() < Objective::<f64>::value(&p, &[-1.2, 1.0]), "{method}");
        assert!(r.n_grad_calls() > 100, "{method}");
    }
}

#[test]
fn callback_stops_the_run() {
    let config = StochConfig {
        alpha0: Some(1e-3),
        ..small(StochMethod::Asgd)
    };
    let opt = StochasticOptimizer::new(config).unwrap();
    let mut seen = 0;
    let mut cb = Callbacks::new().on_iteration(|_: &OptimState<f64>| {
        seen += 1;
        seen < 2
    });
    let r = opt.minimize_with(&Rosenbrock { dim: 2 }, &[-1.2, 1.0], &mut cb);
    drop(cb);
    assert_eq!(seen, 2);
    assert_eq!(r.termination, TerminationReason::UserTerminated);
}

#[test]
fn sgd_stops_once_the_gradient_vanishes() {
    let config = StochConfig {
        alpha0: Some(1.0),
        ..small(StochMethod::Sgd)
    };
    let r = StochasticOptimizer::new(config).unwrap().minimize(&valley(), &[1.0, 1.0]);
    assert!(r.converged());
    assert_eq!(r.value(), 0.0);
    assert!(r.n_grad_calls() < 20);
}

#[test]
fn averaged_methods_end_near_the_minimum() {
    for method in [StochMethod::Asgd, StochMethod::Sia] {
        let config = StochConfig {
            alpha0: Some(0.2),
            ..small(method)
        };
        let r = StochasticOptimizer::new(config).unwrap().minimize(&valley(), &[1.0, 1.0]);
        assert!(r.value() < 1e-2, "{method}: f = {}", r.value());
    }
}

#[test]
fn diverging_rate_loses_the_tuning() {
    // with no decay the rate 100 blows up; the tiny rate leaves f unchanged
    let config = StochConfig {
        decay: 0.0,
        candidates: vec![100.0, 1e-300],
        ..small(StochMethod::Sgd)
    };
    let opt = StochasticOptimizer::new(config).unwrap();
    assert_eq!(opt.tune(&valley(), &[1.0, 1.0]), 1e-300);
    assert_eq!(opt.tune_par(&valley(), &[1.0, 1.0], &pool()), 1e-300);
}

#[test]
fn parallel_run_reports_to_callbacks() {
    let p = Rosenbrock { dim: 2 };
    let x0 = [-1.2, 1.0];
    let opt = StochasticOptimizer::new(small(StochMethod::Asgd)).unwrap();

    let mut serial_reports = Vec::new();
    let mut cb = Callbacks::new().on_iteration(|s: &OptimState<f64>| {
        serial_reports.push(s.f);
        true
    });
    let serial = opt.minimize_with(&p, &x0, &mut cb);
    drop(cb);

    let mut parallel_reports = Vec::new();
    let mut cb = Callbacks::new().on_iteration(|s: &OptimState<f64>| {
        parallel_reports.push(s.f);
        true
    });
    let parallel = opt.minimize_par_with(&p, &x0, &pool(), &mut cb);
    drop(cb);

    // only the full run reports, once per epoch
    assert_eq!(parallel_reports.len(), 4);
    assert_eq!(parallel_reports, serial_reports);
    assert_eq!(parallel.x(), serial.x());
}
