use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nano_optim::functions::Rosenbrock;
use nano_optim::{
    log10_min_search, BatchConfig, BatchMethod, BatchOptimizer, CgdBeta, LineSearchKind,
    StochConfig, StochMethod, StochasticOptimizer,
};

#[path = "common/mod.rs"]
mod common;
use common::*;

fn batch_methods() -> [BatchMethod; 4] {
    [
        BatchMethod::Gd,
        BatchMethod::Cgd(CgdBeta::HagerZhang),
        BatchMethod::Cgd(CgdBeta::PolakRibiere),
        BatchMethod::Lbfgs,
    ]
}

fn bench_batch_rosenbrock(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_rosenbrock");
    for n in [2, 10, 100] {
        let p = Rosenbrock { dim: n };
        let x0 = rosenbrock_start(n);
        for method in batch_methods() {
            let opt = BatchOptimizer::new(BatchConfig::new(method)).unwrap();
            group.bench_with_input(BenchmarkId::new(method.to_string(), n), &x0, |b, x0| {
                b.iter(|| black_box(opt.minimize(&p, black_box(x0))))
            });
        }
    }
    group.finish();
}

fn bench_batch_ill_conditioned(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_ill_conditioned");
    for kappa in [1e2, 1e4] {
        let p = scaled_quadratic(50, kappa);
        let x0 = ones(50);
        for method in batch_methods() {
            let opt = BatchOptimizer::new(BatchConfig::new(method)).unwrap();
            group.bench_with_input(BenchmarkId::new(method.to_string(), kappa), &x0, |b, x0| {
                b.iter(|| black_box(opt.minimize(&p, black_box(x0))))
            });
        }
    }
    group.finish();
}

fn bench_line_searches(c: &mut Criterion) {
    let mut group = c.benchmark_group("lbfgs_line_search");
    let p = Rosenbrock { dim: 10 };
    let x0 = rosenbrock_start(10);
    for kind in LineSearchKind::ALL {
        let mut config = BatchConfig::new(BatchMethod::Lbfgs);
        config.line_search = kind;
        let opt = BatchOptimizer::new(config).unwrap();
        group.bench_with_input(BenchmarkId::new(kind.name(), 10), &x0, |b, x0| {
            b.iter(|| black_box(opt.minimize(&p, black_box(x0))))
        });
    }
    group.finish();
}

fn bench_stochastic(c: &mut Criterion) {
    let mut group = c.benchmark_group("stochastic");
    let p = scaled_quadratic(20, 1e2);
    let x0 = ones(20);
    for method in StochMethod::ALL {
        let config = StochConfig {
            alpha0: Some(1e-3),
            ..StochConfig::new(method)
        };
        let opt = StochasticOptimizer::new(config).unwrap();
        group.bench_with_input(BenchmarkId::new(method.name(), "fixed"), &x0, |b, x0| {
            b.iter(|| black_box(opt.minimize(&p, black_box(x0))))
        });

        let opt = StochasticOptimizer::new(StochConfig::new(method)).unwrap();
        group.bench_with_input(BenchmarkId::new(method.name(), "tuned"), &x0, |b, x0| {
            b.iter(|| black_box(opt.minimize(&p, black_box(x0))))
        });
    }
    group.finish();
}

fn bench_log_search(c: &mut Criterion) {
    let op = |p: f64| (p.log10() - 0.7).powi(2);
    c.bench_function("log10_min_search", |b| {
        b.iter(|| black_box(log10_min_search(op, -6.0, 6.0, black_box(1e-4), 8)))
    });
}

criterion_group!(
    benches,
    bench_batch_rosenbrock,
    bench_batch_ill_conditioned,
    bench_line_searches,
    bench_stochastic,
    bench_log_search,
);
criterion_main!(benches);
