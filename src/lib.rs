pub mod callbacks;
pub mod convergence;
pub mod error;
pub mod functions;
pub mod line_search;
pub mod log_search;
pub mod objective;
pub mod result;
pub mod solvers;
pub mod state;
pub mod stats;
pub mod stochastic;

pub use callbacks::Callbacks;
pub use convergence::ConvergenceParams;
pub use error::ConfigError;
pub use line_search::{LineSearch, LineSearchKind, StepInit};
pub use log_search::{log10_min_search, log10_min_search_mt};
pub use objective::{central_difference, gradient_check, Objective, Problem};
pub use result::{OptimResult, TerminationReason};
pub use solvers::batch::{BatchConfig, BatchMethod, BatchOptimizer};
pub use solvers::cgd::CgdBeta;
pub use solvers::lbfgs::History;
pub use state::OptimState;
pub use stats::RunningStats;
pub use stochastic::{AverageVector, StochConfig, StochMethod, StochasticOptimizer};
