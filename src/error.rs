/// Errors raised while building an optimizer from its configuration.
///
/// Every check runs before the objective is evaluated even once.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Line-search constants must satisfy `0 < c1 < c2 < 1`.
    #[error("line-search constants must satisfy 0 < c1 < c2 < 1 (got c1={c1}, c2={c2})")]
    InvalidLineSearchConstants { c1: f64, c2: f64 },
    /// Convergence tolerance must be finite and positive.
    #[error("convergence tolerance must be finite and positive (got {0})")]
    InvalidTolerance(f64),
    /// The iteration (or epoch) budget is zero.
    #[error("iteration budget must be at least 1")]
    ZeroIterations,
    /// The number of steps per epoch is zero.
    #[error("epoch size must be at least 1")]
    ZeroEpochSize,
    /// Learning rate (or a tuning candidate) is not finite and positive.
    #[error("learning rate must be finite and positive (got {0})")]
    InvalidLearningRate(f64),
    /// Learning-rate tuning was requested with no candidate rates.
    #[error("learning-rate tuning needs at least one candidate")]
    NoCandidates,
    /// Learning-rate decay is negative or not finite.
    #[error("learning-rate decay must be finite and non-negative (got {0})")]
    InvalidDecay(f64),
    /// A textual selector did not match any known name.
    #[error("unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },
}
