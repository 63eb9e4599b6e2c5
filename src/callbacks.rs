use crate::state::OptimState;

type MessageFn<'a> = dyn FnMut(&str) + 'a;
type IterationFn<'a, F> = dyn FnMut(&OptimState<F>) -> bool + 'a;

/// Diagnostic sinks for a single `minimize` call.
///
/// Warnings and errors go to the `log` facade unless a sink is installed.
/// The iteration sink sees the current state once per outer iteration, before
/// the convergence check; returning `false` stops the run.
pub struct Callbacks<'a, F> {
    warning: Option<Box<MessageFn<'a>>>,
    error: Option<Box<MessageFn<'a>>>,
    iteration: Option<Box<IterationFn<'a, F>>>,
}

impl<F> Default for Callbacks<'_, F> {
    fn default() -> Self {
        Callbacks {
            warning: None,
            error: None,
            iteration: None,
        }
    }
}

impl<'a, F> Callbacks<'a, F> {
    /// No sinks installed: diagnostics go to `log`, iterations are not reported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a warning sink.
    pub fn on_warning(mut self, op: impl FnMut(&str) + 'a) -> Self {
        self.warning = Some(Box::new(op));
        self
    }

    /// Install an error sink.
    pub fn on_error(mut self, op: impl FnMut(&str) + 'a) -> Self {
        self.error = Some(Box::new(op));
        self
    }

    /// Install an iteration sink.
    pub fn on_iteration(mut self, op: impl FnMut(&OptimState<F>) -> bool + 'a) -> Self {
        self.iteration = Some(Box::new(op));
        self
    }

    pub(crate) fn warn(&mut self, message: &str) {
        match self.warning.as_mut() {
            Some(op) => op(message),
            None => log::warn!("{message}"),
        }
    }

    pub(crate) fn error(&mut self, message: &str) {
        match self.error.as_mut() {
            Some(op) => op(message),
            None => log::error!("{message}"),
        }
    }

    /// Report an iteration; `false` means the caller asked to stop.
    pub(crate) fn iteration(&mut self, state: &OptimState<F>) -> bool {
        match self.iteration.as_mut() {
            Some(op) => op(state),
            None => true,
        }
    }
}

impl<F> std::fmt::Debug for Callbacks<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("warning", &self.warning.is_some())
            .field("error", &self.error.is_some())
            .field("iteration", &self.iteration.is_some())
            .finish()
    }
}
