//! Step observer trait for monitoring solver progress.

/// Trait for observing solver steps.
///
/// Implement this trait to monitor solver progress (e.g., for debugging,
/// visualization, or performance profiling). All methods have default
/// no-op implementations.
pub trait StepObserver {
    /// Called after all bodies have been integrated.
    fn on_integrate(&mut self) {}

    /// Called after each constraint relaxation or IK iteration.
    fn on_constraint_iteration(&mut self, _iteration: usize) {}

    /// Called when a simulation step is fully complete.
    fn on_step_complete(&mut self) {}
}

/// A no-op observer that does nothing. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}

/// Forwards every hook to `tracing` at TRACE level and counts completed steps.
#[derive(Debug, Default)]
pub struct TracingStepObserver {
    steps: u64,
    iterations: u64,
}

impl TracingStepObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps completed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Relaxation iterations seen so far, across all steps.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

impl StepObserver for TracingStepObserver {
    fn on_integrate(&mut self) {
        tracing::trace!(step = self.steps, "integrated");
    }

    fn on_constraint_iteration(&mut self, iteration: usize) {
        self.iterations += 1;
        tracing::trace!(step = self.steps, iteration, "relaxed");
    }

    fn on_step_complete(&mut self) {
        tracing::trace!(step = self.steps, "step complete");
        self.steps += 1;
    }
}
