use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The order in which pending path edges are taken from the worklist.
/// Results do not depend on it, only the amount of work does.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum WorklistOrder {
    #[default]
    Fifo,
    Lifo,
}

#[derive(Clone, Debug)]
pub struct SolverConfig {
    pub worklist_order: WorklistOrder,
    /// Keep Λ alive across every flow function, whether the problem returns it or not.
    pub auto_add_zero: bool,
    /// Run the value phase after the fixpoint. Without it every reached fact
    /// reports the top value.
    pub compute_values: bool,
    /// Record the exploded supergraph edges the flow functions produced.
    pub record_esg: bool,
    /// Record which facts were merged into each other and the caller facts
    /// callee entry facts were bound from.
    pub track_neighbors: bool,
    /// Probe every join of edge functions and values for monotonicity and fail
    /// the run on a violation.
    pub check_monotonicity: bool,
    pub max_iterations: Option<u64>,
    pub timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            worklist_order: WorklistOrder::Fifo,
            auto_add_zero: true,
            compute_values: true,
            record_esg: false,
            track_neighbors: false,
            check_monotonicity: cfg!(debug_assertions),
            max_iterations: None,
            timeout: None,
        }
    }
}

impl SolverConfig {
    pub fn with_worklist_order(mut self, order: WorklistOrder) -> Self {
        self.worklist_order = order;
        self
    }

    pub fn with_compute_values(mut self, compute_values: bool) -> Self {
        self.compute_values = compute_values;
        self
    }

    pub fn with_auto_add_zero(mut self, auto_add_zero: bool) -> Self {
        self.auto_add_zero = auto_add_zero;
        self
    }

    pub fn with_esg_recording(mut self, record_esg: bool) -> Self {
        self.record_esg = record_esg;
        self
    }

    pub fn with_neighbor_tracking(mut self, track_neighbors: bool) -> Self {
        self.track_neighbors = track_neighbors;
        self
    }

    pub fn with_monotonicity_check(mut self, check_monotonicity: bool) -> Self {
        self.check_monotonicity = check_monotonicity;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Cooperative cancellation, checked once per worklist iteration.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StopReason {
    Cancelled,
    Timeout,
    IterationLimit,
}

/// Whether the fixpoint was reached. Results of an incomplete run are a
/// partial under-approximation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SolverStatus {
    Complete,
    Incomplete(StopReason),
}

impl SolverStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, SolverStatus::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let config = SolverConfig::default()
            .with_worklist_order(WorklistOrder::Lifo)
            .with_compute_values(false)
            .with_max_iterations(10)
            .with_timeout(Duration::from_millis(5));
        assert_eq!(config.worklist_order, WorklistOrder::Lifo);
        assert!(!config.compute_values);
        assert!(config.auto_add_zero);
        assert_eq!(config.max_iterations, Some(10));
        assert_eq!(config.timeout, Some(Duration::from_millis(5)));
    }
}
