//! Metrics instrumentation for zone-reconcile.
//!
//! All metrics are prefixed with `zone_reconcile.`

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Outcome of a public operation.
#[derive(Debug, Clone, Copy)]
pub enum OperationResult {
    /// Operation returned its affected records.
    Success,
    /// Cancellation token fired.
    Cancelled,
    /// Any other failure.
    Error,
}

/// Record a finished append, set or delete.
pub fn record_operation(op: &'static str, result: OperationResult, duration: Duration) {
    let result_str = match result {
        OperationResult::Success => "success",
        OperationResult::Cancelled => "cancelled",
        OperationResult::Error => "error",
    };

    counter!("zone_reconcile.operation.count", "op" => op, "result" => result_str).increment(1);
    histogram!("zone_reconcile.operation.duration.seconds", "op" => op)
        .record(duration.as_secs_f64());
}

/// Record one fetch-plan-submit attempt.
pub fn record_attempt(op: &'static str) {
    counter!("zone_reconcile.attempt.count", "op" => op).increment(1);
}

/// Record a submit rejected because the zone changed underneath.
pub fn record_conflict(op: &'static str) {
    counter!("zone_reconcile.conflict.count", "op" => op).increment(1);
}

/// Record an attempt that found nothing to submit.
pub fn record_short_circuit(op: &'static str) {
    counter!("zone_reconcile.short_circuit.count", "op" => op).increment(1);
}

/// Record how many records an operation reported as affected.
pub fn record_affected(op: &'static str, count: usize) {
    histogram!("zone_reconcile.records.affected", "op" => op).record(count as f64);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
