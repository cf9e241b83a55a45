//! Coercion metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe; one registry may be shared by every record built from a schema

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::schema::FailureKind;

/// Operational counters for the coercion engine.
///
/// Uses Relaxed ordering; counters are independent of each other.
#[derive(Debug, Default)]
pub struct CoercionMetrics {
    /// Records instrumented
    records_instrumented: AtomicU64,
    /// Setter calls that stored a value
    assignments_accepted: AtomicU64,
    /// Setter calls that were rejected
    assignments_rejected: AtomicU64,
    /// Existing values rejected at construction
    existing_values_rejected: AtomicU64,
    /// Declared defaults rejected at construction
    defaults_rejected: AtomicU64,
    /// Array elements removed
    elements_dropped: AtomicU64,
}

impl CoercionMetrics {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_records(&self) {
        self.records_instrumented.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_accepted(&self) {
        self.assignments_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a rejected value under its failure kind
    pub fn increment_failure(&self, kind: FailureKind) {
        let counter = match kind {
            FailureKind::Assignment => &self.assignments_rejected,
            FailureKind::ExistingValue => &self.existing_values_rejected,
            FailureKind::Default => &self.defaults_rejected,
            FailureKind::ArrayElement => &self.elements_dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Total rejected values of every kind
    pub fn total_failures(&self) -> u64 {
        let s = self.snapshot();
        s.assignments_rejected + s.existing_values_rejected + s.defaults_rejected + s.elements_dropped
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_instrumented: self.records_instrumented.load(Ordering::Relaxed),
            assignments_accepted: self.assignments_accepted.load(Ordering::Relaxed),
            assignments_rejected: self.assignments_rejected.load(Ordering::Relaxed),
            existing_values_rejected: self.existing_values_rejected.load(Ordering::Relaxed),
            defaults_rejected: self.defaults_rejected.load(Ordering::Relaxed),
            elements_dropped: self.elements_dropped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_instrumented: u64,
    pub assignments_accepted: u64,
    pub assignments_rejected: u64,
    pub existing_values_rejected: u64,
    pub defaults_rejected: u64,
    pub elements_dropped: u64,
}

impl MetricsSnapshot {
    /// Renders the snapshot as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
