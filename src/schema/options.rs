//! Instrumentation options and failure reporting
//!
//! Failures never abort anything. Each one is:
//! 1. Emitted as a debug-level tracing event
//! 2. Counted in the attached metrics, if any
//! 3. Passed to the attached observer, if any

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::observability::{CoercionMetrics, Event};

use super::errors::InvalidAssignment;
use super::types::FieldType;
use super::value::Value;

/// Receives every value that failed castability.
///
/// Implementations must not panic; the engine treats the callback as a
/// diagnostics side channel.
pub trait AssignmentObserver: Send + Sync {
    fn on_invalid_assignment(&self, failure: &InvalidAssignment);
}

struct FnObserver<F>(F);

impl<F> AssignmentObserver for FnObserver<F>
where
    F: Fn(&Value, &FieldType) + Send + Sync,
{
    fn on_invalid_assignment(&self, failure: &InvalidAssignment) {
        (self.0)(&failure.value, &failure.expected)
    }
}

/// Observer that keeps every failure it sees.
#[derive(Debug, Default)]
pub struct RejectionLog {
    failures: Mutex<Vec<InvalidAssignment>>,
}

impl RejectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the failures seen so far
    pub fn failures(&self) -> Vec<InvalidAssignment> {
        self.failures
            .lock()
            .map(|failures| failures.clone())
            .unwrap_or_default()
    }

    /// Removes and returns the failures seen so far
    pub fn drain(&self) -> Vec<InvalidAssignment> {
        self.failures
            .lock()
            .map(|mut failures| std::mem::take(&mut *failures))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.failures.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssignmentObserver for RejectionLog {
    fn on_invalid_assignment(&self, failure: &InvalidAssignment) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(failure.clone());
        }
    }
}

/// Settings shared by a record and everything nested inside it.
#[derive(Clone, Default)]
pub struct Options {
    observer: Option<Arc<dyn AssignmentObserver>>,
    metrics: Option<Arc<CoercionMetrics>>,
    static_by_default: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback invoked with the offending value and the declared type.
    pub fn on_invalid_assignment<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Value, &FieldType) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(FnObserver(callback)));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AssignmentObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<CoercionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fields not marked `dynamic` get a one-time coerced plain value.
    pub fn static_by_default(mut self, enabled: bool) -> Self {
        self.static_by_default = enabled;
        self
    }

    pub fn is_static_by_default(&self) -> bool {
        self.static_by_default
    }

    pub fn metrics(&self) -> Option<&Arc<CoercionMetrics>> {
        self.metrics.as_ref()
    }

    pub(crate) fn report(&self, failure: &InvalidAssignment) {
        let event = Event::for_failure(failure.kind);
        tracing::debug!(
            event = event.as_str(),
            field = %failure.field,
            expected = %failure.expected,
            value = %failure.value,
            "value rejected"
        );
        if let Some(metrics) = &self.metrics {
            metrics.increment_failure(failure.kind);
        }
        if let Some(observer) = &self.observer {
            observer.on_invalid_assignment(failure);
        }
    }

    pub(crate) fn record_accepted(&self, field: &str) {
        tracing::trace!(event = Event::FieldAssigned.as_str(), field = %field);
        if let Some(metrics) = &self.metrics {
            metrics.increment_accepted();
        }
    }

    pub(crate) fn record_instrumented(&self, path: &str, fields: usize) {
        tracing::trace!(
            event = Event::RecordInstrumented.as_str(),
            path = %path,
            fields = fields
        );
        if let Some(metrics) = &self.metrics {
            metrics.increment_records();
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("observer", &self.observer.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("static_by_default", &self.static_by_default)
            .finish()
    }
}
