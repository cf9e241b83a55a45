//! Observability subsystem for schemacast
//!
//! This module provides:
//! - Typed event names for every coercion outcome
//! - Coercion counters
//! - Log subscriber setup for binaries
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on coercion
//! 3. The library emits `tracing` events and never installs a subscriber
//!
//! # Usage
//!
//! ```ignore
//! use schemacast::observability::{CoercionMetrics, Event};
//! use schemacast::schema::Options;
//!
//! let metrics = Arc::new(CoercionMetrics::new());
//! let options = Options::new().with_metrics(metrics.clone());
//! // ... instrument records ...
//! println!("{}", metrics.snapshot().to_json());
//! ```

mod events;
mod metrics;
pub mod logger;

pub use events::Event;
pub use logger::{LogFormat, LOG_LEVELS};
pub use metrics::{CoercionMetrics, MetricsSnapshot};
