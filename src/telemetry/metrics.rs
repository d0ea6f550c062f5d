//! Metric instrument factories for workbuf.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"workbuf"` meter. Without
//! a registered provider the global no-op meter absorbs every recording.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for workbuf instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("workbuf")
}

/// Counter: hand-off operations (enqueue, dequeue, send, receive, setup, shutdown).
/// Labels: `component`, `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("workbuf.queue.operations")
        .with_description("Number of queue and buffer operations")
        .build()
}

/// Counter: times a thread suspended on a condition variable.
/// Labels: `component`, `condition` ("not_empty" | "not_full").
pub fn waits() -> Counter<u64> {
    meter()
        .u64_counter("workbuf.waits")
        .with_description("Number of condition variable waits")
        .build()
}

/// Histogram: harness run duration in milliseconds.
/// Labels: `scenario`.
pub fn harness_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("workbuf.harness.duration_ms")
        .with_description("Harness run duration in milliseconds")
        .with_unit("ms")
        .build()
}

pub(crate) fn record_operation(component: &'static str, operation: &'static str) {
    queue_operations().add(
        1,
        &[
            KeyValue::new("component", component),
            KeyValue::new("operation", operation),
        ],
    );
}

pub(crate) fn record_wait(component: &'static str, condition: &'static str) {
    waits().add(
        1,
        &[
            KeyValue::new("component", component),
            KeyValue::new("condition", condition),
        ],
    );
}
