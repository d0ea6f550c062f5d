//! Worker thread span helpers.
//!
//! Provides span creation and hand-off recording for the client, server,
//! producer and consumer threads driven by the harness.

use tracing::Span;
use uuid::Uuid;

/// Start a span for one harness thread.
///
/// The `worker.handled` field is declared empty and can be filled via
/// [`record_handoff`].
pub fn start_worker_span(run_id: &Uuid, role: &str, index: usize) -> Span {
    tracing::info_span!(
        "worker.run",
        "worker.run_id" = %run_id,
        "worker.role" = role,
        "worker.index" = index,
        "worker.handled" = tracing::field::Empty,
    )
}

/// Record how many handles the thread moved, and emit an event for it.
pub fn record_handoff(span: &Span, handled: usize) {
    span.record("worker.handled", handled);
    span.in_scope(|| {
        tracing::debug!(handled, "worker finished");
    });
}
