//! # workbuf
//!
//! Two blocking hand-off primitives built on one mutex and condition
//! variables each:
//!
//! - [`WorkQueue`]: an unbounded FIFO of request handles shared by any
//!   number of clients and worker threads.
//! - [`BoundedBuffer`]: a fixed-capacity circular buffer between producers
//!   and consumers.
//!
//! The [`harness`] module drives both under concurrent load, and
//! [`telemetry`] wires up tracing and OpenTelemetry.

pub mod bounded_buffer;
pub mod config;
pub mod error;
pub mod harness;
pub mod telemetry;
pub mod work_queue;

pub use bounded_buffer::BoundedBuffer;
pub use work_queue::WorkQueue;
