//! Logging infrastructure: bus message journaling.
//!
//! Provides two [`MessageSink`](tribunal_application::MessageSink)
//! implementations:
//!
//! - [`JsonlMessageLogger`]: appends every message of a run to a JSONL file
//! - [`TracingSink`]: re-emits messages as `tracing` events

mod jsonl_logger;
mod tracing_sink;

pub use jsonl_logger::JsonlMessageLogger;
pub use tracing_sink::TracingSink;
