//! Per-request trace records and their delivery to observers.

mod recorder;
mod store;
mod types;

pub use recorder::{LogSink, TraceRecorder, TraceSink};
pub use store::MemorySink;
pub use types::{TraceRecord, TracedRequest, TracedResponse};
