//! Trace fan-out to registered sinks.

use super::types::TraceRecord;
use std::sync::Arc;
use tracing::info;

/// An observer of trace records.
///
/// Sinks must be cheap and infallible: delivery happens on the request
/// path after the response is computed, and recording can never affect
/// the response.
pub trait TraceSink: Send + Sync {
    fn record(&self, record: &TraceRecord);
}

/// Fans each emitted record out to every registered sink, best-effort.
#[derive(Clone, Default)]
pub struct TraceRecorder {
    sinks: Vec<Arc<dyn TraceSink>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Deliver one record to all sinks.
    pub fn emit(&self, record: TraceRecord) {
        for sink in &self.sinks {
            sink.record(&record);
        }
    }
}

/// Sink that logs one structured event per record.
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&self, record: &TraceRecord) {
        info!(
            target: "junction::trace",
            id = %record.id,
            method = %record.request.method,
            url = %record.request.url,
            status = record.response.status,
            incoming_route = record.incoming_route_id.as_deref(),
            outgoing_route = record.outgoing_route_id.as_deref(),
            error = record.error.as_deref(),
            "request traced"
        );
    }
}
