//! Bounded in-memory trace store backing the admin `/traces` endpoint.

use super::recorder::TraceSink;
use super::types::TraceRecord;
use parking_lot::RwLock;
use std::collections::VecDeque;

/// Ring buffer of the most recent trace records.
pub struct MemorySink {
    records: RwLock<VecDeque<TraceRecord>>,
    capacity: usize,
}

impl MemorySink {
    /// `capacity` of zero keeps nothing (every push is immediately trimmed).
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Most recent records first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<TraceRecord> {
        let records = self.records.read();
        records.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl TraceSink for MemorySink {
    fn record(&self, record: &TraceRecord) {
        let mut records = self.records.write();
        records.push_back(record.clone());
        while records.len() > self.capacity {
            records.pop_front();
        }
    }
}
