//! Structured trace output. The engine only calls [`EventSink::emit`]; what happens
//! to the record is up to the sink.

use super::types::SimTime;
use log::info;
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    pub time: SimTime,
    pub entity: String,
    pub message: String,
}

/// Receiver of state-transition records
pub trait EventSink: Send {
    fn emit(&mut self, time: SimTime, entity: &str, message: &str);
}

/// Discards every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _time: SimTime, _entity: &str, _message: &str) {}
}

/// Forwards records to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, time: SimTime, entity: &str, message: &str) {
        info!(target: "supplysim", "{:.4}: ({}): {}", time, entity, message);
    }
}

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, time: SimTime, entity: &str, message: &str) {
        let record = TraceRecord {
            time,
            entity: entity.to_string(),
            message: message.to_string(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}
