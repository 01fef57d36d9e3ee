//! Test utilities for the device transport
//!
//! [`RecordingTransport`] stands in for the HTTP transport: it records every
//! write and answers from a script, so tests can assert on exactly what the
//! panel sent and how it reacted to each outcome.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::transport::{Transport, WriteFailure, WriteResult};

/// One write observed by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub path: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Default)]
struct Recorder {
    writes: Vec<RecordedWrite>,
    outcomes: VecDeque<WriteResult>,
}

/// In-memory transport that records writes and replays scripted outcomes.
///
/// Writes succeed unless an outcome was queued with [`push_outcome`] or
/// [`fail_next`]. A gated transport holds every write until [`release`] is
/// called, which lets tests observe in-flight states.
///
/// [`push_outcome`]: RecordingTransport::push_outcome
/// [`fail_next`]: RecordingTransport::fail_next
/// [`release`]: RecordingTransport::release
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    recorder: Arc<Mutex<Recorder>>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose writes block until released
    pub fn gated() -> Self {
        Self {
            recorder: Arc::default(),
            gate: Some(Arc::new(Semaphore::new(0))),
        }
    }

    /// Let `count` held writes complete
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Queue the outcome of the next unscripted write
    pub fn push_outcome(&self, outcome: WriteResult) {
        self.recorder.lock().unwrap().outcomes.push_back(outcome);
    }

    /// Make the next write fail with `status` and `body`
    pub fn fail_next(&self, status: u16, body: &str) {
        self.push_outcome(Err(WriteFailure::from_status(status, "error", body)));
    }

    /// Every write received so far, in order
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.recorder.lock().unwrap().writes.clone()
    }

    /// Writes received for one resource path
    pub fn writes_to(&self, path: &str) -> Vec<serde_json::Value> {
        self.writes()
            .into_iter()
            .filter(|write| write.path == path)
            .map(|write| write.payload)
            .collect()
    }
}

impl Transport for RecordingTransport {
    async fn put(&self, path: &str, payload: serde_json::Value) -> WriteResult {
        let outcome = {
            let mut recorder = self.recorder.lock().unwrap();
            recorder.writes.push(RecordedWrite {
                path: path.to_string(),
                payload,
            });
            recorder.outcomes.pop_front().unwrap_or(Ok(()))
        };

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        outcome
    }
}
