//! Immutable audit logging.
//!
//! Records every seal, open, verify, rename and delete attempt with its
//! outcome. The log is append-only. Records can be forwarded to pluggable
//! sinks (files, queues, databases).

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FailureKind;
use crate::store::DocumentId;

/// A sink that receives audit events. Implement this to forward events
/// to durable storage.
///
/// Sinks are shared between threads and called without any vault lock
/// held, so an implementation guards its own state.
pub trait AuditSink: Send + Sync {
    /// Append an event. Called once per vault operation attempt.
    fn append(&self, event: AuditEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Seal,
    Open,
    Verify,
    Rename,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure(FailureKind),
}

impl AuditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A permanent record of one operation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// The authenticated user that invoked the operation.
    pub actor: String,
    pub action: AuditAction,
    /// The document acted on. `None` for a seal that never produced a record.
    pub target: Option<DocumentId>,
    pub outcome: AuditOutcome,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        actor: &str,
        action: AuditAction,
        target: Option<DocumentId>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            actor: actor.to_string(),
            action,
            target,
            outcome,
            timestamp: Utc::now(),
        }
    }
}

/// Number of events a vault keeps in memory unless told otherwise.
pub const DEFAULT_RETENTION: usize = 1024;

/// An append-only log of recent operation attempts.
///
/// The in-memory copy is bounded: once `retention` events are held, the
/// oldest is dropped for each new one. Durable storage is the job of the
/// forward sinks attached via `add_forward_sink`.
pub struct AuditLog {
    events: VecDeque<AuditEvent>,
    retention: usize,
    forward_sinks: Vec<Arc<dyn AuditSink>>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::bounded(DEFAULT_RETENTION)
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("events", &self.events)
            .field("retention", &self.retention)
            .field("forward_sinks", &self.forward_sinks.len())
            .finish()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log keeping at most `retention` events in memory. Zero keeps none;
    /// events then only reach the forward sinks.
    pub fn bounded(retention: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(retention.min(DEFAULT_RETENTION)),
            retention,
            forward_sinks: Vec::new(),
        }
    }

    /// Change the in-memory bound, dropping the oldest events if needed.
    pub fn set_retention(&mut self, retention: usize) {
        while self.events.len() > retention {
            self.events.pop_front();
        }
        self.retention = retention;
    }

    /// Add a sink to receive a copy of every event.
    pub fn add_forward_sink(&mut self, sink: Arc<dyn AuditSink>) {
        self.forward_sinks.push(sink);
    }

    /// Keep `event` in memory and return the sinks it still has to reach.
    ///
    /// Lets a caller holding the log behind a lock release it before any
    /// sink I/O happens.
    pub fn record(&mut self, event: &AuditEvent) -> Vec<Arc<dyn AuditSink>> {
        if self.retention > 0 {
            if self.events.len() == self.retention {
                self.events.pop_front();
            }
            self.events.push_back(event.clone());
        }
        self.forward_sinks.clone()
    }

    /// Append a new event to the log and forward it to any attached sinks.
    pub fn append(&mut self, event: AuditEvent) {
        for sink in self.record(&event) {
            sink.append(event.clone());
        }
    }

    /// Number of events currently held in memory.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, AuditEvent> {
        self.events.iter()
    }

    /// Copy of the retained events, oldest first.
    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Built-in sink: file
// ---------------------------------------------------------------------------

/// Writes audit events as JSON lines (one per event) to a file.
/// Creates the file if it doesn't exist; appends if it does.
pub struct FileAuditSink {
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, event: AuditEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode audit event");
                return;
            }
        };
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(file, "{line}").and_then(|_| file.flush()) {
            tracing::error!(error = %e, "failed to write audit event");
        }
    }
}
