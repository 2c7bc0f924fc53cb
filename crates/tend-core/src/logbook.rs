//! Operator-facing activity feed.
//!
//! Distinct from `tracing` diagnostics: these entries are the product,
//! rendered in the watch status line, streamed to the web dashboard, and
//! queryable over the API. Bounded ring buffer, newest first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
    Git,
    Ai,
    Github,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Success => "success",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
            LogKind::Git => "git",
            LogKind::Ai => "ai",
            LogKind::Github => "github",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    pub message: String,
}

#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq: 1,
            capacity,
        }
    }

    /// Append an entry, evicting the oldest past capacity. Returns a clone
    /// of the stored entry for immediate broadcast.
    pub fn record(&mut self, kind: LogKind, message: impl Into<String>) -> LogEntry {
        let entry = LogEntry {
            seq: self.next_seq,
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        };
        self.next_seq += 1;
        self.entries.push_front(entry.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
        entry
    }

    /// Newest-first slice of at most `limit` entries.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.record(LogKind::Info, "Activity log cleared");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
