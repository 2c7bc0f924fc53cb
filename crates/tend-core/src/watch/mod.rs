//! The watch/automation engine.
//!
//! Split in two layers so the temporal logic stays testable:
//!
//! ```text
//! session   pure state machine: (now, sample) → classification
//! runner    drives the machine against real collaborators (git, AI,
//!           settings), executes decisions, emits WatchEvents
//! ```
//!
//! Front-ends (CLI watch loop, web server) call [`WatchRunner::tick`] on
//! their own cadence and render the returned events; neither reimplements
//! any of the stability or policy logic.

pub mod runner;
pub mod session;

use serde::Serialize;

use crate::logbook::LogKind;

pub use runner::{ensure_watchable, one_shot_commit_message, PendingDecision, WatchRunner};
pub use session::{
    decide, CommitDecision, Decision, DecisionAction, Sample, Tick, WatchSession, WatchState,
    STABILITY_WINDOW,
};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watching,
    ChangeDetected,
    Unstable,
}

/// Everything the engine tells its front-ends. Serialized form matches the
/// dashboard's SSE protocol (`{"type": "watch_status", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchEvent {
    #[serde(rename = "watch_status")]
    Status {
        status: WatchStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        elapsed: Option<u64>,
        message: String,
    },
    #[serde(rename = "commit_request")]
    CommitRequest { size: u64, warnings: Vec<String> },
    #[serde(rename = "push_request")]
    PushRequest {
        unpushed_count: u64,
        summary: String,
        commits: Vec<String>,
    },
    #[serde(rename = "log")]
    Log { kind: LogKind, message: String },
}

impl WatchEvent {
    pub fn log(kind: LogKind, message: impl Into<String>) -> Self {
        WatchEvent::Log {
            kind,
            message: message.into(),
        }
    }

    fn watching(elapsed_secs: u64) -> Self {
        WatchEvent::Status {
            status: WatchStatus::Watching,
            size: None,
            elapsed: Some(elapsed_secs),
            message: format!("Watching... ({elapsed_secs}s)"),
        }
    }

    fn change_detected(size: u64) -> Self {
        WatchEvent::Status {
            status: WatchStatus::ChangeDetected,
            size: Some(size),
            elapsed: None,
            message: format!("Change detected: {size} lines - waiting for stability..."),
        }
    }

    fn unstable(size: u64, elapsed_secs: u64) -> Self {
        WatchEvent::Status {
            status: WatchStatus::Unstable,
            size: Some(size),
            elapsed: Some(elapsed_secs),
            message: format!("Stabilizing... {elapsed_secs}s ({size} lines)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_event_serializes_with_type_tag() {
        let json = serde_json::to_value(WatchEvent::watching(7)).unwrap();
        assert_eq!(json["type"], "watch_status");
        assert_eq!(json["status"], "watching");
        assert_eq!(json["elapsed"], 7);
        // size is omitted, not null
        assert!(json.get("size").is_none());
    }

    #[test]
    fn commit_request_serializes_fields() {
        let e = WatchEvent::CommitRequest {
            size: 42,
            warnings: vec!["Sensitive file detected: .env".into()],
        };
        let json = serde_json::to_value(e).unwrap();
        assert_eq!(json["type"], "commit_request");
        assert_eq!(json["size"], 42);
        assert_eq!(json["warnings"][0], "Sensitive file detected: .env");
    }

    #[test]
    fn log_event_carries_kind() {
        let json = serde_json::to_value(WatchEvent::log(LogKind::Git, "Committed")).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["kind"], "git");
    }
}
