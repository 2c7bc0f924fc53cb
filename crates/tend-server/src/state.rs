use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use tend_core::git::Git;
use tend_core::logbook::{ActivityLog, LogKind};
use tend_core::watch::{WatchEvent, WatchRunner};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    /// Pre-serialized SSE payloads; subscribers only frame them.
    pub events_tx: broadcast::Sender<String>,
    pub activity: Arc<Mutex<ActivityLog>>,
    pub watch: Arc<WatchControl>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            root,
            events_tx: tx,
            activity: Arc::new(Mutex::new(ActivityLog::new())),
            watch: Arc::new(WatchControl::default()),
        }
    }

    /// Record a log entry and broadcast it to SSE subscribers.
    pub fn log(&self, kind: LogKind, message: impl Into<String>) {
        let entry = self
            .activity
            .lock()
            .expect("activity log poisoned")
            .record(kind, message);
        if let Ok(json) = serde_json::to_string(&serde_json::json!({
            "type": "log",
            "log": entry,
        })) {
            let _ = self.events_tx.send(json);
        }
    }

    /// Route engine events: log entries go through the activity feed, the
    /// rest broadcast as-is.
    pub fn dispatch(&self, events: Vec<WatchEvent>) {
        for event in events {
            match event {
                WatchEvent::Log { kind, message } => self.log(kind, message),
                other => {
                    if let Ok(json) = serde_json::to_string(&other) {
                        let _ = self.events_tx.send(json);
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Watch loop control
    // -----------------------------------------------------------------------

    /// Start the loop on a dedicated thread (ticking is blocking subprocess
    /// work, so it stays off the async runtime). No-op when already running.
    pub fn start_watch(&self) -> bool {
        if self.watch.running.swap(true, Ordering::SeqCst) {
            return false;
        }

        // Fresh session per start: watch state never survives a stop.
        *self.watch.runner.lock().expect("watch runner poisoned") = Some(WatchRunner::new(
            self.root.clone(),
            Git::new(self.root.clone()),
            Instant::now(),
        ));

        self.log(LogKind::Success, "Watch mode started");

        let control = Arc::clone(&self.watch);
        let state = self.clone();
        std::thread::spawn(move || {
            while control.running.load(Ordering::SeqCst) {
                let events = {
                    let mut guard = control.runner.lock().expect("watch runner poisoned");
                    match guard.as_mut() {
                        Some(runner) => runner.tick(Instant::now()),
                        None => break,
                    }
                };
                state.dispatch(events);
                std::thread::sleep(Duration::from_secs(1));
            }
            *control.runner.lock().expect("watch runner poisoned") = None;
        });

        true
    }

    pub fn stop_watch(&self) -> bool {
        if !self.watch.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.log(LogKind::Info, "Watch mode stopped");
        true
    }

    /// Resolve a pending commit/push decision, dispatching resulting events.
    pub fn resolve_watch(&self, decision: &str, approve: bool) -> Result<(), &'static str> {
        let events = {
            let mut guard = self.watch.runner.lock().expect("watch runner poisoned");
            let Some(runner) = guard.as_mut() else {
                return Err("watch mode is not running");
            };
            let now = Instant::now();
            match (decision, approve) {
                ("commit", true) => runner.approve_commit(now),
                ("commit", false) => runner.decline_commit(now),
                ("push", true) => runner.approve_push(now),
                ("push", false) => runner.decline_push(now),
                _ => return Err("unknown decision kind"),
            }
        };
        self.dispatch(events);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WatchControl
// ---------------------------------------------------------------------------

/// Run flag and runner slot for the background watch loop. The runner lives
/// behind a mutex so confirm endpoints can resolve pending decisions between
/// ticks.
#[derive(Default)]
pub struct WatchControl {
    running: AtomicBool,
    runner: Mutex<Option<WatchRunner<Git>>>,
}

impl WatchControl {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn pending_kind(&self) -> Option<&'static str> {
        self.runner
            .lock()
            .expect("watch runner poisoned")
            .as_ref()
            .and_then(|r| r.pending().map(|p| p.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_stores_root() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        assert_eq!(state.root, PathBuf::from("/tmp/test"));
        assert!(!state.watch.is_running());
    }

    #[test]
    fn log_records_and_broadcasts() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        let mut rx = state.events_tx.subscribe();
        state.log(LogKind::Git, "Committed");
        assert_eq!(state.activity.lock().unwrap().len(), 1);
        let payload = rx.try_recv().unwrap();
        assert!(payload.contains("\"type\":\"log\""));
        assert!(payload.contains("Committed"));
    }

    #[test]
    fn dispatch_broadcasts_non_log_events_verbatim() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        let mut rx = state.events_tx.subscribe();
        state.dispatch(vec![WatchEvent::CommitRequest {
            size: 30,
            warnings: vec![],
        }]);
        let payload = rx.try_recv().unwrap();
        assert!(payload.contains("\"type\":\"commit_request\""));
        // not routed through the activity feed
        assert!(state.activity.lock().unwrap().is_empty());
    }

    #[test]
    fn resolve_without_runner_errors() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        let err = state.resolve_watch("commit", true).unwrap_err();
        assert!(err.contains("not running"));
    }
}
