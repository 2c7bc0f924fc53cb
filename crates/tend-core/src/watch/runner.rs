//! Drives the stability machine against real collaborators.
//!
//! The runner owns the side effects the session deliberately avoids:
//! sampling git, reloading settings each tick, composing commit messages
//! (AI with deterministic fallback), executing commits, and escalating to a
//! push request once enough unpushed commits accumulate.
//!
//! Concurrency model: one runner per watch loop, ticked serially. While a
//! confirmation or push request is outstanding (`pending`), ticks are
//! no-ops: the single guard that prevents a second decision for the same
//! burst while a human or an AI call is in flight.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ai_provider::{prompts, AiProviderError, CliGenerator, TextGenerator};
use chrono::Local;

use crate::config::Settings;
use crate::git::{sensitive_file_warnings, VersionControl};
use crate::logbook::LogKind;

use super::session::{
    decide, Decision, DecisionAction, Sample, Tick, WatchSession, STABILITY_WINDOW,
};
use super::WatchEvent;

// ---------------------------------------------------------------------------
// Pending decisions
// ---------------------------------------------------------------------------

/// A decision parked on an explicit operator response.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingDecision {
    /// Confirm mode: a stable, above-threshold change set awaits approval.
    Commit { size: u64 },
    /// Escalation: accumulated commits await a push approval.
    Push {
        unpushed_count: u64,
        summary: String,
        commits: Vec<String>,
    },
}

impl PendingDecision {
    pub fn kind(&self) -> &'static str {
        match self {
            PendingDecision::Commit { .. } => "commit",
            PendingDecision::Push { .. } => "push",
        }
    }
}

// ---------------------------------------------------------------------------
// WatchRunner
// ---------------------------------------------------------------------------

type GeneratorFactory = Box<dyn Fn(&Settings) -> Box<dyn TextGenerator + Send> + Send>;

pub struct WatchRunner<V: VersionControl> {
    root: PathBuf,
    vc: V,
    session: WatchSession,
    settings: Settings,
    settings_override: Option<Settings>,
    make_generator: GeneratorFactory,
    pending: Option<PendingDecision>,
}

impl<V: VersionControl> WatchRunner<V> {
    pub fn new(root: impl Into<PathBuf>, vc: V, now: Instant) -> Self {
        let root = root.into();
        let settings = Settings::load(&root).unwrap_or_default();
        Self {
            root,
            vc,
            session: WatchSession::with_window(now, STABILITY_WINDOW),
            settings,
            settings_override: None,
            make_generator: Box::new(|s: &Settings| {
                Box::new(CliGenerator::new(s.ai_provider, s.ai_model.clone()))
            }),
            pending: None,
        }
    }

    /// Replace the AI generator constructor (tests inject scripted ones).
    pub fn with_generator_factory(
        mut self,
        factory: impl Fn(&Settings) -> Box<dyn TextGenerator + Send> + Send + 'static,
    ) -> Self {
        self.make_generator = Box::new(factory);
        self
    }

    /// Shrink the stability window (tests only need it shorter, never longer).
    pub fn with_session_window(mut self, now: Instant, window: std::time::Duration) -> Self {
        self.session = WatchSession::with_window(now, window);
        self
    }

    /// Pin settings instead of reloading from disk each tick.
    pub fn set_settings_override(&mut self, settings: Settings) {
        self.settings_override = Some(settings);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pending(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    pub fn vc(&self) -> &V {
        &self.vc
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one tick. Returns the events to render/broadcast; never fails,
    /// since per-tick errors become log events and the loop continues.
    pub fn tick(&mut self, now: Instant) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        self.reload_settings();

        // A pending decision suspends the whole pipeline: no sampling
        // consequences, no second decision, no window advancement.
        if self.pending.is_some() {
            return events;
        }

        let sample = self.sample();
        match self.session.observe(now, sample) {
            Tick::Idle { watching_for } => {
                events.push(WatchEvent::watching(watching_for.as_secs()));
            }
            Tick::Detected { size } => {
                events.push(WatchEvent::log(
                    LogKind::Info,
                    format!("Change detected: {size} lines"),
                ));
                events.push(WatchEvent::change_detected(size));
            }
            Tick::Stabilizing { size, elapsed } => {
                events.push(WatchEvent::unstable(size, elapsed.as_secs()));
            }
            Tick::Settled { size } => self.on_settled(now, size, &mut events),
            Tick::Suspended => {}
        }

        events
    }

    fn reload_settings(&mut self) {
        if let Some(fixed) = &self.settings_override {
            self.settings = fixed.clone();
            return;
        }
        match Settings::load(&self.root) {
            Ok(settings) => self.settings = settings,
            Err(e) => tracing::warn!("config reload failed, keeping previous values: {e}"),
        }
    }

    fn sample(&self) -> Sample {
        // Fail-open is implemented by the VersionControl contract itself:
        // has_changes() and change_size() swallow git errors.
        if self.vc.has_changes() {
            Sample::changed(self.vc.change_size())
        } else {
            Sample::clean()
        }
    }

    // -----------------------------------------------------------------------
    // Settled burst → gate → policy
    // -----------------------------------------------------------------------

    fn on_settled(&mut self, now: Instant, size: u64, events: &mut Vec<WatchEvent>) {
        match decide(size, self.settings.auto_mode, self.settings.commit_threshold) {
            Decision::BelowThreshold { size, threshold } => {
                events.push(WatchEvent::log(
                    LogKind::Info,
                    format!("Below threshold: {size}/{threshold} lines"),
                ));
                self.session.resolve(now);
            }
            Decision::Ready(decision) => match decision.action {
                DecisionAction::None => {
                    events.push(WatchEvent::log(
                        LogKind::Info,
                        format!("{size} lines ready (mode: manual, no action)"),
                    ));
                    self.session.resolve(now);
                }
                DecisionAction::AwaitConfirmation => {
                    let warnings = sensitive_file_warnings(&self.vc.changed_files());
                    events.push(WatchEvent::log(
                        LogKind::Info,
                        format!("Awaiting confirmation for {size} lines"),
                    ));
                    events.push(WatchEvent::CommitRequest { size, warnings });
                    self.pending = Some(PendingDecision::Commit { size });
                }
                DecisionAction::AutoCommit => self.execute_commit(now, size, events),
            },
        }
    }

    // -----------------------------------------------------------------------
    // CommitComposer
    // -----------------------------------------------------------------------

    fn execute_commit(&mut self, now: Instant, size: u64, events: &mut Vec<WatchEvent>) {
        events.push(WatchEvent::log(
            LogKind::Git,
            format!("Processing {size} lines..."),
        ));

        let message = self.compose_message(events);

        match self.vc.commit(&message) {
            Ok(outcome) if outcome.committed => {
                events.push(WatchEvent::log(
                    LogKind::Success,
                    format!("Committed: {}", outcome.message),
                ));
                self.after_commit(now, events);
            }
            Ok(_) => {
                // Stage-all produced an empty index; nothing to record.
                events.push(WatchEvent::log(LogKind::Info, "No changes to commit"));
                self.session.resolve(now);
            }
            Err(e) => {
                events.push(WatchEvent::log(
                    LogKind::Error,
                    format!("Commit failed: {e}"),
                ));
                self.session.resolve(now);
            }
        }
    }

    fn compose_message(&self, events: &mut Vec<WatchEvent>) -> String {
        let timestamp = Local::now().format("%H:%M:%S");
        let fallback = format!("{timestamp} chore(auto): update");

        if !self.settings.ai_commit_messages || !self.settings.ai_provider.is_enabled() {
            return fallback;
        }

        events.push(WatchEvent::log(LogKind::Ai, "Generating commit message..."));
        let generator = (self.make_generator)(&self.settings);
        match ai_commit_message(&self.settings, &self.vc, generator.as_ref()) {
            Ok(message) => format!("{timestamp} {message}"),
            Err(e) => {
                events.push(WatchEvent::log(
                    LogKind::Warning,
                    format!("AI generation failed, using fallback: {e}"),
                ));
                fallback
            }
        }
    }

    // -----------------------------------------------------------------------
    // SummaryEscalation
    // -----------------------------------------------------------------------

    fn after_commit(&mut self, now: Instant, events: &mut Vec<WatchEvent>) {
        let unpushed = self.vc.unpushed_count();

        let threshold = u64::from(self.settings.commits_before_summary);
        if !self.settings.auto_summary_and_push || unpushed < threshold {
            self.session.resolve(now);
            return;
        }

        events.push(WatchEvent::log(
            LogKind::Info,
            format!("{unpushed} unpushed commits - creating summary..."),
        ));

        let commits = self.vc.unpushed_commits();
        let summary = self.summarize(unpushed, events);

        events.push(WatchEvent::PushRequest {
            unpushed_count: unpushed,
            summary: summary.clone(),
            commits: commits.clone(),
        });
        self.pending = Some(PendingDecision::Push {
            unpushed_count: unpushed,
            summary,
            commits,
        });
    }

    fn summarize(&self, unpushed: u64, events: &mut Vec<WatchEvent>) -> String {
        let fallback = format!("{unpushed} commits ready to push");

        if !self.settings.ai_provider.is_enabled() {
            return fallback;
        }

        let log = match self.vc.recent_commits(unpushed) {
            Ok(log) if !log.trim().is_empty() => log,
            _ => return fallback,
        };

        let generator = (self.make_generator)(&self.settings);
        match generator.generate(&prompts::commit_summary(&log)) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback,
            Err(e) => {
                events.push(WatchEvent::log(
                    LogKind::Warning,
                    format!("AI summary failed, using commit list: {e}"),
                ));
                fallback
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pending resolution (called by front-ends)
    // -----------------------------------------------------------------------

    pub fn approve_commit(&mut self, now: Instant) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        match self.pending.take() {
            Some(PendingDecision::Commit { size }) => {
                self.execute_commit(now, size, &mut events);
            }
            other => {
                self.pending = other;
                events.push(WatchEvent::log(
                    LogKind::Warning,
                    "No commit awaiting confirmation",
                ));
            }
        }
        events
    }

    pub fn decline_commit(&mut self, now: Instant) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        match self.pending.take() {
            Some(PendingDecision::Commit { .. }) => {
                events.push(WatchEvent::log(LogKind::Info, "Commit declined"));
                self.session.resolve(now);
            }
            other => self.pending = other,
        }
        events
    }

    pub fn approve_push(&mut self, now: Instant) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        match self.pending.take() {
            Some(PendingDecision::Push { unpushed_count, .. }) => {
                match self.vc.current_branch() {
                    Ok(branch) => {
                        let outcome = self.vc.push(&branch);
                        if outcome.success {
                            events.push(WatchEvent::log(
                                LogKind::Success,
                                format!("Pushed {unpushed_count} commits to {branch}"),
                            ));
                        } else {
                            events.push(WatchEvent::log(
                                LogKind::Error,
                                format!(
                                    "Push failed: {}",
                                    outcome.error.unwrap_or_else(|| "unknown error".into())
                                ),
                            ));
                        }
                    }
                    Err(e) => {
                        events.push(WatchEvent::log(
                            LogKind::Error,
                            format!("Push failed: {e}"),
                        ));
                    }
                }
                self.session.resolve(now);
            }
            other => {
                self.pending = other;
                events.push(WatchEvent::log(LogKind::Warning, "No push awaiting approval"));
            }
        }
        events
    }

    pub fn decline_push(&mut self, now: Instant) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        match self.pending.take() {
            Some(PendingDecision::Push { .. }) => {
                events.push(WatchEvent::log(
                    LogKind::Info,
                    "Push skipped - commits remain local",
                ));
                self.session.resolve(now);
            }
            other => self.pending = other,
        }
        events
    }
}

// ---------------------------------------------------------------------------
// Shared composition helpers
// ---------------------------------------------------------------------------

/// AI commit message for the staged diff. Errors bubble so callers choose
/// their own fallback; an empty cleaned response counts as a failure.
fn ai_commit_message(
    settings: &Settings,
    vc: &impl VersionControl,
    generator: &(dyn TextGenerator + Send),
) -> Result<String, AiProviderError> {
    let diff = vc.diff_text().unwrap_or_default();
    let prompt = prompts::commit_message(
        &diff,
        settings.ai_commit_prompt.as_deref(),
        settings.ai_commit_max_chars,
    );
    let response = generator.generate(&prompt)?;
    let cleaned = prompts::clean_single_line(&response);
    if cleaned.is_empty() {
        return Err(AiProviderError::GenerationFailed {
            provider: settings.ai_provider.to_string(),
            detail: "empty response".to_string(),
        });
    }
    Ok(cleaned)
}

/// One-shot commit message for `tend commit` and the web "commit now"
/// button: AI when configured, dated fallback otherwise. Never fails.
pub fn one_shot_commit_message(settings: &Settings, vc: &impl VersionControl) -> String {
    if settings.ai_commit_messages && settings.ai_provider.is_enabled() {
        let generator = CliGenerator::new(settings.ai_provider, settings.ai_model.clone());
        if let Ok(message) = ai_commit_message(settings, vc, &generator) {
            return message;
        }
    }
    format!("chore: update {}", Local::now().format("%Y-%m-%d"))
}

/// Require an un-suppressed path to `root` being a repository before a watch
/// loop starts. This is the only fatal precondition; everything after loop
/// start is recoverable.
pub fn ensure_watchable(root: &Path) -> crate::error::Result<()> {
    crate::git::Git::new(root).ensure_repo()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoMode;
    use crate::git::{CommitOutcome, PushOutcome};
    use ai_provider::Provider;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    const WINDOW: Duration = Duration::from_secs(3);
    const TICK: Duration = Duration::from_secs(1);

    // --- scripted collaborators -------------------------------------------

    #[derive(Default)]
    struct ScriptedVc {
        current: Cell<Option<u64>>,
        commits: RefCell<Vec<String>>,
        commit_fails: Cell<bool>,
        nothing_staged: Cell<bool>,
        unpushed: Cell<u64>,
        pushes: RefCell<Vec<String>>,
        push_fails: Cell<bool>,
    }

    impl ScriptedVc {
        fn set_tree(&self, size: Option<u64>) {
            self.current.set(size);
        }
    }

    impl VersionControl for ScriptedVc {
        fn has_changes(&self) -> bool {
            self.current.get().is_some()
        }
        fn change_size(&self) -> u64 {
            self.current.get().unwrap_or(0)
        }
        fn diff_text(&self) -> crate::error::Result<String> {
            Ok("+line added\n-line removed".to_string())
        }
        fn commit(&self, message: &str) -> crate::error::Result<CommitOutcome> {
            if self.commit_fails.get() {
                return Err(crate::error::TendError::Git {
                    command: "commit".into(),
                    detail: "index.lock exists".into(),
                });
            }
            if self.nothing_staged.get() {
                return Ok(CommitOutcome {
                    committed: false,
                    message: "No changes to commit".into(),
                });
            }
            self.commits.borrow_mut().push(message.to_string());
            self.unpushed.set(self.unpushed.get() + 1);
            self.set_tree(None); // commit cleans the tree
            Ok(CommitOutcome {
                committed: true,
                message: message.to_string(),
            })
        }
        fn push(&self, branch: &str) -> PushOutcome {
            if self.push_fails.get() {
                return PushOutcome {
                    success: false,
                    error: Some("non-fast-forward".into()),
                };
            }
            self.pushes.borrow_mut().push(branch.to_string());
            self.unpushed.set(0);
            PushOutcome {
                success: true,
                error: None,
            }
        }
        fn current_branch(&self) -> crate::error::Result<String> {
            Ok("main".to_string())
        }
        fn unpushed_count(&self) -> u64 {
            self.unpushed.get()
        }
        fn unpushed_commits(&self) -> Vec<String> {
            (0..self.unpushed.get())
                .map(|i| format!("abc{i} chore(auto): update"))
                .collect()
        }
        fn recent_commits(&self, n: u64) -> crate::error::Result<String> {
            Ok((0..n)
                .map(|i| format!("abc{i} chore(auto): update"))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        fn changed_files(&self) -> Vec<String> {
            vec!["src/main.rs".to_string(), ".env".to_string()]
        }
    }

    struct FixedGen(Result<String, ()>);
    impl TextGenerator for FixedGen {
        fn generate(&self, _prompt: &str) -> ai_provider::Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(()) => Err(AiProviderError::GenerationFailed {
                    provider: "test".into(),
                    detail: "scripted failure".into(),
                }),
            }
        }
    }

    fn runner(
        settings: Settings,
        now: Instant,
        ai: Result<String, ()>,
    ) -> WatchRunner<ScriptedVc> {
        let mut r = WatchRunner::new("/tmp/unused", ScriptedVc::default(), now)
            .with_session_window(now, WINDOW)
            .with_generator_factory(move |_s| Box::new(FixedGen(ai.clone())));
        r.set_settings_override(settings);
        r
    }

    fn auto_settings(threshold: u32) -> Settings {
        Settings {
            auto_mode: AutoMode::Auto,
            commit_threshold: threshold,
            ai_commit_messages: false,
            ..Settings::default()
        }
    }

    /// Drive one full stable burst of `size` lines: detect, then hold the
    /// size until the window elapses. Returns the settle-tick events.
    fn run_burst(r: &mut WatchRunner<ScriptedVc>, t0: Instant, size: u64) -> Vec<WatchEvent> {
        r.vc().set_tree(Some(size));
        r.tick(t0); // Detected
        r.tick(t0 + TICK); // Stabilizing
        r.tick(t0 + TICK * 2); // Stabilizing
        r.tick(t0 + WINDOW) // Settled
    }

    fn has_log_containing(events: &[WatchEvent], needle: &str) -> bool {
        events.iter().any(|e| {
            matches!(e, WatchEvent::Log { message, .. } if message.contains(needle))
        })
    }

    // --- scenarios ---------------------------------------------------------

    /// Scenario B: stable above-threshold burst in auto mode commits once.
    #[test]
    fn stable_burst_above_threshold_commits() {
        let t0 = Instant::now();
        let mut r = runner(auto_settings(5), t0, Err(()));

        let events = run_burst(&mut r, t0, 10);
        assert!(has_log_containing(&events, "Committed:"));
        assert_eq!(r.vc().commits.borrow().len(), 1);
        assert!(r.vc().commits.borrow()[0].contains("chore(auto): update"));
        assert!(r.pending().is_none());

        // Tree is clean after the commit; the next tick just watches.
        let events = r.tick(t0 + WINDOW + TICK);
        assert!(matches!(events[0], WatchEvent::Status { .. }));
    }

    /// Scenario C: stable but below threshold resets without committing.
    #[test]
    fn stable_burst_below_threshold_resets() {
        let t0 = Instant::now();
        let mut r = runner(auto_settings(20), t0, Err(()));

        let events = run_burst(&mut r, t0, 10);
        assert!(has_log_containing(&events, "Below threshold: 10/20"));
        assert!(r.vc().commits.borrow().is_empty());

        // The burst reset: the same tree state reads as a fresh detection.
        let events = r.tick(t0 + WINDOW + TICK);
        assert!(has_log_containing(&events, "Change detected"));
    }

    #[test]
    fn threshold_equality_commits() {
        let t0 = Instant::now();
        let mut r = runner(auto_settings(10), t0, Err(()));
        run_burst(&mut r, t0, 10);
        assert_eq!(r.vc().commits.borrow().len(), 1);
    }

    #[test]
    fn manual_mode_notifies_without_committing() {
        let t0 = Instant::now();
        let mut r = runner(
            Settings {
                auto_mode: AutoMode::Manual,
                commit_threshold: 5,
                ..Settings::default()
            },
            t0,
            Err(()),
        );
        let events = run_burst(&mut r, t0, 10);
        assert!(has_log_containing(&events, "mode: manual"));
        assert!(r.vc().commits.borrow().is_empty());
        assert!(r.pending().is_none());
    }

    /// Scenario E: confirm mode parks the decision until an explicit
    /// approval; intermediate ticks change nothing.
    #[test]
    fn confirm_mode_waits_for_approval() {
        let t0 = Instant::now();
        let mut r = runner(
            Settings {
                auto_mode: AutoMode::Confirm,
                commit_threshold: 5,
                ai_commit_messages: false,
                ..Settings::default()
            },
            t0,
            Err(()),
        );

        let events = run_burst(&mut r, t0, 10);
        let request = events
            .iter()
            .find(|e| matches!(e, WatchEvent::CommitRequest { .. }))
            .expect("commit_request emitted");
        if let WatchEvent::CommitRequest { size, warnings } = request {
            assert_eq!(*size, 10);
            assert!(warnings.iter().any(|w| w.contains(".env")));
        }
        assert!(matches!(
            r.pending(),
            Some(PendingDecision::Commit { size: 10 })
        ));

        // Many ticks later: still no commit, no duplicate request.
        for i in 4..10 {
            assert!(r.tick(t0 + TICK * i).is_empty());
        }
        assert!(r.vc().commits.borrow().is_empty());

        let events = r.approve_commit(t0 + TICK * 10);
        assert!(has_log_containing(&events, "Committed:"));
        assert_eq!(r.vc().commits.borrow().len(), 1);
        assert!(r.pending().is_none());
    }

    #[test]
    fn confirm_decline_resets_cleanly() {
        let t0 = Instant::now();
        let mut r = runner(
            Settings {
                auto_mode: AutoMode::Confirm,
                commit_threshold: 5,
                ..Settings::default()
            },
            t0,
            Err(()),
        );
        run_burst(&mut r, t0, 10);
        r.decline_commit(t0 + WINDOW + TICK);
        assert!(r.vc().commits.borrow().is_empty());
        assert!(r.pending().is_none());

        // The unchanged tree is rediscovered as a brand-new burst.
        let events = r.tick(t0 + WINDOW + TICK * 2);
        assert!(has_log_containing(&events, "Change detected"));
    }

    /// Scenario F: the third auto-commit (commits_before_summary = 3)
    /// escalates to exactly one push request with unpushed_count = 3.
    #[test]
    fn escalation_fires_once_at_summary_threshold() {
        let t0 = Instant::now();
        let settings = Settings {
            auto_mode: AutoMode::Auto,
            commit_threshold: 5,
            ai_commit_messages: false,
            commits_before_summary: 3,
            auto_summary_and_push: true,
            ai_provider: Provider::None,
            ..Settings::default()
        };
        let mut r = runner(settings, t0, Err(()));

        let mut t = t0;
        for round in 1..=2 {
            let events = run_burst(&mut r, t, 10);
            assert!(
                !events
                    .iter()
                    .any(|e| matches!(e, WatchEvent::PushRequest { .. })),
                "no escalation after commit {round}"
            );
            t += WINDOW + TICK;
        }

        let events = run_burst(&mut r, t, 10);
        let push = events
            .iter()
            .find(|e| matches!(e, WatchEvent::PushRequest { .. }))
            .expect("push_request after third commit");
        if let WatchEvent::PushRequest {
            unpushed_count,
            summary,
            commits,
        } = push
        {
            assert_eq!(*unpushed_count, 3);
            assert_eq!(summary, "3 commits ready to push");
            assert_eq!(commits.len(), 3);
        }
        assert!(matches!(r.pending(), Some(PendingDecision::Push { .. })));

        // Pending push suspends further decisions entirely.
        r.vc().set_tree(Some(50));
        assert!(r.tick(t + WINDOW + TICK).is_empty());

        let events = r.approve_push(t + WINDOW + TICK * 2);
        assert!(has_log_containing(&events, "Pushed 3 commits"));
        assert_eq!(r.vc().pushes.borrow().as_slice(), ["main"]);
        assert_eq!(r.vc().unpushed_count(), 0);
    }

    #[test]
    fn escalation_disabled_never_fires() {
        let t0 = Instant::now();
        let settings = Settings {
            auto_summary_and_push: false,
            commits_before_summary: 2,
            ..auto_settings(5)
        };
        let mut r = runner(settings, t0, Err(()));

        let mut t = t0;
        for _ in 0..3 {
            let events = run_burst(&mut r, t, 10);
            assert!(!events
                .iter()
                .any(|e| matches!(e, WatchEvent::PushRequest { .. })));
            t += WINDOW + TICK;
        }
        assert_eq!(r.vc().commits.borrow().len(), 3);
    }

    #[test]
    fn push_decline_leaves_commits_local() {
        let t0 = Instant::now();
        let settings = Settings {
            commits_before_summary: 2,
            ai_provider: Provider::None,
            ..auto_settings(5)
        };
        let mut r = runner(settings, t0, Err(()));

        run_burst(&mut r, t0, 10);
        let events = run_burst(&mut r, t0 + WINDOW + TICK, 10);
        assert!(events
            .iter()
            .any(|e| matches!(e, WatchEvent::PushRequest { .. })));

        let events = r.decline_push(t0 + WINDOW * 2);
        assert!(has_log_containing(&events, "Push skipped"));
        assert!(r.vc().pushes.borrow().is_empty());
        assert_eq!(r.vc().unpushed_count(), 2);
        assert!(r.pending().is_none());
    }

    #[test]
    fn push_failure_is_reported_not_fatal() {
        let t0 = Instant::now();
        let settings = Settings {
            commits_before_summary: 2,
            ai_provider: Provider::None,
            ..auto_settings(5)
        };
        let mut r = runner(settings, t0, Err(()));
        run_burst(&mut r, t0, 10);
        run_burst(&mut r, t0 + WINDOW + TICK, 10);

        r.vc().push_fails.set(true);
        let events = r.approve_push(t0 + WINDOW * 2);
        assert!(has_log_containing(&events, "Push failed: non-fast-forward"));
        assert!(r.pending().is_none());

        // Loop keeps sampling afterwards.
        r.vc().set_tree(Some(30));
        let events = r.tick(t0 + WINDOW * 3);
        assert!(has_log_containing(&events, "Change detected"));
    }

    // --- commit composition ------------------------------------------------

    #[test]
    fn ai_message_used_with_timestamp_prefix() {
        let t0 = Instant::now();
        let settings = Settings {
            ai_commit_messages: true,
            ai_provider: Provider::Gemini,
            ..auto_settings(5)
        };
        let mut r = runner(settings, t0, Ok("feat: add widget".to_string()));
        run_burst(&mut r, t0, 10);

        let commits = r.vc().commits.borrow();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].ends_with("feat: add widget"));
        // "HH:MM:SS feat: ...": timestamp token then the message
        assert_eq!(commits[0].split(' ').next().unwrap().len(), 8);
    }

    #[test]
    fn ai_failure_falls_back_and_still_commits() {
        let t0 = Instant::now();
        let settings = Settings {
            ai_commit_messages: true,
            ai_provider: Provider::Gemini,
            ..auto_settings(5)
        };
        let mut r = runner(settings, t0, Err(()));
        let events = run_burst(&mut r, t0, 10);

        assert!(has_log_containing(&events, "using fallback"));
        let commits = r.vc().commits.borrow();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].contains("chore(auto): update"));
    }

    #[test]
    fn empty_index_after_stage_all_is_not_a_commit() {
        let t0 = Instant::now();
        let mut r = runner(auto_settings(5), t0, Err(()));
        r.vc().nothing_staged.set(true);

        let events = run_burst(&mut r, t0, 10);
        assert!(has_log_containing(&events, "No changes to commit"));
        assert!(r.vc().commits.borrow().is_empty());
        assert!(r.pending().is_none());

        // No escalation and a clean reset: next change is a new burst.
        r.vc().nothing_staged.set(false);
        r.vc().set_tree(Some(12));
        let events = r.tick(t0 + WINDOW + TICK);
        assert!(has_log_containing(&events, "Change detected"));
    }

    #[test]
    fn commit_error_is_logged_and_loop_continues() {
        let t0 = Instant::now();
        let mut r = runner(auto_settings(5), t0, Err(()));
        r.vc().commit_fails.set(true);

        let events = run_burst(&mut r, t0, 10);
        assert!(has_log_containing(&events, "Commit failed"));
        assert!(r.pending().is_none());

        r.vc().commit_fails.set(false);
        let events = run_burst(&mut r, t0 + WINDOW + TICK, 10);
        assert!(has_log_containing(&events, "Committed:"));
    }

    #[test]
    fn settings_override_is_observed_per_tick() {
        let t0 = Instant::now();
        let mut r = runner(auto_settings(5), t0, Err(()));
        r.vc().set_tree(None);
        r.tick(t0);
        assert_eq!(r.settings().commit_threshold, 5);

        r.set_settings_override(auto_settings(99));
        r.tick(t0 + TICK);
        assert_eq!(r.settings().commit_threshold, 99);
    }

    #[test]
    fn approve_without_pending_warns() {
        let t0 = Instant::now();
        let mut r = runner(auto_settings(5), t0, Err(()));
        let events = r.approve_commit(t0);
        assert!(has_log_containing(&events, "No commit awaiting confirmation"));
        let events = r.approve_push(t0);
        assert!(has_log_containing(&events, "No push awaiting approval"));
    }
}
