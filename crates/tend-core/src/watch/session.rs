//! Stability state machine and commit policy.
//!
//! This layer is pure: it sees `(now, sample)` pairs and classifies them.
//! No git, no AI, no I/O: the runner owns all of that. Keeping the machine
//! free of side effects is what makes the timing scenarios testable without
//! sleeping.

use std::time::{Duration, Instant};

use crate::config::AutoMode;

/// Quiet period a change set must hold its size before it is considered
/// settled. A single size-preserving sample is not enough evidence that an
/// edit is finished: editors pause mid-save.
pub const STABILITY_WINDOW: Duration = Duration::from_millis(3000);

// ---------------------------------------------------------------------------
// Sample / state
// ---------------------------------------------------------------------------

/// One reading of the working tree, taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub has_changes: bool,
    /// Total changed lines. Meaningless when `has_changes` is false.
    pub size: u64,
}

impl Sample {
    pub fn clean() -> Self {
        Self {
            has_changes: false,
            size: 0,
        }
    }

    pub fn changed(size: u64) -> Self {
        Self {
            has_changes: true,
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Working tree clean (or burst resolved); waiting for the first change.
    Idle,
    /// A new size was just observed; the quiet period restarts from here.
    Detecting,
    /// Size unchanged since last sample, quiet period still running.
    Stabilizing,
    /// A settled burst is being acted on; sampling must not re-trigger.
    Processing,
}

/// Classification of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to do; `watching_for` is time since the session (re)started.
    Idle { watching_for: Duration },
    /// First observation of a change, or the size moved: quiet period reset.
    Detected { size: u64 },
    /// Size holding steady, still inside the quiet period.
    Stabilizing { size: u64, elapsed: Duration },
    /// Size held steady for the full window; hand off to the threshold gate.
    Settled { size: u64 },
    /// A prior decision is still in flight; the sample was ignored.
    Suspended,
}

// ---------------------------------------------------------------------------
// WatchSession
// ---------------------------------------------------------------------------

/// Burst-tracking state for one watch loop.
///
/// Invariant: `last_change_at` is `Some` exactly when the state is
/// `Detecting` or `Stabilizing`. All transitions happen inside
/// [`WatchSession::observe`]; there is no concurrent mutation.
#[derive(Debug)]
pub struct WatchSession {
    state: WatchState,
    window: Duration,
    started_at: Instant,
    last_change_at: Option<Instant>,
    last_change_size: u64,
}

impl WatchSession {
    pub fn new(now: Instant) -> Self {
        Self::with_window(now, STABILITY_WINDOW)
    }

    pub fn with_window(now: Instant, window: Duration) -> Self {
        Self {
            state: WatchState::Idle,
            window,
            started_at: now,
            last_change_at: None,
            last_change_size: 0,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_processing(&self) -> bool {
        self.state == WatchState::Processing
    }

    /// Feed one sample. At most one `Settled` is produced per burst: the
    /// session moves to `Processing` with it and stays there until
    /// [`WatchSession::resolve`].
    pub fn observe(&mut self, now: Instant, sample: Sample) -> Tick {
        if self.state == WatchState::Processing {
            return Tick::Suspended;
        }

        if !sample.has_changes {
            self.reset_burst();
            return Tick::Idle {
                watching_for: now.duration_since(self.started_at),
            };
        }

        match self.last_change_at {
            // First change of a burst, or the size moved: either way the
            // author is still editing, so the countdown starts over.
            None => self.restart_burst(now, sample.size),
            Some(_) if sample.size != self.last_change_size => {
                self.restart_burst(now, sample.size)
            }
            Some(since) => {
                let elapsed = now.duration_since(since);
                if elapsed < self.window {
                    self.state = WatchState::Stabilizing;
                    Tick::Stabilizing {
                        size: sample.size,
                        elapsed,
                    }
                } else {
                    self.state = WatchState::Processing;
                    self.last_change_at = None;
                    self.last_change_size = 0;
                    Tick::Settled { size: sample.size }
                }
            }
        }
    }

    /// Terminal resolution of a burst: committed, declined, below
    /// threshold, or errored. One reset policy for every path: back to Idle
    /// with the watching timer restarted.
    pub fn resolve(&mut self, now: Instant) {
        self.reset_burst();
        self.started_at = now;
    }

    fn restart_burst(&mut self, now: Instant, size: u64) -> Tick {
        self.state = WatchState::Detecting;
        self.last_change_at = Some(now);
        self.last_change_size = size;
        Tick::Detected { size }
    }

    fn reset_burst(&mut self) {
        self.state = WatchState::Idle;
        self.last_change_at = None;
        self.last_change_size = 0;
    }

    #[cfg(test)]
    fn burst_invariant_holds(&self) -> bool {
        let tracking = matches!(self.state, WatchState::Detecting | WatchState::Stabilizing);
        tracking == self.last_change_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// ThresholdGate + AutomationPolicy
// ---------------------------------------------------------------------------

/// What a settled burst asks the runner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    /// Manual mode: announce readiness, take no action.
    None,
    /// Confirm mode: hold until an explicit approve/decline arrives.
    AwaitConfirmation,
    /// Auto mode: commit without human input.
    AutoCommit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitDecision {
    pub size: u64,
    pub action: DecisionAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Too small to act on. The burst resets; a later, larger edit must
    /// re-earn stability from scratch.
    BelowThreshold { size: u64, threshold: u32 },
    Ready(CommitDecision),
}

/// Gate a settled size against the threshold, then dispatch on mode.
/// The boundary is inclusive: `size == threshold` qualifies.
pub fn decide(size: u64, mode: AutoMode, threshold: u32) -> Decision {
    if size < u64::from(threshold) {
        return Decision::BelowThreshold { size, threshold };
    }
    let action = match mode {
        AutoMode::Manual => DecisionAction::None,
        AutoMode::Confirm => DecisionAction::AwaitConfirmation,
        AutoMode::Auto => DecisionAction::AutoCommit,
    };
    Decision::Ready(CommitDecision { size, action })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(3);
    const TICK: Duration = Duration::from_secs(1);

    fn session(now: Instant) -> WatchSession {
        WatchSession::with_window(now, WINDOW)
    }

    /// Scenario A: no changes across ticks → stays Idle, only watching ticks.
    #[test]
    fn clean_ticks_stay_idle() {
        let t0 = Instant::now();
        let mut s = session(t0);
        for i in 1..=3 {
            let tick = s.observe(t0 + TICK * i, Sample::clean());
            assert!(matches!(tick, Tick::Idle { .. }));
            assert_eq!(s.state(), WatchState::Idle);
            assert!(s.burst_invariant_holds());
        }
    }

    #[test]
    fn first_change_enters_detecting() {
        let t0 = Instant::now();
        let mut s = session(t0);
        let tick = s.observe(t0 + TICK, Sample::changed(10));
        assert_eq!(tick, Tick::Detected { size: 10 });
        assert_eq!(s.state(), WatchState::Detecting);
        assert!(s.burst_invariant_holds());
    }

    #[test]
    fn steady_size_stabilizes_then_settles() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.observe(t0, Sample::changed(10));

        let tick = s.observe(t0 + TICK, Sample::changed(10));
        assert_eq!(
            tick,
            Tick::Stabilizing {
                size: 10,
                elapsed: TICK
            }
        );
        assert_eq!(s.state(), WatchState::Stabilizing);

        s.observe(t0 + TICK * 2, Sample::changed(10));
        let tick = s.observe(t0 + WINDOW, Sample::changed(10));
        assert_eq!(tick, Tick::Settled { size: 10 });
        assert_eq!(s.state(), WatchState::Processing);
        assert!(s.burst_invariant_holds());
    }

    /// Scenario D: a size change mid-window restarts the countdown: the
    /// elapsed comparison runs from the *latest* change, not the first.
    #[test]
    fn size_change_mid_window_restarts_timer() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.observe(t0, Sample::changed(10));
        let tick = s.observe(t0 + TICK, Sample::changed(15));
        assert_eq!(tick, Tick::Detected { size: 15 });
        assert_eq!(s.state(), WatchState::Detecting);

        // Window measured from the restart at t0+1s: not settled at t0+3s...
        let tick = s.observe(t0 + WINDOW, Sample::changed(15));
        assert!(matches!(tick, Tick::Stabilizing { .. }));
        // ...settled at t0+1s+window.
        let tick = s.observe(t0 + TICK + WINDOW, Sample::changed(15));
        assert_eq!(tick, Tick::Settled { size: 15 });
    }

    #[test]
    fn clean_sample_resets_any_burst() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.observe(t0, Sample::changed(10));
        s.observe(t0 + TICK, Sample::changed(10));
        assert_eq!(s.state(), WatchState::Stabilizing);

        let tick = s.observe(t0 + TICK * 2, Sample::clean());
        assert!(matches!(tick, Tick::Idle { .. }));
        assert_eq!(s.state(), WatchState::Idle);
        assert!(s.burst_invariant_holds());

        // A new change must restart detection from scratch.
        let tick = s.observe(t0 + TICK * 3, Sample::changed(10));
        assert_eq!(tick, Tick::Detected { size: 10 });
    }

    /// Exactly one Settled per burst: once Processing, samples are ignored
    /// until the burst is resolved.
    #[test]
    fn processing_suspends_sampling() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.observe(t0, Sample::changed(10));
        s.observe(t0 + WINDOW, Sample::changed(10));
        assert!(s.is_processing());

        for i in 4..8 {
            assert_eq!(s.observe(t0 + TICK * i, Sample::changed(10)), Tick::Suspended);
        }

        s.resolve(t0 + TICK * 8);
        assert_eq!(s.state(), WatchState::Idle);
        assert!(s.burst_invariant_holds());
    }

    #[test]
    fn resolve_restarts_watching_timer() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.observe(t0, Sample::changed(10));
        s.observe(t0 + WINDOW, Sample::changed(10));
        s.resolve(t0 + WINDOW + TICK);

        let tick = s.observe(t0 + WINDOW + TICK * 3, Sample::clean());
        assert_eq!(
            tick,
            Tick::Idle {
                watching_for: TICK * 2
            }
        );
    }

    /// Suspension does not advance the stability clock: time spent in
    /// Processing never counts toward a later burst's window.
    #[test]
    fn window_not_advanced_by_suspension() {
        let t0 = Instant::now();
        let mut s = session(t0);
        s.observe(t0, Sample::changed(10));
        s.observe(t0 + WINDOW, Sample::changed(10));
        s.resolve(t0 + TICK * 60);

        // New burst long after resolution: full window still required.
        let tick = s.observe(t0 + TICK * 61, Sample::changed(30));
        assert_eq!(tick, Tick::Detected { size: 30 });
        let tick = s.observe(t0 + TICK * 62, Sample::changed(30));
        assert!(matches!(tick, Tick::Stabilizing { .. }));
    }

    // --- gate + policy -----------------------------------------------------

    #[test]
    fn threshold_boundary_is_inclusive() {
        assert!(matches!(
            decide(20, AutoMode::Auto, 20),
            Decision::Ready(CommitDecision {
                size: 20,
                action: DecisionAction::AutoCommit
            })
        ));
        assert!(matches!(
            decide(19, AutoMode::Auto, 20),
            Decision::BelowThreshold {
                size: 19,
                threshold: 20
            }
        ));
    }

    #[test]
    fn mode_maps_to_action() {
        assert!(matches!(
            decide(50, AutoMode::Manual, 20),
            Decision::Ready(CommitDecision {
                action: DecisionAction::None,
                ..
            })
        ));
        assert!(matches!(
            decide(50, AutoMode::Confirm, 20),
            Decision::Ready(CommitDecision {
                action: DecisionAction::AwaitConfirmation,
                ..
            })
        ));
        assert!(matches!(
            decide(50, AutoMode::Auto, 20),
            Decision::Ready(CommitDecision {
                action: DecisionAction::AutoCommit,
                ..
            })
        ));
    }
}
