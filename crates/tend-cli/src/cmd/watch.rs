//! Terminal front-end for the watch engine.
//!
//! The engine decides; this file only renders events, prompts for
//! confirmations on stdin, and paces the tick loop. `--once` runs until the
//! first terminal outcome (or a clean tree) instead of forever.

use std::io::Write as _;
use std::path::Path;
use std::time::{Duration, Instant};

use tend_core::config::Settings;
use tend_core::git::Git;
use tend_core::logbook::LogKind;
use tend_core::watch::{ensure_watchable, WatchEvent, WatchRunner};

pub fn run(root: &Path, once: bool, interval_secs: u64) -> anyhow::Result<()> {
    // The only fatal precondition; every later failure is a log line.
    ensure_watchable(root)?;

    let settings = Settings::load(root)?;
    print_header(&settings, once, interval_secs);

    let mut runner = WatchRunner::new(root.to_path_buf(), Git::new(root), Instant::now());
    let interval = Duration::from_secs(interval_secs.max(1));

    loop {
        let events = runner.tick(Instant::now());
        let outcome = render(&events, &mut runner, once);

        if once && outcome.is_terminal() {
            break;
        }

        std::thread::sleep(interval);
    }

    Ok(())
}

fn print_header(settings: &Settings, once: bool, interval_secs: u64) {
    println!("tend watch");
    println!("  Mode:                 {}", settings.auto_mode);
    println!("  Threshold:            {} lines", settings.commit_threshold);
    println!(
        "  AI commits:           {}",
        if settings.ai_commit_messages { "enabled" } else { "disabled" }
    );
    println!("  AI provider:          {}", settings.ai_provider);
    println!("  Commits before summary: {}", settings.commits_before_summary);
    println!(
        "  Auto summary and push:  {}",
        if settings.auto_summary_and_push { "enabled" } else { "disabled" }
    );
    println!();
    if once {
        println!("Running a single check...");
    } else {
        println!("Watching for changes (checking every {interval_secs}s, Ctrl-C to stop)...");
    }
    println!();
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    /// Burst still in flight (or nothing happened yet).
    Continue,
    /// Clean tree observed.
    Idle,
    /// A decision resolved (committed, declined, below threshold, errored).
    Resolved,
}

impl TickOutcome {
    fn is_terminal(self) -> bool {
        matches!(self, TickOutcome::Idle | TickOutcome::Resolved)
    }
}

fn render(
    events: &[WatchEvent],
    runner: &mut WatchRunner<Git>,
    once: bool,
) -> TickOutcome {
    let mut outcome = TickOutcome::Continue;

    for event in events {
        match event {
            WatchEvent::Status { message, status, .. } => {
                status_line(message);
                if *status == tend_core::watch::WatchStatus::Watching {
                    outcome = TickOutcome::Idle;
                }
            }
            WatchEvent::Log { kind, message } => {
                log_line(*kind, message);
                if is_resolution(message) {
                    outcome = TickOutcome::Resolved;
                }
            }
            WatchEvent::CommitRequest { size, warnings } => {
                outcome = handle_commit_request(runner, *size, warnings, once);
            }
            WatchEvent::PushRequest {
                unpushed_count,
                summary,
                commits,
            } => {
                outcome = handle_push_request(runner, *unpushed_count, summary, commits, once);
            }
        }
    }

    outcome
}

/// Log messages that mark the end of a burst.
fn is_resolution(message: &str) -> bool {
    message.starts_with("Committed:")
        || message.starts_with("Below threshold")
        || message.starts_with("Commit failed")
        || message.starts_with("No changes to commit")
        || message.contains("mode: manual")
}

fn handle_commit_request(
    runner: &mut WatchRunner<Git>,
    size: u64,
    warnings: &[String],
    once: bool,
) -> TickOutcome {
    clear_status_line();
    println!("Commit ready: {size} lines stable and above threshold");
    for warning in warnings {
        println!("  ! {warning}");
    }

    // One-shot runs can't sit on a prompt; leave the changes uncommitted.
    let approved = if once {
        println!("  --once: skipping confirmation, leaving changes uncommitted");
        false
    } else {
        confirm("Commit these changes?", true)
    };

    let events = if approved {
        runner.approve_commit(Instant::now())
    } else {
        runner.decline_commit(Instant::now())
    };
    render(&events, runner, once);
    TickOutcome::Resolved
}

fn handle_push_request(
    runner: &mut WatchRunner<Git>,
    unpushed_count: u64,
    summary: &str,
    commits: &[String],
    once: bool,
) -> TickOutcome {
    clear_status_line();
    println!("{unpushed_count} unpushed commits:");
    for commit in commits {
        println!("  {commit}");
    }
    println!("Summary: {summary}");

    // Spec'd one-shot behavior: no response means the commits stay local.
    let approved = if once {
        println!("  --once: leaving commits unpushed");
        false
    } else {
        confirm(&format!("Push {unpushed_count} commits to remote?"), true)
    };

    let events = if approved {
        runner.approve_push(Instant::now())
    } else {
        runner.decline_push(Instant::now())
    };
    render(&events, runner, once);
    TickOutcome::Resolved
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

/// Overwrite the current line so the ticking status doesn't scroll the log.
fn status_line(message: &str) {
    print!("\r\x1b[K  {message}");
    let _ = std::io::stdout().flush();
}

fn clear_status_line() {
    print!("\r\x1b[K");
    let _ = std::io::stdout().flush();
}

fn log_line(kind: LogKind, message: &str) {
    clear_status_line();
    println!("  [{}] {}", kind.as_str(), message);
}

fn confirm(prompt: &str, default_yes: bool) -> bool {
    let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
    print!("{prompt} {hint} ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    match line.trim().to_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    }
}
