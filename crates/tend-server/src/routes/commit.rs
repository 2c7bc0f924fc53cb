use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiResult, AppError};
use crate::state::AppState;
use tend_core::config::Settings;
use tend_core::git::{CommitOutcome, Git, VersionControl};
use tend_core::logbook::LogKind;
use tend_core::watch::one_shot_commit_message;

/// POST /api/commit: immediate stage-all commit with an AI (or dated
/// fallback) message, independent of the watch loop.
pub async fn commit_now(State(app): State<AppState>) -> ApiResult<Json<CommitOutcome>> {
    let git = Git::new(app.root.clone());
    git.ensure_repo()?;
    let settings = Settings::load(&app.root)?;

    app.log(LogKind::Git, "Creating commit...");
    if settings.ai_commit_messages && settings.ai_provider.is_enabled() {
        app.log(LogKind::Ai, "Generating commit message with AI...");
    }

    let message = one_shot_commit_message(&settings, &git);
    let outcome = git.commit(&message)?;

    if outcome.committed {
        app.log(LogKind::Success, format!("Committed: {message}"));
    } else {
        app.log(LogKind::Info, "No changes to commit");
    }

    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct ConfirmBody {
    pub approve: bool,
}

/// POST /api/commit/confirm: resolve a pending confirm-mode decision.
pub async fn confirm_commit(
    State(app): State<AppState>,
    Json(body): Json<ConfirmBody>,
) -> ApiResult<Json<serde_json::Value>> {
    app.resolve_watch("commit", body.approve)
        .map_err(AppError::bad_request)?;
    Ok(Json(json!({ "success": true, "approved": body.approve })))
}
