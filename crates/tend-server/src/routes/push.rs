use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiResult, AppError};
use crate::state::AppState;
use tend_core::git::{Git, PushOutcome, VersionControl};
use tend_core::logbook::LogKind;

/// POST /api/push: push the current branch, creating the upstream if absent.
pub async fn push_now(State(app): State<AppState>) -> ApiResult<Json<PushOutcome>> {
    let git = Git::new(app.root.clone());
    git.ensure_repo()?;

    app.log(LogKind::Git, "Pushing to remote...");
    let branch = git.current_branch()?;
    let outcome = git.push(&branch);

    if outcome.success {
        app.log(LogKind::Success, format!("Pushed to {branch}"));
    } else {
        app.log(
            LogKind::Error,
            format!(
                "Push failed: {}",
                outcome.error.clone().unwrap_or_else(|| "unknown error".into())
            ),
        );
    }

    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct ConfirmBody {
    pub approve: bool,
}

/// POST /api/push/confirm: resolve a pending escalation push request.
pub async fn confirm_push(
    State(app): State<AppState>,
    Json(body): Json<ConfirmBody>,
) -> ApiResult<Json<serde_json::Value>> {
    app.resolve_watch("push", body.approve)
        .map_err(AppError::bad_request)?;
    Ok(Json(json!({ "success": true, "approved": body.approve })))
}
