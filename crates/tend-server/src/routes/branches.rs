use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiResult, AppError};
use crate::state::AppState;
use tend_core::git::Git;
use tend_core::logbook::LogKind;

/// GET /api/branches
pub async fn list_branches(State(app): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let git = Git::new(app.root.clone());
    git.ensure_repo()?;
    Ok(Json(git.branches()?))
}

#[derive(Deserialize)]
pub struct CreateBody {
    pub name: String,
}

/// POST /api/branch/create
pub async fn create_branch(
    State(app): State<AppState>,
    Json(body): Json<CreateBody>,
) -> ApiResult<Json<serde_json::Value>> {
    if body.name.trim().is_empty() {
        return Err(AppError::bad_request("branch name required"));
    }
    let git = Git::new(app.root.clone());
    git.ensure_repo()?;

    app.log(LogKind::Git, format!("Creating branch: {}", body.name));
    git.create_branch(&body.name)?;
    app.log(LogKind::Success, format!("Created and switched to {}", body.name));

    Ok(Json(json!({ "success": true, "branch": body.name })))
}

#[derive(Deserialize)]
pub struct SwitchBody {
    #[serde(rename = "ref")]
    pub reference: String,
}

/// POST /api/branch/switch: accepts branch names plus the `prev`/`next`
/// aliases.
pub async fn switch_branch(
    State(app): State<AppState>,
    Json(body): Json<SwitchBody>,
) -> ApiResult<Json<serde_json::Value>> {
    if body.reference.trim().is_empty() {
        return Err(AppError::bad_request("branch ref required"));
    }
    let git = Git::new(app.root.clone());
    git.ensure_repo()?;

    app.log(LogKind::Git, format!("Switching to: {}", body.reference));
    git.switch_branch(&body.reference)?;
    app.log(LogKind::Success, format!("Switched to {}", body.reference));

    Ok(Json(json!({ "success": true, "ref": body.reference })))
}
