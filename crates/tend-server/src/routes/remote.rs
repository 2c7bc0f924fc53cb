use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiResult, AppError};
use crate::state::AppState;
use tend_core::git::Git;
use tend_core::logbook::LogKind;

#[derive(Deserialize)]
pub struct SetRemoteBody {
    pub url: String,
}

/// POST /api/remote/set: point `origin` at a new URL, creating it if absent.
pub async fn set_remote(
    State(app): State<AppState>,
    Json(body): Json<SetRemoteBody>,
) -> ApiResult<Json<serde_json::Value>> {
    if body.url.trim().is_empty() {
        return Err(AppError::bad_request("remote URL required"));
    }
    let git = Git::new(app.root.clone());
    git.ensure_repo()?;

    app.log(LogKind::Github, format!("Setting remote: {}", body.url));
    git.set_remote_url(&body.url)?;
    app.log(LogKind::Success, format!("Remote set to {}", body.url));

    Ok(Json(json!({ "success": true, "url": body.url })))
}
