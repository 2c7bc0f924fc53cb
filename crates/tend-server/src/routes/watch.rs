use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;
use tend_core::git::Git;

/// POST /api/watch/start
pub async fn start_watch(State(app): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    Git::new(app.root.clone()).ensure_repo()?;
    let started = app.start_watch();
    Ok(Json(json!({ "success": true, "watching": true, "started": started })))
}

/// POST /api/watch/stop
pub async fn stop_watch(State(app): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let stopped = app.stop_watch();
    Ok(Json(json!({ "success": true, "watching": false, "stopped": stopped })))
}

/// GET /api/watch/status
pub async fn watch_status(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "watching": app.watch.is_running(),
        "pending": app.watch.pending_kind(),
    }))
}
