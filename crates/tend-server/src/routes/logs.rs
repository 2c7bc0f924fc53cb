use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;
use tend_core::logbook::LogEntry;

#[derive(Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// GET /api/logs: newest-first activity entries.
pub async fn get_logs(
    State(app): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    let entries = app
        .activity
        .lock()
        .expect("activity log poisoned")
        .recent(query.limit);
    Ok(Json(entries))
}

/// POST /api/logs/clear
pub async fn clear_logs(State(app): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    app.activity
        .lock()
        .expect("activity log poisoned")
        .clear();
    Ok(Json(json!({ "success": true })))
}
