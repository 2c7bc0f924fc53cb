use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;
use tend_core::config::{self, ConfigScope, Settings};
use tend_core::logbook::LogKind;

/// GET /api/config: the fully resolved (layered) settings.
pub async fn get_config(State(app): State<AppState>) -> ApiResult<Json<Settings>> {
    Ok(Json(Settings::load(&app.root)?))
}

#[derive(Deserialize)]
pub struct SetConfigBody {
    pub key: String,
    pub value: String,
    /// Write to the global layer instead of the repository-local one.
    #[serde(default)]
    pub global: bool,
}

/// POST /api/config: set one key; validation happens at the store boundary.
pub async fn set_config(
    State(app): State<AppState>,
    Json(body): Json<SetConfigBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let scope = if body.global {
        ConfigScope::Global
    } else {
        ConfigScope::Local
    };
    config::set_value(&app.root, scope, &body.key, &body.value)?;
    app.log(
        LogKind::Info,
        format!("Config update: {} = {}", body.key, body.value),
    );
    Ok(Json(json!({ "success": true, "key": body.key, "value": body.value })))
}
