use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;
use tend_core::config::Settings;
use tend_core::git::{Git, VersionControl};
use tend_core::github;

/// GET /api/status: repository, configuration, and watch-loop state in one
/// payload for the dashboard's initial render.
pub async fn get_status(State(app): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let git = Git::new(app.root.clone());
    let settings = Settings::load(&app.root)?;

    let repo = if git.is_repo() {
        let (modified, untracked) = git.change_counts();
        let remote = git.remote_url();
        json!({
            "name": git.repo_name()?,
            "path": git.repo_path()?,
            "branch": git.current_branch()?,
            "remote": remote,
            "remote_https": remote.as_deref().map(github::remote_to_https),
            "has_changes": git.has_changes(),
            "change_size": git.change_size(),
            "modified_files": modified,
            "untracked_files": untracked,
            "last_commit": git.last_commit(),
            "unpushed_count": git.unpushed_count(),
            "log": git.log_oneline(10).unwrap_or_default(),
            "branches": git.branches().unwrap_or_default(),
        })
    } else {
        serde_json::Value::Null
    };

    Ok(Json(json!({
        "repo": repo,
        "config": settings,
        "watch": {
            "running": app.watch.is_running(),
            "pending": app.watch.pending_kind(),
        },
    })))
}
