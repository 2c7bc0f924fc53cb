pub mod embed;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};

use state::AppState;
use tend_core::git::Git;

/// Build the axum Router with all API routes and middleware.
/// Returns the state too so callers can start the watch loop or log.
pub fn build_app(root: PathBuf) -> (Router, AppState) {
    let app_state = AppState::new(root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Status
        .route("/api/status", get(routes::status::get_status))
        // Activity log
        .route("/api/logs", get(routes::logs::get_logs))
        .route("/api/logs/clear", post(routes::logs::clear_logs))
        // Commits
        .route("/api/commit", post(routes::commit::commit_now))
        .route("/api/commit/confirm", post(routes::commit::confirm_commit))
        // Pushes
        .route("/api/push", post(routes::push::push_now))
        .route("/api/push/confirm", post(routes::push::confirm_push))
        // Config
        .route("/api/config", get(routes::config::get_config))
        .route("/api/config", post(routes::config::set_config))
        // Watch loop
        .route("/api/watch/start", post(routes::watch::start_watch))
        .route("/api/watch/stop", post(routes::watch::stop_watch))
        .route("/api/watch/status", get(routes::watch::watch_status))
        // Branches / remote
        .route("/api/branches", get(routes::branches::list_branches))
        .route("/api/branch/create", post(routes::branches::create_branch))
        .route("/api/branch/switch", post(routes::branches::switch_branch))
        .route("/api/remote/set", post(routes::remote::set_remote))
        .fallback(embed::static_handler)
        .layer(cors)
        .with_state(app_state.clone());

    (router, app_state)
}

/// Start the dashboard server on a pre-bound listener.
///
/// Accepting a bound `TcpListener` lets the caller read the actual port
/// first (useful when `port = 0` and the OS picks one). When `start_watch`
/// is set and the root is a repository, the watch loop starts immediately.
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
    start_watch: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let (app, state) = build_app(root.clone());

    tracing::info!("tend dashboard listening on http://localhost:{actual_port}");

    if start_watch && Git::new(root).is_repo() {
        state.start_watch();
        tracing::info!("watch mode started automatically");
    }

    if open_browser {
        let url = format!("http://localhost:{actual_port}");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
