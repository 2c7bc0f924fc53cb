use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

/// GET /api/events: SSE stream. Sends one `history` frame with the recent
/// activity log, then every engine event as it happens.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let history = {
        let log = app.activity.lock().expect("activity log poisoned");
        serde_json::json!({ "type": "history", "logs": log.recent(50) }).to_string()
    };

    let rx = app.events_tx.subscribe();
    let live = BroadcastStream::new(rx).filter_map(|msg| async move {
        msg.ok()
            .map(|data| Ok::<Event, Infallible>(Event::default().data(data)))
    });

    let stream = stream::once(async move {
        Ok::<Event, Infallible>(Event::default().data(history))
    })
    .chain(live);

    Sse::new(stream).keep_alive(KeepAlive::default())
}
