//! The live event stream endpoint.
//!
//! `GET /api/v1/stream` holds the connection open indefinitely, emitting one
//! SSE frame per domain event for the authenticated user. Clients may narrow
//! by type (`?types=notification,activity`) and resume with the id of the
//! last frame they processed, either via `?last_event_id=` or the standard
//! `Last-Event-ID` header a browser `EventSource` sends on reconnect.

use axum::extract::{Extension, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::domain::types::EventType;
use crate::realtime::{EventId, StreamSession, sse_response_headers};

use super::middleware::CurrentUser;
use super::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StreamQuery {
    pub types: Option<String>,
    pub last_event_id: Option<EventId>,
}

pub async fn open_stream(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let interests = query
        .types
        .as_deref()
        .map(EventType::parse_filter)
        .unwrap_or_default();

    let last_event_id = query.last_event_id.or_else(|| {
        headers
            .get("last-event-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    });

    let handle = state.broker.subscribe(user.0, interests, last_event_id);
    let session = StreamSession::new(handle, state.realtime.heartbeat());

    (sse_response_headers(), session.into_sse())
}
