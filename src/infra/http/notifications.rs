//! Notification handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::notifications::CreateNotificationCommand;

use super::error::ApiError;
use super::middleware::CurrentUser;
use super::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotificationListQuery {
    pub unread_only: bool,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .notifications
        .list(user.0, query.unread_only)
        .await?;
    Ok(Json(notifications))
}

pub async fn create_notification(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateNotificationCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state.notifications.create(user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state.notifications.mark_read(user.0, id).await?;
    Ok(Json(notification))
}
