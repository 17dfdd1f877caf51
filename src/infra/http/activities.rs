//! Activity feed handlers.

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::activities::RecordActivityCommand;

use super::error::ApiError;
use super::middleware::CurrentUser;
use super::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityListQuery {
    pub limit: Option<u32>,
}

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ActivityListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let activities = state.activities.list(user.0, query.limit).await?;
    Ok(Json(activities))
}

pub async fn record_activity(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<RecordActivityCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let activity = state.activities.record(user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}
