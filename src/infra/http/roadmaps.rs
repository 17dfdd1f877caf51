//! Roadmap handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::roadmaps::{CreateRoadmapCommand, UpdateRoadmapCommand};

use super::error::ApiError;
use super::middleware::CurrentUser;
use super::state::AppState;

pub async fn list_roadmaps(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let roadmaps = state.roadmaps.list(user.0).await?;
    Ok(Json(roadmaps))
}

pub async fn get_roadmap(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let roadmap = state.roadmaps.get(user.0, id).await?;
    Ok(Json(roadmap))
}

pub async fn create_roadmap(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateRoadmapCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let roadmap = state.roadmaps.create(user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(roadmap)))
}

pub async fn update_roadmap(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoadmapCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let roadmap = state.roadmaps.update(user.0, id, payload).await?;
    Ok(Json(roadmap))
}

pub async fn delete_roadmap(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.roadmaps.delete(user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
