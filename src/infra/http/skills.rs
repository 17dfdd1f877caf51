//! Skill handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::skills::CreateSkillCommand;

use super::error::ApiError;
use super::middleware::CurrentUser;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub progress: i32,
}

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub score: i32,
}

pub async fn list_skills(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let skills = state.skills.list(user.0).await?;
    Ok(Json(skills))
}

pub async fn create_skill(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateSkillCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state.skills.create(user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state
        .skills
        .update_progress(user.0, id, payload.progress)
        .await?;
    Ok(Json(skill))
}

pub async fn complete_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state
        .skills
        .complete_quiz(user.0, id, payload.score)
        .await?;
    Ok(Json(skill))
}

pub async fn delete_skill(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.skills.delete(user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
