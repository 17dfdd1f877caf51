//! Portfolio item handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::portfolio::{CreatePortfolioItemCommand, UpdatePortfolioItemCommand};
use crate::application::repos::PortfolioQueryFilter;

use super::error::ApiError;
use super::middleware::CurrentUser;
use super::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PortfolioListQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
}

pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<PortfolioListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = PortfolioQueryFilter {
        tag: query.tag,
        search: query.search,
    };
    let items = state.portfolio.list(user.0, filter).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.portfolio.get(user.0, id).await?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreatePortfolioItemCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.portfolio.create(user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePortfolioItemCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.portfolio.update(user.0, id, payload).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.portfolio.delete(user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
