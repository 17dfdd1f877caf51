//! Repository traits describing persistence adapters.
//!
//! The services treat the datastore as an opaque collaborator behind these
//! traits; the Postgres implementations live in `infra::db` and tests swap
//! in in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    ActivityRecord, NotificationRecord, PortfolioItemRecord, RoadmapRecord, SkillRecord,
    UserRecord,
};
use crate::domain::types::RoadmapStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filter for owner-scoped portfolio list reads. Also serves as the logical
/// query serialized into the cache key, so it must stay `Serialize`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioQueryFilter {
    pub tag: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePortfolioItemParams {
    pub owner_id: Uuid,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePortfolioItemParams {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait PortfolioRepo: Send + Sync {
    async fn list_items(
        &self,
        owner_id: Uuid,
        filter: &PortfolioQueryFilter,
    ) -> Result<Vec<PortfolioItemRecord>, RepoError>;

    async fn find_item(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PortfolioItemRecord>, RepoError>;

    async fn create_item(
        &self,
        params: CreatePortfolioItemParams,
    ) -> Result<PortfolioItemRecord, RepoError>;

    /// Returns `NotFound` when the id does not exist under this owner.
    async fn update_item(
        &self,
        params: UpdatePortfolioItemParams,
    ) -> Result<PortfolioItemRecord, RepoError>;

    async fn delete_item(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateSkillParams {
    pub owner_id: Uuid,
    pub name: String,
    pub category: String,
    pub progress: i32,
}

#[async_trait]
pub trait SkillsRepo: Send + Sync {
    async fn list_skills(&self, owner_id: Uuid) -> Result<Vec<SkillRecord>, RepoError>;

    async fn find_skill(&self, owner_id: Uuid, id: Uuid) -> Result<Option<SkillRecord>, RepoError>;

    async fn create_skill(&self, params: CreateSkillParams) -> Result<SkillRecord, RepoError>;

    async fn update_progress(
        &self,
        owner_id: Uuid,
        id: Uuid,
        progress: i32,
    ) -> Result<SkillRecord, RepoError>;

    /// Increment the attempt counter and raise `best_score` if beaten.
    async fn record_quiz(
        &self,
        owner_id: Uuid,
        id: Uuid,
        score: i32,
    ) -> Result<SkillRecord, RepoError>;

    async fn delete_skill(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateRoadmapParams {
    pub owner_id: Uuid,
    pub title: String,
    pub milestones: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct UpdateRoadmapParams {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub status: RoadmapStatus,
    pub milestones: serde_json::Value,
}

#[async_trait]
pub trait RoadmapsRepo: Send + Sync {
    async fn list_roadmaps(&self, owner_id: Uuid) -> Result<Vec<RoadmapRecord>, RepoError>;

    async fn find_roadmap(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RoadmapRecord>, RepoError>;

    async fn create_roadmap(&self, params: CreateRoadmapParams) -> Result<RoadmapRecord, RepoError>;

    async fn update_roadmap(&self, params: UpdateRoadmapParams) -> Result<RoadmapRecord, RepoError>;

    async fn delete_roadmap(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateNotificationParams {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationsRepo: Send + Sync {
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, RepoError>;

    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError>;

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<NotificationRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct RecordActivityParams {
    pub user_id: Uuid,
    pub kind: String,
    pub detail: serde_json::Value,
}

#[async_trait]
pub trait ActivitiesRepo: Send + Sync {
    async fn list_activities(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, RepoError>;

    async fn record_activity(
        &self,
        params: RecordActivityParams,
    ) -> Result<ActivityRecord, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_token_hash(&self, token_hash: &str)
    -> Result<Option<UserRecord>, RepoError>;
}
