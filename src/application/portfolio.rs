//! Portfolio item service: cached reads, write-path mutations.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::cache::{CachedReads, Namespace};
use crate::domain::entities::PortfolioItemRecord;
use crate::domain::error::{DomainError, ensure_non_empty};
use crate::domain::types::{ChangeAction, EventType};

use super::effects::{WriteEffects, change_payload};
use super::error::AppError;
use super::repos::{
    CreatePortfolioItemParams, PortfolioQueryFilter, PortfolioRepo, UpdatePortfolioItemParams,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePortfolioItemCommand {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePortfolioItemCommand {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone)]
pub struct PortfolioService {
    repo: Arc<dyn PortfolioRepo>,
    reads: CachedReads,
    effects: WriteEffects,
}

impl PortfolioService {
    pub fn new(repo: Arc<dyn PortfolioRepo>, reads: CachedReads, effects: WriteEffects) -> Self {
        Self {
            repo,
            reads,
            effects,
        }
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: PortfolioQueryFilter,
    ) -> Result<Vec<PortfolioItemRecord>, AppError> {
        let query = serde_json::to_value(&filter)
            .map_err(|err| AppError::unexpected(format!("filter serialization: {err}")))?;
        let repo = self.repo.clone();
        self.reads
            .list(Namespace::Portfolio, owner_id, &query, move || async move {
                repo.list_items(owner_id, &filter)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<PortfolioItemRecord, AppError> {
        let repo = self.repo.clone();
        let item: Option<PortfolioItemRecord> = self
            .reads
            .entity(Namespace::Portfolio, owner_id, id, move || async move {
                repo.find_item(owner_id, id).await.map_err(AppError::from)
            })
            .await?;
        item.ok_or_else(|| AppError::Domain(DomainError::not_found("portfolio item")))
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        command: CreatePortfolioItemCommand,
    ) -> Result<PortfolioItemRecord, AppError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.summary, "summary")?;

        let item = self
            .repo
            .create_item(CreatePortfolioItemParams {
                owner_id,
                title: command.title,
                summary: command.summary,
                body: command.body,
                tags: command.tags,
            })
            .await?;

        self.effects.entity_changed(
            Namespace::Portfolio,
            owner_id,
            item.id,
            EventType::PortfolioUpdate,
            change_payload(item.id, &item.title, ChangeAction::Created),
        );
        Ok(item)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        command: UpdatePortfolioItemCommand,
    ) -> Result<PortfolioItemRecord, AppError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.summary, "summary")?;

        let item = self
            .repo
            .update_item(UpdatePortfolioItemParams {
                id,
                owner_id,
                title: command.title,
                summary: command.summary,
                body: command.body,
                tags: command.tags,
            })
            .await?;

        self.effects.entity_changed(
            Namespace::Portfolio,
            owner_id,
            id,
            EventType::PortfolioUpdate,
            change_payload(id, &item.title, ChangeAction::Updated),
        );
        Ok(item)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let item = self
            .repo
            .find_item(owner_id, id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::not_found("portfolio item")))?;

        self.repo.delete_item(owner_id, id).await?;

        self.effects.entity_changed(
            Namespace::Portfolio,
            owner_id,
            id,
            EventType::PortfolioUpdate,
            change_payload(id, &item.title, ChangeAction::Deleted),
        );
        Ok(())
    }
}
