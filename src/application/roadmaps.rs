//! Learning roadmap service.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::cache::{CachedReads, Namespace};
use crate::domain::entities::RoadmapRecord;
use crate::domain::error::{DomainError, ensure_non_empty};
use crate::domain::types::{ChangeAction, EventType, RoadmapStatus};

use super::effects::{WriteEffects, change_payload};
use super::error::AppError;
use super::repos::{CreateRoadmapParams, RoadmapsRepo, UpdateRoadmapParams};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoadmapCommand {
    pub title: String,
    #[serde(default = "empty_milestones")]
    pub milestones: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoadmapCommand {
    pub title: String,
    pub status: RoadmapStatus,
    #[serde(default = "empty_milestones")]
    pub milestones: serde_json::Value,
}

fn empty_milestones() -> serde_json::Value {
    json!([])
}

#[derive(Clone)]
pub struct RoadmapService {
    repo: Arc<dyn RoadmapsRepo>,
    reads: CachedReads,
    effects: WriteEffects,
}

impl RoadmapService {
    pub fn new(repo: Arc<dyn RoadmapsRepo>, reads: CachedReads, effects: WriteEffects) -> Self {
        Self {
            repo,
            reads,
            effects,
        }
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<RoadmapRecord>, AppError> {
        let repo = self.repo.clone();
        self.reads
            .list(Namespace::Roadmaps, owner_id, &json!({}), move || async move {
                repo.list_roadmaps(owner_id).await.map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<RoadmapRecord, AppError> {
        let repo = self.repo.clone();
        let roadmap: Option<RoadmapRecord> = self
            .reads
            .entity(Namespace::Roadmaps, owner_id, id, move || async move {
                repo.find_roadmap(owner_id, id).await.map_err(AppError::from)
            })
            .await?;
        roadmap.ok_or_else(|| AppError::Domain(DomainError::not_found("roadmap")))
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        command: CreateRoadmapCommand,
    ) -> Result<RoadmapRecord, AppError> {
        ensure_non_empty(&command.title, "title")?;

        let roadmap = self
            .repo
            .create_roadmap(CreateRoadmapParams {
                owner_id,
                title: command.title,
                milestones: command.milestones,
            })
            .await?;

        self.effects.entity_changed(
            Namespace::Roadmaps,
            owner_id,
            roadmap.id,
            EventType::RoadmapUpdate,
            change_payload(roadmap.id, &roadmap.title, ChangeAction::Created),
        );
        Ok(roadmap)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        command: UpdateRoadmapCommand,
    ) -> Result<RoadmapRecord, AppError> {
        ensure_non_empty(&command.title, "title")?;

        let roadmap = self
            .repo
            .update_roadmap(UpdateRoadmapParams {
                id,
                owner_id,
                title: command.title,
                status: command.status,
                milestones: command.milestones,
            })
            .await?;

        self.effects.entity_changed(
            Namespace::Roadmaps,
            owner_id,
            id,
            EventType::RoadmapUpdate,
            json!({
                "id": roadmap.id,
                "title": roadmap.title,
                "action": ChangeAction::Updated.as_str(),
                "status": roadmap.status,
            }),
        );
        Ok(roadmap)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let roadmap = self
            .repo
            .find_roadmap(owner_id, id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::not_found("roadmap")))?;

        self.repo.delete_roadmap(owner_id, id).await?;

        self.effects.entity_changed(
            Namespace::Roadmaps,
            owner_id,
            id,
            EventType::RoadmapUpdate,
            change_payload(id, &roadmap.title, ChangeAction::Deleted),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::cache::{CacheConfig, CacheStore};
    use crate::realtime::{EventBroker, RealtimeConfig, StreamItem};

    use super::super::testing::InMemoryRepos;
    use super::*;

    fn service() -> (Arc<CacheStore>, Arc<EventBroker>, RoadmapService) {
        let repos = Arc::new(InMemoryRepos::new());
        let config = CacheConfig::default();
        let cache = Arc::new(CacheStore::new(&config));
        let broker = Arc::new(EventBroker::new(RealtimeConfig::default()));
        let service = RoadmapService::new(
            repos,
            CachedReads::new(cache.clone(), config),
            WriteEffects::new(cache.clone(), broker.clone()),
        );
        (cache, broker, service)
    }

    #[tokio::test]
    async fn lifecycle_publishes_roadmap_updates() {
        let (_, broker, service) = service();
        let owner = Uuid::new_v4();
        let handle = broker.subscribe(owner, HashSet::new(), None);

        let roadmap = service
            .create(
                owner,
                CreateRoadmapCommand {
                    title: "Backend path".to_string(),
                    milestones: json!([{"name": "HTTP basics", "done": false}]),
                },
            )
            .await
            .unwrap();

        service
            .update(
                owner,
                roadmap.id,
                UpdateRoadmapCommand {
                    title: "Backend path".to_string(),
                    status: RoadmapStatus::Completed,
                    milestones: json!([{"name": "HTTP basics", "done": true}]),
                },
            )
            .await
            .unwrap();

        service.delete(owner, roadmap.id).await.unwrap();

        let mut actions = Vec::new();
        while let Some(StreamItem::Event(event)) = handle.try_recv() {
            assert_eq!(event.event_type, EventType::RoadmapUpdate);
            actions.push(event.payload["action"].as_str().unwrap().to_string());
        }
        assert_eq!(actions, vec!["created", "updated", "deleted"]);
    }

    #[tokio::test]
    async fn get_caches_the_entity() {
        let (cache, _, service) = service();
        let owner = Uuid::new_v4();
        let roadmap = service
            .create(
                owner,
                CreateRoadmapCommand {
                    title: "Frontend path".to_string(),
                    milestones: json!([]),
                },
            )
            .await
            .unwrap();

        let _ = service.get(owner, roadmap.id).await.unwrap();
        assert_eq!(cache.len(), 1);
        let again = service.get(owner, roadmap.id).await.unwrap();
        assert_eq!(again.title, "Frontend path");
    }

    #[tokio::test]
    async fn update_of_unknown_roadmap_is_not_found() {
        let (_, _, service) = service();
        let owner = Uuid::new_v4();
        let result = service
            .update(
                owner,
                Uuid::new_v4(),
                UpdateRoadmapCommand {
                    title: "x".to_string(),
                    status: RoadmapStatus::Active,
                    milestones: json!([]),
                },
            )
            .await;
        assert!(result.is_err());
    }
}
