//! Activity feed service.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::cache::{CachedReads, Namespace};
use crate::domain::entities::ActivityRecord;
use crate::domain::error::ensure_non_empty;
use crate::domain::types::{ChangeAction, EventType};

use super::effects::WriteEffects;
use super::error::AppError;
use super::repos::{ActivitiesRepo, RecordActivityParams};

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordActivityCommand {
    pub kind: String,
    #[serde(default = "empty_detail")]
    pub detail: serde_json::Value,
}

fn empty_detail() -> serde_json::Value {
    json!({})
}

#[derive(Clone)]
pub struct ActivityService {
    repo: Arc<dyn ActivitiesRepo>,
    reads: CachedReads,
    effects: WriteEffects,
}

impl ActivityService {
    pub fn new(repo: Arc<dyn ActivitiesRepo>, reads: CachedReads, effects: WriteEffects) -> Self {
        Self {
            repo,
            reads,
            effects,
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let repo = self.repo.clone();
        self.reads
            .list(
                Namespace::Activities,
                user_id,
                &json!({"limit": limit}),
                move || async move {
                    repo.list_activities(user_id, limit)
                        .await
                        .map_err(AppError::from)
                },
            )
            .await
    }

    pub async fn record(
        &self,
        user_id: Uuid,
        command: RecordActivityCommand,
    ) -> Result<ActivityRecord, AppError> {
        ensure_non_empty(&command.kind, "kind")?;

        let activity = self
            .repo
            .record_activity(RecordActivityParams {
                user_id,
                kind: command.kind,
                detail: command.detail,
            })
            .await?;

        self.effects.entity_changed(
            Namespace::Activities,
            user_id,
            activity.id,
            EventType::Activity,
            json!({
                "id": activity.id,
                "title": activity.kind,
                "action": ChangeAction::Created.as_str(),
            }),
        );
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::cache::{CacheConfig, CacheStore};
    use crate::realtime::{EventBroker, RealtimeConfig, StreamItem};

    use super::super::testing::InMemoryRepos;
    use super::*;

    fn service() -> (Arc<CacheStore>, Arc<EventBroker>, ActivityService) {
        let repos = Arc::new(InMemoryRepos::new());
        let config = CacheConfig::default();
        let cache = Arc::new(CacheStore::new(&config));
        let broker = Arc::new(EventBroker::new(RealtimeConfig::default()));
        let service = ActivityService::new(
            repos,
            CachedReads::new(cache.clone(), config),
            WriteEffects::new(cache.clone(), broker.clone()),
        );
        (cache, broker, service)
    }

    #[tokio::test]
    async fn record_publishes_activity_event() {
        let (_, broker, service) = service();
        let user = Uuid::new_v4();
        let handle = broker.subscribe(user, HashSet::new(), None);

        let activity = service
            .record(
                user,
                RecordActivityCommand {
                    kind: "lesson-finished".to_string(),
                    detail: json!({"lesson": "ownership"}),
                },
            )
            .await
            .unwrap();

        match handle.try_recv() {
            Some(StreamItem::Event(event)) => {
                assert_eq!(event.event_type, EventType::Activity);
                assert_eq!(event.payload["id"], json!(activity.id));
            }
            other => panic!("expected activity event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_limit_is_clamped_and_part_of_the_key() {
        let (cache, _, service) = service();
        let user = Uuid::new_v4();
        for n in 0..3 {
            service
                .record(
                    user,
                    RecordActivityCommand {
                        kind: format!("step-{n}"),
                        detail: json!({}),
                    },
                )
                .await
                .unwrap();
        }

        let two = service.list(user, Some(2)).await.unwrap();
        assert_eq!(two.len(), 2);
        let all = service.list(user, None).await.unwrap();
        assert_eq!(all.len(), 3);
        // Distinct limits produced distinct cache keys.
        assert_eq!(cache.len(), 2);

        let oversized = service.list(user, Some(10_000)).await.unwrap();
        assert_eq!(oversized.len(), 3);
    }

    #[tokio::test]
    async fn blank_kind_is_rejected() {
        let (_, _, service) = service();
        let result = service
            .record(
                Uuid::new_v4(),
                RecordActivityCommand {
                    kind: " ".to_string(),
                    detail: json!({}),
                },
            )
            .await;
        assert!(result.is_err());
    }
}
