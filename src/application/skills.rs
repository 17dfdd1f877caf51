//! Skill tracking: progress updates, quiz results, achievement unlocks.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::cache::{CachedReads, Namespace};
use crate::domain::entities::SkillRecord;
use crate::domain::error::{DomainError, ensure_non_empty, ensure_percent};
use crate::domain::types::{ChangeAction, EventType};

use super::effects::{WriteEffects, change_payload};
use super::error::AppError;
use super::repos::{CreateNotificationParams, CreateSkillParams, NotificationsRepo, SkillsRepo};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSkillCommand {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub progress: i32,
}

#[derive(Clone)]
pub struct SkillService {
    repo: Arc<dyn SkillsRepo>,
    notifications: Arc<dyn NotificationsRepo>,
    reads: CachedReads,
    effects: WriteEffects,
}

impl SkillService {
    pub fn new(
        repo: Arc<dyn SkillsRepo>,
        notifications: Arc<dyn NotificationsRepo>,
        reads: CachedReads,
        effects: WriteEffects,
    ) -> Self {
        Self {
            repo,
            notifications,
            reads,
            effects,
        }
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<SkillRecord>, AppError> {
        let repo = self.repo.clone();
        self.reads
            .list(Namespace::Skills, owner_id, &json!({}), move || async move {
                repo.list_skills(owner_id).await.map_err(AppError::from)
            })
            .await
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        command: CreateSkillCommand,
    ) -> Result<SkillRecord, AppError> {
        ensure_non_empty(&command.name, "name")?;
        ensure_non_empty(&command.category, "category")?;
        ensure_percent(command.progress, "progress")?;

        let skill = self
            .repo
            .create_skill(CreateSkillParams {
                owner_id,
                name: command.name,
                category: command.category,
                progress: command.progress,
            })
            .await?;

        self.effects.entity_changed(
            Namespace::Skills,
            owner_id,
            skill.id,
            EventType::SkillProgress,
            json!({
                "id": skill.id,
                "title": skill.name,
                "action": ChangeAction::Created.as_str(),
                "progress": skill.progress,
            }),
        );
        Ok(skill)
    }

    pub async fn update_progress(
        &self,
        owner_id: Uuid,
        id: Uuid,
        progress: i32,
    ) -> Result<SkillRecord, AppError> {
        ensure_percent(progress, "progress")?;

        let skill = self.repo.update_progress(owner_id, id, progress).await?;

        self.effects.entity_changed(
            Namespace::Skills,
            owner_id,
            id,
            EventType::SkillProgress,
            json!({
                "id": skill.id,
                "title": skill.name,
                "action": ChangeAction::Updated.as_str(),
                "progress": skill.progress,
            }),
        );

        if skill.progress >= 100 {
            self.unlock_achievement(owner_id, &skill, "Skill mastered")
                .await;
        }
        Ok(skill)
    }

    /// Record a quiz attempt against a skill.
    ///
    /// A perfect score unlocks an achievement on top of the quiz event.
    pub async fn complete_quiz(
        &self,
        owner_id: Uuid,
        id: Uuid,
        score: i32,
    ) -> Result<SkillRecord, AppError> {
        ensure_percent(score, "score")?;

        let skill = self.repo.record_quiz(owner_id, id, score).await?;

        self.effects.entity_changed(
            Namespace::Skills,
            owner_id,
            id,
            EventType::QuizCompleted,
            json!({
                "id": skill.id,
                "title": skill.name,
                "score": score,
                "attempts": skill.quiz_attempts,
                "best_score": skill.best_score,
            }),
        );

        if score >= 100 {
            self.unlock_achievement(owner_id, &skill, "Perfect quiz score")
                .await;
        }
        Ok(skill)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let skill = self
            .repo
            .find_skill(owner_id, id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::not_found("skill")))?;

        self.repo.delete_skill(owner_id, id).await?;

        self.effects.entity_changed(
            Namespace::Skills,
            owner_id,
            id,
            EventType::SkillProgress,
            change_payload(id, &skill.name, ChangeAction::Deleted),
        );
        Ok(())
    }

    /// Derived write pass: persist a congratulation notification and publish
    /// an achievement event. Best-effort relative to the primary mutation,
    /// which already committed.
    async fn unlock_achievement(&self, owner_id: Uuid, skill: &SkillRecord, reason: &str) {
        let created = self
            .notifications
            .create_notification(CreateNotificationParams {
                user_id: owner_id,
                title: format!("{reason}: {}", skill.name),
                body: format!("You reached a milestone in `{}`. Keep going!", skill.name),
            })
            .await;

        match created {
            Ok(notification) => {
                self.effects.entity_changed(
                    Namespace::Notifications,
                    owner_id,
                    notification.id,
                    EventType::AchievementUnlocked,
                    json!({
                        "id": notification.id,
                        "title": notification.title,
                        "skill_id": skill.id,
                    }),
                );
            }
            Err(err) => {
                warn!(
                    %owner_id,
                    skill_id = %skill.id,
                    error = %err,
                    "achievement notification could not be persisted; skipping publish"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::cache::{CacheConfig, CacheStore};
    use crate::realtime::{EventBroker, RealtimeConfig, StreamItem, SubscriptionHandle};

    use super::super::testing::InMemoryRepos;
    use super::*;

    struct Harness {
        repos: Arc<InMemoryRepos>,
        cache: Arc<CacheStore>,
        broker: Arc<EventBroker>,
        service: SkillService,
    }

    fn harness() -> Harness {
        let repos = Arc::new(InMemoryRepos::new());
        let config = CacheConfig::default();
        let cache = Arc::new(CacheStore::new(&config));
        let broker = Arc::new(EventBroker::new(RealtimeConfig::default()));
        let service = SkillService::new(
            repos.clone(),
            repos.clone(),
            CachedReads::new(cache.clone(), config),
            WriteEffects::new(cache.clone(), broker.clone()),
        );
        Harness {
            repos,
            cache,
            broker,
            service,
        }
    }

    fn types(handle: &SubscriptionHandle) -> Vec<EventType> {
        let mut seen = Vec::new();
        while let Some(item) = handle.try_recv() {
            match item {
                StreamItem::Event(event) => seen.push(event.event_type),
                StreamItem::ReplayGap => panic!("unexpected replay gap"),
            }
        }
        seen
    }

    async fn make_skill(h: &Harness, owner: Uuid) -> SkillRecord {
        h.service
            .create(
                owner,
                CreateSkillCommand {
                    name: "Rust".to_string(),
                    category: "systems".to_string(),
                    progress: 10,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn progress_update_publishes_skill_progress() {
        let h = harness();
        let owner = Uuid::new_v4();
        let skill = make_skill(&h, owner).await;

        let handle = h.broker.subscribe(owner, HashSet::new(), None);
        h.service.update_progress(owner, skill.id, 40).await.unwrap();
        assert_eq!(types(&handle), vec![EventType::SkillProgress]);
    }

    #[tokio::test]
    async fn full_progress_unlocks_achievement() {
        let h = harness();
        let owner = Uuid::new_v4();
        let skill = make_skill(&h, owner).await;

        let handle = h.broker.subscribe(owner, HashSet::new(), None);
        h.service
            .update_progress(owner, skill.id, 100)
            .await
            .unwrap();

        assert_eq!(
            types(&handle),
            vec![EventType::SkillProgress, EventType::AchievementUnlocked]
        );
        // The congratulation landed in the notification store.
        assert_eq!(h.repos.notifications.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn quiz_updates_attempts_and_best_score() {
        let h = harness();
        let owner = Uuid::new_v4();
        let skill = make_skill(&h, owner).await;

        let after_first = h.service.complete_quiz(owner, skill.id, 60).await.unwrap();
        assert_eq!(after_first.quiz_attempts, 1);
        assert_eq!(after_first.best_score, Some(60));

        let after_second = h.service.complete_quiz(owner, skill.id, 40).await.unwrap();
        assert_eq!(after_second.quiz_attempts, 2);
        assert_eq!(after_second.best_score, Some(60));
    }

    #[tokio::test]
    async fn perfect_quiz_publishes_quiz_then_achievement() {
        let h = harness();
        let owner = Uuid::new_v4();
        let skill = make_skill(&h, owner).await;

        let handle = h.broker.subscribe(owner, HashSet::new(), None);
        h.service.complete_quiz(owner, skill.id, 100).await.unwrap();
        assert_eq!(
            types(&handle),
            vec![EventType::QuizCompleted, EventType::AchievementUnlocked]
        );
    }

    #[tokio::test]
    async fn quiz_invalidates_skill_list_cache() {
        let h = harness();
        let owner = Uuid::new_v4();
        let skill = make_skill(&h, owner).await;

        let _ = h.service.list(owner).await.unwrap();
        assert!(h.cache.len() >= 1);
        h.service.complete_quiz(owner, skill.id, 70).await.unwrap();

        let listed = h.service.list(owner).await.unwrap();
        assert_eq!(listed[0].quiz_attempts, 1);
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let h = harness();
        let owner = Uuid::new_v4();
        let skill = make_skill(&h, owner).await;
        assert!(h.service.complete_quiz(owner, skill.id, 101).await.is_err());
        assert!(h.service.update_progress(owner, skill.id, -5).await.is_err());
    }
}
