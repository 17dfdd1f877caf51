//! In-memory repository fakes for service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    ActivityRecord, NotificationRecord, PortfolioItemRecord, RoadmapRecord, SkillRecord,
    UserRecord,
};

use super::repos::{
    ActivitiesRepo, CreateNotificationParams, CreatePortfolioItemParams, CreateRoadmapParams,
    CreateSkillParams, NotificationsRepo, PortfolioQueryFilter, PortfolioRepo,
    RecordActivityParams, RepoError, RoadmapsRepo, SkillsRepo, UpdatePortfolioItemParams,
    UpdateRoadmapParams, UsersRepo,
};

/// One fake backing every repo trait. Set `fail_writes` to make the next
/// mutation behave like a datastore outage.
#[derive(Default)]
pub struct InMemoryRepos {
    pub portfolio: Mutex<Vec<PortfolioItemRecord>>,
    pub skills: Mutex<Vec<SkillRecord>>,
    pub roadmaps: Mutex<Vec<RoadmapRecord>>,
    pub notifications: Mutex<Vec<NotificationRecord>>,
    pub activities: Mutex<Vec<ActivityRecord>>,
    pub users: Mutex<Vec<UserRecord>>,
    pub fail_writes: AtomicBool,
}

impl InMemoryRepos {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_write(&self) -> Result<(), RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PortfolioRepo for InMemoryRepos {
    async fn list_items(
        &self,
        owner_id: Uuid,
        filter: &PortfolioQueryFilter,
    ) -> Result<Vec<PortfolioItemRecord>, RepoError> {
        let items = self.portfolio.lock().unwrap();
        Ok(items
            .iter()
            .filter(|item| item.owner_id == owner_id)
            .filter(|item| {
                filter
                    .tag
                    .as_ref()
                    .is_none_or(|tag| item.tags.contains(tag))
            })
            .filter(|item| {
                filter
                    .search
                    .as_ref()
                    .is_none_or(|needle| item.title.contains(needle.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn find_item(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PortfolioItemRecord>, RepoError> {
        let items = self.portfolio.lock().unwrap();
        Ok(items
            .iter()
            .find(|item| item.owner_id == owner_id && item.id == id)
            .cloned())
    }

    async fn create_item(
        &self,
        params: CreatePortfolioItemParams,
    ) -> Result<PortfolioItemRecord, RepoError> {
        self.check_write()?;
        let now = OffsetDateTime::now_utc();
        let record = PortfolioItemRecord {
            id: Uuid::new_v4(),
            owner_id: params.owner_id,
            title: params.title,
            summary: params.summary,
            body: params.body,
            tags: params.tags,
            created_at: now,
            updated_at: now,
        };
        self.portfolio.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_item(
        &self,
        params: UpdatePortfolioItemParams,
    ) -> Result<PortfolioItemRecord, RepoError> {
        self.check_write()?;
        let mut items = self.portfolio.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|item| item.owner_id == params.owner_id && item.id == params.id)
            .ok_or(RepoError::NotFound)?;
        item.title = params.title;
        item.summary = params.summary;
        item.body = params.body;
        item.tags = params.tags;
        item.updated_at = OffsetDateTime::now_utc();
        Ok(item.clone())
    }

    async fn delete_item(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        self.check_write()?;
        let mut items = self.portfolio.lock().unwrap();
        let before = items.len();
        items.retain(|item| !(item.owner_id == owner_id && item.id == id));
        if items.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SkillsRepo for InMemoryRepos {
    async fn list_skills(&self, owner_id: Uuid) -> Result<Vec<SkillRecord>, RepoError> {
        let skills = self.skills.lock().unwrap();
        Ok(skills
            .iter()
            .filter(|skill| skill.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_skill(&self, owner_id: Uuid, id: Uuid) -> Result<Option<SkillRecord>, RepoError> {
        let skills = self.skills.lock().unwrap();
        Ok(skills
            .iter()
            .find(|skill| skill.owner_id == owner_id && skill.id == id)
            .cloned())
    }

    async fn create_skill(&self, params: CreateSkillParams) -> Result<SkillRecord, RepoError> {
        self.check_write()?;
        let now = OffsetDateTime::now_utc();
        let record = SkillRecord {
            id: Uuid::new_v4(),
            owner_id: params.owner_id,
            name: params.name,
            category: params.category,
            progress: params.progress,
            quiz_attempts: 0,
            best_score: None,
            created_at: now,
            updated_at: now,
        };
        self.skills.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_progress(
        &self,
        owner_id: Uuid,
        id: Uuid,
        progress: i32,
    ) -> Result<SkillRecord, RepoError> {
        self.check_write()?;
        let mut skills = self.skills.lock().unwrap();
        let skill = skills
            .iter_mut()
            .find(|skill| skill.owner_id == owner_id && skill.id == id)
            .ok_or(RepoError::NotFound)?;
        skill.progress = progress;
        skill.updated_at = OffsetDateTime::now_utc();
        Ok(skill.clone())
    }

    async fn record_quiz(
        &self,
        owner_id: Uuid,
        id: Uuid,
        score: i32,
    ) -> Result<SkillRecord, RepoError> {
        self.check_write()?;
        let mut skills = self.skills.lock().unwrap();
        let skill = skills
            .iter_mut()
            .find(|skill| skill.owner_id == owner_id && skill.id == id)
            .ok_or(RepoError::NotFound)?;
        skill.quiz_attempts += 1;
        skill.best_score = Some(skill.best_score.unwrap_or(0).max(score));
        skill.updated_at = OffsetDateTime::now_utc();
        Ok(skill.clone())
    }

    async fn delete_skill(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        self.check_write()?;
        let mut skills = self.skills.lock().unwrap();
        let before = skills.len();
        skills.retain(|skill| !(skill.owner_id == owner_id && skill.id == id));
        if skills.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl RoadmapsRepo for InMemoryRepos {
    async fn list_roadmaps(&self, owner_id: Uuid) -> Result<Vec<RoadmapRecord>, RepoError> {
        let roadmaps = self.roadmaps.lock().unwrap();
        Ok(roadmaps
            .iter()
            .filter(|roadmap| roadmap.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_roadmap(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RoadmapRecord>, RepoError> {
        let roadmaps = self.roadmaps.lock().unwrap();
        Ok(roadmaps
            .iter()
            .find(|roadmap| roadmap.owner_id == owner_id && roadmap.id == id)
            .cloned())
    }

    async fn create_roadmap(
        &self,
        params: CreateRoadmapParams,
    ) -> Result<RoadmapRecord, RepoError> {
        self.check_write()?;
        let now = OffsetDateTime::now_utc();
        let record = RoadmapRecord {
            id: Uuid::new_v4(),
            owner_id: params.owner_id,
            title: params.title,
            status: crate::domain::types::RoadmapStatus::Active,
            milestones: params.milestones,
            created_at: now,
            updated_at: now,
        };
        self.roadmaps.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_roadmap(
        &self,
        params: UpdateRoadmapParams,
    ) -> Result<RoadmapRecord, RepoError> {
        self.check_write()?;
        let mut roadmaps = self.roadmaps.lock().unwrap();
        let roadmap = roadmaps
            .iter_mut()
            .find(|roadmap| roadmap.owner_id == params.owner_id && roadmap.id == params.id)
            .ok_or(RepoError::NotFound)?;
        roadmap.title = params.title;
        roadmap.status = params.status;
        roadmap.milestones = params.milestones;
        roadmap.updated_at = OffsetDateTime::now_utc();
        Ok(roadmap.clone())
    }

    async fn delete_roadmap(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        self.check_write()?;
        let mut roadmaps = self.roadmaps.lock().unwrap();
        let before = roadmaps.len();
        roadmaps.retain(|roadmap| !(roadmap.owner_id == owner_id && roadmap.id == id));
        if roadmaps.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationsRepo for InMemoryRepos {
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, RepoError> {
        let notifications = self.notifications.lock().unwrap();
        Ok(notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect())
    }

    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError> {
        self.check_write()?;
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            title: params.title,
            body: params.body,
            read: false,
            created_at: OffsetDateTime::now_utc(),
        };
        self.notifications.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<NotificationRecord, RepoError> {
        self.check_write()?;
        let mut notifications = self.notifications.lock().unwrap();
        let notification = notifications
            .iter_mut()
            .find(|n| n.user_id == user_id && n.id == id)
            .ok_or(RepoError::NotFound)?;
        notification.read = true;
        Ok(notification.clone())
    }
}

#[async_trait]
impl ActivitiesRepo for InMemoryRepos {
    async fn list_activities(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, RepoError> {
        let activities = self.activities.lock().unwrap();
        Ok(activities
            .iter()
            .filter(|activity| activity.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn record_activity(
        &self,
        params: RecordActivityParams,
    ) -> Result<ActivityRecord, RepoError> {
        self.check_write()?;
        let record = ActivityRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            kind: params.kind,
            detail: params.detail,
            created_at: OffsetDateTime::now_utc(),
        };
        self.activities.lock().unwrap().push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl UsersRepo for InMemoryRepos {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.token_hash == token_hash).cloned())
    }
}
