//! Notification service.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::cache::{CachedReads, Namespace};
use crate::domain::entities::NotificationRecord;
use crate::domain::error::ensure_non_empty;
use crate::domain::types::{ChangeAction, EventType};

use super::effects::{WriteEffects, change_payload};
use super::error::AppError;
use super::repos::{CreateNotificationParams, NotificationsRepo};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationCommand {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationsRepo>,
    reads: CachedReads,
    effects: WriteEffects,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationsRepo>,
        reads: CachedReads,
        effects: WriteEffects,
    ) -> Self {
        Self {
            repo,
            reads,
            effects,
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, AppError> {
        let repo = self.repo.clone();
        self.reads
            .list(
                Namespace::Notifications,
                user_id,
                &json!({"unread_only": unread_only}),
                move || async move {
                    repo.list_notifications(user_id, unread_only)
                        .await
                        .map_err(AppError::from)
                },
            )
            .await
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        command: CreateNotificationCommand,
    ) -> Result<NotificationRecord, AppError> {
        ensure_non_empty(&command.title, "title")?;

        let notification = self
            .repo
            .create_notification(CreateNotificationParams {
                user_id,
                title: command.title,
                body: command.body,
            })
            .await?;

        self.effects.entity_changed(
            Namespace::Notifications,
            user_id,
            notification.id,
            EventType::Notification,
            change_payload(notification.id, &notification.title, ChangeAction::Created),
        );
        Ok(notification)
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<NotificationRecord, AppError> {
        let notification = self.repo.mark_read(user_id, id).await?;

        self.effects.entity_changed(
            Namespace::Notifications,
            user_id,
            id,
            EventType::Notification,
            change_payload(id, &notification.title, ChangeAction::Read),
        );
        Ok(notification)
    }
}
