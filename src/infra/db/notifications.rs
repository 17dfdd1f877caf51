use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateNotificationParams, NotificationsRepo, RepoError};
use crate::domain::entities::NotificationRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const COLUMNS: &str = "id, user_id, title, body, read, created_at";

#[async_trait]
impl NotificationsRepo for PostgresRepositories {
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, RepoError> {
        sqlx::query_as::<_, NotificationRecord>(&format!(
            r#"
            SELECT {COLUMNS} FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR read = FALSE)
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError> {
        sqlx::query_as::<_, NotificationRecord>(&format!(
            r#"
            INSERT INTO notifications (id, user_id, title, body, read, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(params.user_id)
        .bind(params.title)
        .bind(params.body)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<NotificationRecord, RepoError> {
        sqlx::query_as::<_, NotificationRecord>(&format!(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE user_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)
    }
}
