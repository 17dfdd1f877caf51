use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{ActivitiesRepo, RecordActivityParams, RepoError};
use crate::domain::entities::ActivityRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const COLUMNS: &str = "id, user_id, kind, detail, created_at";

#[async_trait]
impl ActivitiesRepo for PostgresRepositories {
    async fn list_activities(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ActivityRecord>, RepoError> {
        sqlx::query_as::<_, ActivityRecord>(&format!(
            r#"
            SELECT {COLUMNS} FROM activities
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn record_activity(
        &self,
        params: RecordActivityParams,
    ) -> Result<ActivityRecord, RepoError> {
        sqlx::query_as::<_, ActivityRecord>(&format!(
            r#"
            INSERT INTO activities (id, user_id, kind, detail, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(params.user_id)
        .bind(params.kind)
        .bind(params.detail)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
