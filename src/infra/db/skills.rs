use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateSkillParams, RepoError, SkillsRepo};
use crate::domain::entities::SkillRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const COLUMNS: &str =
    "id, owner_id, name, category, progress, quiz_attempts, best_score, created_at, updated_at";

#[async_trait]
impl SkillsRepo for PostgresRepositories {
    async fn list_skills(&self, owner_id: Uuid) -> Result<Vec<SkillRecord>, RepoError> {
        sqlx::query_as::<_, SkillRecord>(&format!(
            "SELECT {COLUMNS} FROM skills WHERE owner_id = $1 ORDER BY name"
        ))
        .bind(owner_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_skill(&self, owner_id: Uuid, id: Uuid) -> Result<Option<SkillRecord>, RepoError> {
        sqlx::query_as::<_, SkillRecord>(&format!(
            "SELECT {COLUMNS} FROM skills WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_skill(&self, params: CreateSkillParams) -> Result<SkillRecord, RepoError> {
        sqlx::query_as::<_, SkillRecord>(&format!(
            r#"
            INSERT INTO skills (id, owner_id, name, category, progress, quiz_attempts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(params.owner_id)
        .bind(params.name)
        .bind(params.category)
        .bind(params.progress)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_progress(
        &self,
        owner_id: Uuid,
        id: Uuid,
        progress: i32,
    ) -> Result<SkillRecord, RepoError> {
        sqlx::query_as::<_, SkillRecord>(&format!(
            r#"
            UPDATE skills
            SET progress = $3, updated_at = $4
            WHERE owner_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(id)
        .bind(progress)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)
    }

    async fn record_quiz(
        &self,
        owner_id: Uuid,
        id: Uuid,
        score: i32,
    ) -> Result<SkillRecord, RepoError> {
        sqlx::query_as::<_, SkillRecord>(&format!(
            r#"
            UPDATE skills
            SET quiz_attempts = quiz_attempts + 1,
                best_score = GREATEST(COALESCE(best_score, 0), $3),
                updated_at = $4
            WHERE owner_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(id)
        .bind(score)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_skill(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM skills WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
