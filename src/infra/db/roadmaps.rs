use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateRoadmapParams, RepoError, RoadmapsRepo, UpdateRoadmapParams,
};
use crate::domain::entities::RoadmapRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const COLUMNS: &str = "id, owner_id, title, status, milestones, created_at, updated_at";

#[async_trait]
impl RoadmapsRepo for PostgresRepositories {
    async fn list_roadmaps(&self, owner_id: Uuid) -> Result<Vec<RoadmapRecord>, RepoError> {
        sqlx::query_as::<_, RoadmapRecord>(&format!(
            "SELECT {COLUMNS} FROM roadmaps WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_roadmap(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RoadmapRecord>, RepoError> {
        sqlx::query_as::<_, RoadmapRecord>(&format!(
            "SELECT {COLUMNS} FROM roadmaps WHERE owner_id = $1 AND id = $2"
        ))
        .bind(owner_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_roadmap(
        &self,
        params: CreateRoadmapParams,
    ) -> Result<RoadmapRecord, RepoError> {
        sqlx::query_as::<_, RoadmapRecord>(&format!(
            r#"
            INSERT INTO roadmaps (id, owner_id, title, status, milestones, created_at, updated_at)
            VALUES ($1, $2, $3, 'active', $4, $5, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(params.owner_id)
        .bind(params.title)
        .bind(params.milestones)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_roadmap(
        &self,
        params: UpdateRoadmapParams,
    ) -> Result<RoadmapRecord, RepoError> {
        sqlx::query_as::<_, RoadmapRecord>(&format!(
            r#"
            UPDATE roadmaps
            SET title = $3, status = $4, milestones = $5, updated_at = $6
            WHERE owner_id = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(params.owner_id)
        .bind(params.id)
        .bind(params.title)
        .bind(params.status)
        .bind(params.milestones)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_roadmap(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM roadmaps WHERE owner_id = $1 AND id = $2")
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
