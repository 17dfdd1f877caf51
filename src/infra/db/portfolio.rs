use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePortfolioItemParams, PortfolioQueryFilter, PortfolioRepo, RepoError,
    UpdatePortfolioItemParams,
};
use crate::domain::entities::PortfolioItemRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[async_trait]
impl PortfolioRepo for PostgresRepositories {
    async fn list_items(
        &self,
        owner_id: Uuid,
        filter: &PortfolioQueryFilter,
    ) -> Result<Vec<PortfolioItemRecord>, RepoError> {
        sqlx::query_as::<_, PortfolioItemRecord>(
            r#"
            SELECT id, owner_id, title, summary, body, tags, created_at, updated_at
            FROM portfolio_items
            WHERE owner_id = $1
              AND ($2::text IS NULL OR $2 = ANY(tags))
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%')
            ORDER BY updated_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(filter.tag.as_deref())
        .bind(filter.search.as_deref())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_item(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<PortfolioItemRecord>, RepoError> {
        sqlx::query_as::<_, PortfolioItemRecord>(
            r#"
            SELECT id, owner_id, title, summary, body, tags, created_at, updated_at
            FROM portfolio_items
            WHERE owner_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_item(
        &self,
        params: CreatePortfolioItemParams,
    ) -> Result<PortfolioItemRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        sqlx::query_as::<_, PortfolioItemRecord>(
            r#"
            INSERT INTO portfolio_items (id, owner_id, title, summary, body, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, owner_id, title, summary, body, tags, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.owner_id)
        .bind(params.title)
        .bind(params.summary)
        .bind(params.body)
        .bind(params.tags)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_item(
        &self,
        params: UpdatePortfolioItemParams,
    ) -> Result<PortfolioItemRecord, RepoError> {
        sqlx::query_as::<_, PortfolioItemRecord>(
            r#"
            UPDATE portfolio_items
            SET title = $3, summary = $4, body = $5, tags = $6, updated_at = $7
            WHERE owner_id = $1 AND id = $2
            RETURNING id, owner_id, title, summary, body, tags, created_at, updated_at
            "#,
        )
        .bind(params.owner_id)
        .bind(params.id)
        .bind(params.title)
        .bind(params.summary)
        .bind(params.body)
        .bind(params.tags)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_item(&self, owner_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM portfolio_items WHERE owner_id = $1 AND id = $2")
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
