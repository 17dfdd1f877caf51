//! Postgres persistence adapters.
//!
//! `PostgresRepositories` implements every repository trait over one pool;
//! `main` hands it to the application layer as `Arc<dyn ...Repo>` handles.

mod activities;
mod notifications;
mod portfolio;
mod roadmaps;
mod skills;
mod users;
mod util;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub struct PostgresRepositories {
    pool: PgPool,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
    }

    /// Pool handle without an established connection; used by router tests.
    pub fn connect_lazy(database_url: &str) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new().connect_lazy(database_url)
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
