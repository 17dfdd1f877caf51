//! Persistent domain records.
//!
//! Each record mirrors one row of the backing store. Records are plain data:
//! ownership checks and mutation rules live in the application services.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::types::RoadmapStatus;

/// An authenticated account. `token_hash` is the hex SHA-256 of the bearer
/// token; the plaintext is never stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub display_name: String,
    pub token_hash: String,
    pub created_at: OffsetDateTime,
}

/// A single portfolio entry: a project, write-up, or artifact a user shows off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PortfolioItemRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A tracked skill with quiz statistics.
///
/// `progress` is 0..=100. `best_score` is the highest quiz score seen,
/// also 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SkillRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: String,
    pub progress: i32,
    pub quiz_attempts: i32,
    pub best_score: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A learning roadmap; milestones are an ordered, client-shaped JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoadmapRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub status: RoadmapStatus,
    pub milestones: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One entry in a user's activity feed. `detail` is an opaque JSON document
/// shaped by the client that recorded the activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub detail: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
