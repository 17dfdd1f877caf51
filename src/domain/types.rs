//! Closed enumerations shared across the domain.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Domain event types routed through the realtime broker.
///
/// This enumeration is closed: every mutating operation maps to exactly one
/// of these tags, and stream subscribers filter on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Activity,
    Notification,
    PortfolioUpdate,
    SkillProgress,
    RoadmapUpdate,
    QuizCompleted,
    AchievementUnlocked,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Activity => "activity",
            EventType::Notification => "notification",
            EventType::PortfolioUpdate => "portfolio-update",
            EventType::SkillProgress => "skill-progress",
            EventType::RoadmapUpdate => "roadmap-update",
            EventType::QuizCompleted => "quiz-completed",
            EventType::AchievementUnlocked => "achievement-unlocked",
        }
    }

    /// Parse a comma-separated filter list as supplied on the stream endpoint.
    ///
    /// Unknown tags are ignored rather than rejected so that newer clients can
    /// subscribe against older servers. An empty result means "all types".
    pub fn parse_filter(raw: &str) -> HashSet<EventType> {
        raw.split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activity" => Ok(EventType::Activity),
            "notification" => Ok(EventType::Notification),
            "portfolio-update" => Ok(EventType::PortfolioUpdate),
            "skill-progress" => Ok(EventType::SkillProgress),
            "roadmap-update" => Ok(EventType::RoadmapUpdate),
            "quiz-completed" => Ok(EventType::QuizCompleted),
            "achievement-unlocked" => Ok(EventType::AchievementUnlocked),
            _ => Err(()),
        }
    }
}

/// Lifecycle of a learning roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "roadmap_status", rename_all = "lowercase")]
pub enum RoadmapStatus {
    Active,
    Paused,
    Completed,
}

/// Mutation verbs carried in event payloads so clients can react without a
/// refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    Read,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Updated => "updated",
            ChangeAction::Deleted => "deleted",
            ChangeAction::Read => "read",
        }
    }
}
