//! Domain events and stream items.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::EventType;

/// Monotonic per-process event sequence number. Assigned under the owning
/// user's registry entry, so ids are strictly increasing in each user's ring.
pub type EventId = u64;

/// An immutable domain event as published to the broker.
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    pub id: EventId,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl DomainEvent {
    /// Whether a subscriber with the given interest set should receive this
    /// event. An empty set means "all types".
    pub fn matches(&self, interests: &HashSet<EventType>) -> bool {
        interests.is_empty() || interests.contains(&self.event_type)
    }
}

/// What a subscriber pulls off its mailbox.
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// A live or replayed domain event.
    Event(Arc<DomainEvent>),
    /// Requested replay history was evicted; the client must refetch.
    ReplayGap,
}
