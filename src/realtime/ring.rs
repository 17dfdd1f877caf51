//! Bounded per-user ring of recent events.

use std::collections::VecDeque;
use std::sync::Arc;

use super::event::{DomainEvent, EventId};

/// FIFO ring holding the last N events published for one user.
///
/// Supports "all events with id > X" for reconnect replay. When X predates
/// the oldest retained id the ring reports a gap instead of a partial
/// replay, signalling the client that history was irrecoverably dropped.
pub struct RecentEventRing {
    events: VecDeque<Arc<DomainEvent>>,
    capacity: usize,
}

/// Result of a replay request.
pub struct Replay {
    pub events: Vec<Arc<DomainEvent>>,
    pub gap: bool,
}

impl RecentEventRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append the newest event, evicting the oldest when full.
    pub fn push(&mut self, event: Arc<DomainEvent>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Events with `id > last_id`, oldest first.
    ///
    /// A gap is reported when the ring can no longer prove continuity from
    /// `last_id`: either `last_id + 1` predates the oldest retained id, or
    /// the ring is empty (nothing was published for this user in this
    /// process, so an id carried over from a previous life cannot be
    /// validated). A gap replay carries no events.
    pub fn replay_after(&self, last_id: EventId) -> Replay {
        let Some(oldest) = self.events.front() else {
            return Replay {
                events: Vec::new(),
                gap: true,
            };
        };

        if last_id + 1 < oldest.id {
            return Replay {
                events: Vec::new(),
                gap: true,
            };
        }

        Replay {
            events: self
                .events
                .iter()
                .filter(|event| event.id > last_id)
                .cloned()
                .collect(),
            gap: false,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
