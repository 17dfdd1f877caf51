//! Per-user event broker.
//!
//! Keeps a registry entry per user: the recent-event ring plus the live
//! subscribers. Publishing appends to the ring under the user's entry lock
//! (sequence ids are claimed there, so ring order equals id order) and then
//! fans out to each active subscriber's mailbox without ever blocking on a
//! slow consumer.
//!
//! Backpressure: a full mailbox drops its oldest undelivered item. A
//! subscriber that keeps dropping past `max_dropped_events` is degraded and
//! shed; other subscribers and publishers never notice.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use metrics::{counter, gauge};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Notify;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::types::EventType;

use super::config::RealtimeConfig;
use super::event::{DomainEvent, EventId, StreamItem};
use super::ring::RecentEventRing;

const METRIC_EVENTS_PUBLISHED: &str = "folio_events_published_total";
const METRIC_EVENTS_DROPPED: &str = "folio_events_dropped_total";
const METRIC_STREAM_SUBSCRIBERS: &str = "folio_stream_subscribers";
const METRIC_REPLAY_GAPS: &str = "folio_replay_gap_total";

const STATE_CONNECTING: u8 = 0;
const STATE_ACTIVE: u8 = 1;
const STATE_CLOSED: u8 = 2;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("event broker is shut down")]
    ShutDown,
}

fn mailbox_lock<'a>(
    mailbox: &'a Mutex<VecDeque<StreamItem>>,
) -> MutexGuard<'a, VecDeque<StreamItem>> {
    match mailbox.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("subscriber mailbox lock poisoned; continuing with recovered guard");
            poisoned.into_inner()
        }
    }
}

struct Subscriber {
    connection_id: Uuid,
    user_id: Uuid,
    interests: HashSet<EventType>,
    state: AtomicU8,
    dropped: AtomicU32,
    mailbox: Mutex<VecDeque<StreamItem>>,
    notify: Notify,
}

impl Subscriber {
    fn new(user_id: Uuid, interests: HashSet<EventType>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            user_id,
            interests,
            state: AtomicU8::new(STATE_CONNECTING),
            dropped: AtomicU32::new(0),
            mailbox: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    fn is_active(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_ACTIVE
    }

    fn is_closed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_CLOSED
    }

    fn close(&self) {
        self.state.store(STATE_CLOSED, Ordering::SeqCst);
        // A permit is stored if the consumer is not currently waiting, so
        // the close cannot be lost between its queue check and the await.
        self.notify.notify_one();
    }

    /// Push onto the mailbox, dropping the oldest item when full.
    /// Returns true if an item was dropped.
    fn offer(&self, item: StreamItem, capacity: usize) -> bool {
        let mut mailbox = mailbox_lock(&self.mailbox);
        let dropped = if mailbox.len() >= capacity {
            mailbox.pop_front();
            true
        } else {
            false
        };
        mailbox.push_back(item);
        drop(mailbox);
        self.notify.notify_one();
        dropped
    }

    /// Live delivery with degradation accounting.
    fn deliver(&self, item: StreamItem, capacity: usize, max_dropped: u32) {
        if !self.is_active() {
            return;
        }
        if self.offer(item, capacity) {
            counter!(METRIC_EVENTS_DROPPED).increment(1);
            let dropped = self.dropped.fetch_add(1, Ordering::SeqCst) + 1;
            if dropped >= max_dropped {
                warn!(
                    connection_id = %self.connection_id,
                    user_id = %self.user_id,
                    dropped,
                    "subscriber degraded beyond threshold; shedding"
                );
                self.close();
            }
        }
    }

    /// Non-blocking pull.
    fn try_next(&self) -> Option<StreamItem> {
        mailbox_lock(&self.mailbox).pop_front()
    }

    /// Pull the next item, waiting for delivery. Returns `None` once the
    /// subscription is closed and the mailbox is drained.
    async fn next(&self) -> Option<StreamItem> {
        loop {
            {
                let mut mailbox = mailbox_lock(&self.mailbox);
                if let Some(item) = mailbox.pop_front() {
                    return Some(item);
                }
                if self.is_closed() {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }
}

struct UserEntry {
    ring: RecentEventRing,
    subscribers: Vec<Arc<Subscriber>>,
}

impl UserEntry {
    fn new(ring_capacity: usize) -> Self {
        Self {
            ring: RecentEventRing::new(ring_capacity),
            subscribers: Vec::new(),
        }
    }
}

/// Process-wide event broker. Built once at startup and injected into
/// request handlers; `shutdown` closes every live subscription.
pub struct EventBroker {
    users: DashMap<Uuid, UserEntry>,
    connections: DashMap<Uuid, Uuid>,
    sequence: AtomicU64,
    config: RealtimeConfig,
    shutting_down: AtomicBool,
}

impl EventBroker {
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            users: DashMap::new(),
            connections: DashMap::new(),
            sequence: AtomicU64::new(0),
            config,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Register a subscriber for one streaming connection.
    ///
    /// When `last_event_id` is supplied, the buffered events newer than it
    /// are replayed into the mailbox before live delivery starts; if the
    /// ring evicted that id a single replay-gap item is queued instead.
    /// Type filtering applies to replayed events only after gap detection.
    pub fn subscribe(
        self: &Arc<Self>,
        user_id: Uuid,
        interests: HashSet<EventType>,
        last_event_id: Option<EventId>,
    ) -> SubscriptionHandle {
        let subscriber = Arc::new(Subscriber::new(user_id, interests));

        if self.shutting_down.load(Ordering::SeqCst) {
            subscriber.close();
            return SubscriptionHandle {
                subscriber,
                broker: self.clone(),
            };
        }

        let capacity = self.config.mailbox_capacity_clamped();
        {
            let mut entry = self
                .users
                .entry(user_id)
                .or_insert_with(|| UserEntry::new(self.config.ring_capacity_clamped()));

            if let Some(last_id) = last_event_id {
                let replay = entry.ring.replay_after(last_id);
                if replay.gap {
                    counter!(METRIC_REPLAY_GAPS).increment(1);
                    debug!(
                        connection_id = %subscriber.connection_id,
                        user_id = %user_id,
                        last_event_id = last_id,
                        "replay window exceeded; signalling gap"
                    );
                    subscriber.offer(StreamItem::ReplayGap, capacity);
                } else {
                    for event in replay.events {
                        if event.matches(&subscriber.interests) {
                            subscriber.offer(StreamItem::Event(event), capacity);
                        }
                    }
                }
            }

            subscriber.state.store(STATE_ACTIVE, Ordering::SeqCst);
            entry.subscribers.push(subscriber.clone());
        }

        self.connections
            .insert(subscriber.connection_id, user_id);
        gauge!(METRIC_STREAM_SUBSCRIBERS).increment(1.0);
        debug!(
            connection_id = %subscriber.connection_id,
            user_id = %user_id,
            "subscriber registered"
        );

        SubscriptionHandle {
            subscriber,
            broker: self.clone(),
        }
    }

    /// Publish a domain event to one user.
    ///
    /// Appends to the user's ring and fans out to every active, interested
    /// subscriber. Delivery is an enqueue, never a wait: a slow or dead
    /// subscriber cannot fail or block the publishing request.
    pub fn publish(
        &self,
        user_id: Uuid,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> Result<DomainEvent, BrokerError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(BrokerError::ShutDown);
        }

        let mut entry = self
            .users
            .entry(user_id)
            .or_insert_with(|| UserEntry::new(self.config.ring_capacity_clamped()));

        // Claimed while holding the entry, so ids are strictly increasing in
        // ring order for this user.
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = Arc::new(DomainEvent {
            id,
            user_id,
            event_type,
            payload,
            created_at: OffsetDateTime::now_utc(),
        });
        entry.ring.push(event.clone());

        let capacity = self.config.mailbox_capacity_clamped();
        let max_dropped = self.config.max_dropped_events;
        let mut shed = false;
        for subscriber in &entry.subscribers {
            if !event.matches(&subscriber.interests) {
                continue;
            }
            subscriber.deliver(StreamItem::Event(event.clone()), capacity, max_dropped);
            shed |= subscriber.is_closed();
        }
        if shed {
            entry.subscribers.retain(|s| !s.is_closed());
        }

        counter!(METRIC_EVENTS_PUBLISHED).increment(1);
        Ok((*event).clone())
    }

    /// Remove a subscriber. Idempotent; safe to call for unknown ids.
    pub fn unsubscribe(&self, connection_id: Uuid) {
        let Some((_, user_id)) = self.connections.remove(&connection_id) else {
            return;
        };
        gauge!(METRIC_STREAM_SUBSCRIBERS).decrement(1.0);

        if let Some(mut entry) = self.users.get_mut(&user_id) {
            if let Some(position) = entry
                .subscribers
                .iter()
                .position(|s| s.connection_id == connection_id)
            {
                let subscriber = entry.subscribers.remove(position);
                subscriber.close();
            }
        }
        debug!(%connection_id, %user_id, "subscriber removed");
    }

    /// Close every live subscription and refuse further publishes.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        for mut entry in self.users.iter_mut() {
            for subscriber in entry.subscribers.drain(..) {
                subscriber.close();
            }
        }
    }

    /// Live subscriber count for one user.
    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        self.users
            .get(&user_id)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }

    /// How many events the replay ring currently retains for one user.
    pub fn buffered_event_count(&self, user_id: Uuid) -> usize {
        self.users
            .get(&user_id)
            .map(|entry| entry.ring.len())
            .unwrap_or(0)
    }
}

/// One subscription, owned by its stream session. Dropping the handle
/// unsubscribes, so a disconnected client can never leave an orphaned
/// registry entry behind.
pub struct SubscriptionHandle {
    subscriber: Arc<Subscriber>,
    broker: Arc<EventBroker>,
}

impl SubscriptionHandle {
    pub fn connection_id(&self) -> Uuid {
        self.subscriber.connection_id
    }

    pub fn user_id(&self) -> Uuid {
        self.subscriber.user_id
    }

    /// Wait for the next item; `None` means the subscription closed.
    pub async fn recv(&self) -> Option<StreamItem> {
        self.subscriber.next().await
    }

    /// Non-blocking pull, primarily for tests.
    pub fn try_recv(&self) -> Option<StreamItem> {
        self.subscriber.try_next()
    }

    pub fn is_closed(&self) -> bool {
        self.subscriber.is_closed()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.broker.unsubscribe(self.subscriber.connection_id);
    }
}
