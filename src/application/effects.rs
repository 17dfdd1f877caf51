//! Write-path side effects.
//!
//! Every mutating operation runs the same fixed sequence: the datastore
//! write happens first (in the service; a failure there aborts the request
//! before this module is reached), then cache invalidation, then the event
//! publish. Invalidation before publish guarantees a subscriber reacting to
//! the event and re-reading immediately gets fresh data instead of a cache
//! entry populated before the write.
//!
//! Both effects are best-effort: their results are consumed here, logged,
//! and never propagated. A cache or broker hiccup must not fail a request
//! whose write already committed.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{CacheStore, Namespace, entity_key, list_pattern};
use crate::domain::types::{ChangeAction, EventType};
use crate::realtime::EventBroker;

#[derive(Clone)]
pub struct WriteEffects {
    cache: Arc<CacheStore>,
    broker: Arc<EventBroker>,
}

impl WriteEffects {
    pub fn new(cache: Arc<CacheStore>, broker: Arc<EventBroker>) -> Self {
        Self { cache, broker }
    }

    /// Apply steps two and three of the write path for a committed change.
    ///
    /// Invalidates the entity's canonical key and the owner's list keys in
    /// `namespace`, then publishes `event_type` with `payload` to the owner's
    /// live subscribers.
    pub fn entity_changed(
        &self,
        namespace: Namespace,
        owner_id: Uuid,
        entity_id: Uuid,
        event_type: EventType,
        payload: serde_json::Value,
    ) {
        self.cache.delete(&entity_key(namespace, owner_id, entity_id));
        match self.cache.delete_pattern(&list_pattern(namespace, owner_id)) {
            Ok(removed) => {
                debug!(
                    namespace = namespace.as_str(),
                    %owner_id,
                    removed,
                    "invalidated list cache after write"
                );
            }
            Err(err) => {
                warn!(
                    namespace = namespace.as_str(),
                    %owner_id,
                    error = %err,
                    "cache invalidation failed after committed write; continuing"
                );
            }
        }

        if let Err(err) = self.broker.publish(owner_id, event_type, payload) {
            warn!(
                %owner_id,
                event_type = event_type.as_str(),
                error = %err,
                "event publish failed after committed write; continuing"
            );
        }
    }
}

/// Standard event payload shape: enough context for the UI to react without
/// refetching (entity id, a human-readable label, the mutation verb).
pub fn change_payload(entity_id: Uuid, title: &str, action: ChangeAction) -> serde_json::Value {
    json!({
        "id": entity_id,
        "title": title,
        "action": action.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use bytes::Bytes;

    use crate::cache::{CacheConfig, list_key};
    use crate::realtime::{RealtimeConfig, StreamItem};

    use super::*;

    fn effects() -> (Arc<CacheStore>, Arc<EventBroker>, WriteEffects) {
        let cache = Arc::new(CacheStore::new(&CacheConfig::default()));
        let broker = Arc::new(EventBroker::new(RealtimeConfig::default()));
        let effects = WriteEffects::new(cache.clone(), broker.clone());
        (cache, broker, effects)
    }

    #[tokio::test]
    async fn change_invalidates_entity_and_list_keys() {
        let (cache, _, effects) = effects();
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();

        cache.set(
            entity_key(Namespace::Portfolio, owner, id),
            Bytes::from_static(b"{}"),
            Duration::from_secs(300),
        );
        cache.set(
            list_key(Namespace::Portfolio, owner, 1),
            Bytes::from_static(b"[]"),
            Duration::from_secs(300),
        );
        cache.set(
            list_key(Namespace::Portfolio, owner, 2),
            Bytes::from_static(b"[]"),
            Duration::from_secs(300),
        );

        effects.entity_changed(
            Namespace::Portfolio,
            owner,
            id,
            EventType::PortfolioUpdate,
            change_payload(id, "My project", ChangeAction::Updated),
        );

        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn change_publishes_exactly_one_event() {
        let (_, broker, effects) = effects();
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();
        let handle = broker.subscribe(owner, HashSet::new(), None);

        effects.entity_changed(
            Namespace::Portfolio,
            owner,
            id,
            EventType::PortfolioUpdate,
            change_payload(id, "My project", ChangeAction::Created),
        );

        match handle.try_recv() {
            Some(StreamItem::Event(event)) => {
                assert_eq!(event.event_type, EventType::PortfolioUpdate);
                assert_eq!(event.payload["id"], serde_json::json!(id));
                assert_eq!(event.payload["action"], "created");
            }
            other => panic!("expected one event, got {other:?}"),
        }
        assert!(handle.try_recv().is_none());
    }

    #[tokio::test]
    async fn other_namespaces_are_untouched() {
        let (cache, _, effects) = effects();
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();

        cache.set(
            list_key(Namespace::Skills, owner, 1),
            Bytes::from_static(b"[]"),
            Duration::from_secs(60),
        );

        effects.entity_changed(
            Namespace::Portfolio,
            owner,
            id,
            EventType::PortfolioUpdate,
            change_payload(id, "x", ChangeAction::Deleted),
        );

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn broker_shutdown_does_not_propagate() {
        let (cache, broker, effects) = effects();
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();
        broker.shutdown();

        cache.set(
            list_key(Namespace::Activities, owner, 1),
            Bytes::from_static(b"[]"),
            Duration::from_secs(60),
        );

        // Publish fails internally; the write path carries on regardless.
        effects.entity_changed(
            Namespace::Activities,
            owner,
            id,
            EventType::Activity,
            change_payload(id, "x", ChangeAction::Created),
        );
        assert!(cache.is_empty());
    }
}
