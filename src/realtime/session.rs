//! Stream sessions: one broker subscription bridged onto one SSE response.
//!
//! The session pulls from the subscription mailbox and frames each item as
//! an SSE event (id + type label + JSON data), interleaving ping comments on
//! the heartbeat interval. When the client disconnects axum drops the stream,
//! which drops the subscription handle, which unsubscribes. Transport failure
//! and heartbeat-write failure both resolve through that single path.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::response::sse::{Event, Sse};
use futures::Stream;
use tokio::time::MissedTickBehavior;

use super::broker::SubscriptionHandle;
use super::event::StreamItem;

/// Headers every stream response carries: intermediaries must not buffer or
/// cache the long-lived body.
pub fn sse_response_headers() -> [(&'static str, &'static str); 2] {
    [("cache-control", "no-cache"), ("x-accel-buffering", "no")]
}

/// A live stream session. Consumes the subscription handle; once the
/// returned stream ends the connection cannot be restarted, only reopened
/// through a fresh subscribe.
pub struct StreamSession {
    handle: SubscriptionHandle,
    heartbeat: Duration,
}

impl StreamSession {
    pub fn new(handle: SubscriptionHandle, heartbeat: Duration) -> Self {
        Self { handle, heartbeat }
    }

    /// Turn the session into an SSE response body.
    pub fn into_sse(self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        Sse::new(self.into_stream())
    }

    /// The framed event stream itself, without the response wrapper.
    pub fn into_stream(self) -> impl Stream<Item = Result<Event, Infallible>> {
        let StreamSession { handle, heartbeat } = self;
        stream! {
            let mut ticker = tokio::time::interval(heartbeat);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; consume it so the first
            // ping waits a full interval.
            ticker.tick().await;

            loop {
                tokio::select! {
                    item = handle.recv() => match item {
                        Some(item) => yield Ok(frame(&item)),
                        None => break,
                    },
                    _ = ticker.tick() => yield Ok(Event::default().comment("ping")),
                }
            }
        }
    }
}

fn frame(item: &StreamItem) -> Event {
    match item {
        StreamItem::Event(event) => Event::default()
            .id(event.id.to_string())
            .event(event.event_type.as_str())
            .data(event.payload.to_string()),
        StreamItem::ReplayGap => Event::default()
            .event("replay-gap")
            .data(r#"{"resync":true}"#),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use futures::StreamExt;
    use serde_json::json;
    use uuid::Uuid;

    use crate::domain::types::EventType;
    use crate::realtime::broker::EventBroker;
    use crate::realtime::config::RealtimeConfig;

    use super::*;

    fn broker() -> Arc<EventBroker> {
        Arc::new(EventBroker::new(RealtimeConfig::default()))
    }

    fn render(event: Event) -> String {
        // The axum Event Debug output contains the framed fields; good
        // enough to assert on without a full HTTP round trip.
        format!("{event:?}")
    }

    #[tokio::test]
    async fn events_are_framed_with_id_and_type() {
        let broker = broker();
        let user = Uuid::new_v4();
        let handle = broker.subscribe(user, HashSet::new(), None);
        broker
            .publish(user, EventType::SkillProgress, json!({"progress": 40}))
            .unwrap();

        let session = StreamSession::new(handle, Duration::from_secs(60));
        let mut stream = Box::pin(session.into_stream());

        let first = stream.next().await.unwrap().unwrap();
        let rendered = render(first);
        assert!(rendered.contains("skill-progress"));
        assert!(rendered.contains("progress"));
    }

    #[tokio::test]
    async fn gap_item_is_framed_as_replay_gap() {
        let broker = broker();
        let user = Uuid::new_v4();
        // Nothing published, but the client claims to have seen id 9.
        let handle = broker.subscribe(user, HashSet::new(), Some(9));

        let session = StreamSession::new(handle, Duration::from_secs(60));
        let mut stream = Box::pin(session.into_stream());

        let first = stream.next().await.unwrap().unwrap();
        assert!(render(first).contains("replay-gap"));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_emits_heartbeats() {
        let broker = broker();
        let user = Uuid::new_v4();
        let handle = broker.subscribe(user, HashSet::new(), None);

        let session = StreamSession::new(handle, Duration::from_secs(20));
        let mut stream = Box::pin(session.into_stream());

        // With the clock paused, the only way this resolves is the ticker.
        let first = stream.next().await.unwrap().unwrap();
        assert!(render(first).contains("ping"));
    }

    #[tokio::test]
    async fn stream_ends_when_broker_shuts_down() {
        let broker = broker();
        let user = Uuid::new_v4();
        let handle = broker.subscribe(user, HashSet::new(), None);

        let session = StreamSession::new(handle, Duration::from_secs(60));
        let mut stream = Box::pin(session.into_stream());

        broker.shutdown();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_stream_releases_subscription() {
        let broker = broker();
        let user = Uuid::new_v4();
        let handle = broker.subscribe(user, HashSet::new(), None);
        let session = StreamSession::new(handle, Duration::from_secs(60));
        let stream = session.into_stream();
        assert_eq!(broker.subscriber_count(user), 1);

        drop(stream);
        assert_eq!(broker.subscriber_count(user), 0);
    }
}
