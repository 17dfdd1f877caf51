//! Folio realtime layer.
//!
//! An in-memory, per-user publish/subscribe broker that fans domain events
//! out to live SSE connections. Each user keeps a bounded ring of recent
//! events so a reconnecting client can replay what it missed; a client whose
//! requested history was evicted gets a replay-gap signal and refetches.
//!
//! The broker is per-process. Running more than one server instance requires
//! an external pub/sub backend in front of this module; that is deliberately
//! out of scope for now.

mod broker;
mod config;
mod event;
mod ring;
mod session;

pub use broker::{BrokerError, EventBroker, SubscriptionHandle};
pub use config::RealtimeConfig;
pub use event::{DomainEvent, EventId, StreamItem};
pub use session::{StreamSession, sse_response_headers};
