//! Realtime broker configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_RING_CAPACITY: usize = 50;
const DEFAULT_MAILBOX_CAPACITY: usize = 64;
const DEFAULT_MAX_DROPPED_EVENTS: u32 = 32;
const DEFAULT_HEARTBEAT_SECS: u64 = 20;

/// Broker and stream-session tunables from `folio.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Events retained per user for reconnect replay.
    pub ring_capacity: usize,
    /// Outbound events buffered per subscriber before drop-oldest kicks in.
    pub mailbox_capacity: usize,
    /// Dropped events tolerated before a slow subscriber is shed.
    pub max_dropped_events: u32,
    /// Ping interval keeping intermediary proxies from idling the stream out.
    pub heartbeat_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            max_dropped_events: DEFAULT_MAX_DROPPED_EVENTS,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }
}

impl RealtimeConfig {
    pub fn ring_capacity_clamped(&self) -> usize {
        self.ring_capacity.max(1)
    }

    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RealtimeConfig::default();
        assert_eq!(config.ring_capacity, 50);
        assert_eq!(config.mailbox_capacity, 64);
        assert_eq!(config.max_dropped_events, 32);
        assert_eq!(config.heartbeat(), Duration::from_secs(20));
    }

    #[test]
    fn zero_capacities_clamp_to_one() {
        let config = RealtimeConfig {
            ring_capacity: 0,
            mailbox_capacity: 0,
            heartbeat_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.ring_capacity_clamped(), 1);
        assert_eq!(config.mailbox_capacity_clamped(), 1);
        assert_eq!(config.heartbeat(), Duration::from_secs(1));
    }
}
