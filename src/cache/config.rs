//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use super::keys::Namespace;

const DEFAULT_MAX_ENTRIES: usize = 2048;
const DEFAULT_TTL_PORTFOLIO_SECS: u64 = 300;
const DEFAULT_TTL_SKILLS_SECS: u64 = 60;
const DEFAULT_TTL_ROADMAPS_SECS: u64 = 300;
const DEFAULT_TTL_NOTIFICATIONS_SECS: u64 = 30;
const DEFAULT_TTL_ACTIVITIES_SECS: u64 = 30;

/// Cache tunables from `folio.toml`.
///
/// TTLs are whole seconds, chosen per entity kind: short for kinds that
/// mutate often (notifications, activities), longer for slow-moving detail
/// (portfolio items, roadmaps).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Master switch; when off every read goes straight to the datastore.
    pub enabled: bool,
    /// Maximum live entries before LRU eviction kicks in.
    pub max_entries: usize,
    pub ttl_portfolio_secs: u64,
    pub ttl_skills_secs: u64,
    pub ttl_roadmaps_secs: u64,
    pub ttl_notifications_secs: u64,
    pub ttl_activities_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl_portfolio_secs: DEFAULT_TTL_PORTFOLIO_SECS,
            ttl_skills_secs: DEFAULT_TTL_SKILLS_SECS,
            ttl_roadmaps_secs: DEFAULT_TTL_ROADMAPS_SECS,
            ttl_notifications_secs: DEFAULT_TTL_NOTIFICATIONS_SECS,
            ttl_activities_secs: DEFAULT_TTL_ACTIVITIES_SECS,
        }
    }
}

impl CacheConfig {
    /// Entry limit as `NonZeroUsize`, clamping to 1 if configured as zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }

    /// TTL for a given entity namespace.
    pub fn ttl_for(&self, namespace: Namespace) -> Duration {
        let secs = match namespace {
            Namespace::Portfolio => self.ttl_portfolio_secs,
            Namespace::Skills => self.ttl_skills_secs,
            Namespace::Roadmaps => self.ttl_roadmaps_secs,
            Namespace::Notifications => self.ttl_notifications_secs,
            Namespace::Activities => self.ttl_activities_secs,
        };
        Duration::from_secs(secs)
    }
}
