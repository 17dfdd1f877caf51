//! Cache key derivation.
//!
//! Keys are ordered segments joined by `:`, following the
//! `entity-kind:owner-id:logical-query-or-id` convention. Segments are
//! percent-escaped so a segment containing the delimiter can never collide
//! with a differently-shaped key.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

pub(crate) const DELIMITER: char = ':';

/// Entity-kind namespaces this process caches. Each namespace maps to one
/// owner-scoped key family and one TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Portfolio,
    Skills,
    Roadmaps,
    Notifications,
    Activities,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Portfolio,
        Namespace::Skills,
        Namespace::Roadmaps,
        Namespace::Notifications,
        Namespace::Activities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Portfolio => "portfolio",
            Namespace::Skills => "skills",
            Namespace::Roadmaps => "roadmaps",
            Namespace::Notifications => "notifications",
            Namespace::Activities => "activities",
        }
    }
}

fn escape(segment: &str) -> String {
    // '%' first so escaped delimiters are not double-unescapable.
    segment.replace('%', "%25").replace(DELIMITER, "%3a")
}

/// Join key segments with the reserved delimiter, escaping as needed.
pub fn join_segments(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| escape(s))
        .collect::<Vec<_>>()
        .join(":")
}

/// Canonical key for a single entity: `kind:owner:id`.
pub fn entity_key(namespace: Namespace, owner: Uuid, id: Uuid) -> String {
    join_segments(&[namespace.as_str(), &owner.to_string(), &id.to_string()])
}

/// Key for an owner-scoped list read: `kind:owner:list:query-hash`.
pub fn list_key(namespace: Namespace, owner: Uuid, query_hash: u64) -> String {
    join_segments(&[
        namespace.as_str(),
        &owner.to_string(),
        "list",
        &format!("{query_hash:016x}"),
    ])
}

/// Trailing-wildcard pattern covering every list key for an owner.
pub fn list_pattern(namespace: Namespace, owner: Uuid) -> String {
    format!(
        "{}*",
        join_segments(&[namespace.as_str(), &owner.to_string(), "list", ""])
    )
}

/// Trailing-wildcard pattern covering an owner's whole namespace.
pub fn namespace_pattern(namespace: Namespace, owner: Uuid) -> String {
    format!(
        "{}*",
        join_segments(&[namespace.as_str(), &owner.to_string(), ""])
    )
}

/// Hash the canonical form of a logical query.
///
/// Object keys are sorted recursively before hashing so semantically
/// identical queries always land on the same cache key regardless of the
/// field order the caller serialized them in.
pub fn hash_query(query: &serde_json::Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    canonical_string(query).hash(&mut hasher);
    hasher.finish()
}

fn canonical_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<&String, String> = map
                .iter()
                .map(|(k, v)| (k, canonical_string(v)))
                .collect();
            let inner = sorted
                .iter()
                .map(|(k, v)| format!("{k:?}:{v}"))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{inner}}}")
        }
        serde_json::Value::Array(items) => {
            let inner = items
                .iter()
                .map(canonical_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("[{inner}]")
        }
        other => other.to_string(),
    }
}
