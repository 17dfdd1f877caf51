//! Folio: a self-hosted learning-portfolio server.
//!
//! Users track portfolio items, skills, roadmaps, notifications, and an
//! activity feed. Two subsystems carry most of the engineering weight:
//!
//! - [`realtime`]: a per-user publish/subscribe broker that fans domain
//!   events out to live SSE connections, with bounded replay on reconnect.
//! - [`cache`]: a TTL response cache with pattern invalidation, kept
//!   consistent with the broker by the fixed write-path sequence in
//!   [`application::effects`] (persist, invalidate, publish).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod realtime;
