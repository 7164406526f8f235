//! HTTP handlers.
//!
//! - [`events`] — Slack Events API webhook
//! - [`health`] — liveness check

pub mod events;

/// Liveness check.
pub async fn health() -> &'static str {
    "ok"
}
