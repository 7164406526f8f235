//! poh Slack webhook server.
//!
//! Receives Slack Events API callbacks over HTTP and answers mentions of the
//! bot through `chat.postMessage`. The dispatch and reply logic lives in
//! `poh-core`; this crate supplies the HTTP transport, configuration, and
//! the Slack Web API client.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod slack_client;
pub mod state;
