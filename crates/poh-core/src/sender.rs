//! Outbound messaging boundary.
//!
//! The dispatcher posts replies through [`MessageSender`]; the production
//! implementation is the Slack Web API client in `poh-server`.

use async_trait::async_trait;

use crate::error::SendError;

/// A message accepted by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    /// Channel the message landed in.
    pub channel: String,

    /// Platform timestamp identifying the message.
    pub ts: String,
}

/// Posts plain-text messages to a channel.
///
/// Implementations must be `Send + Sync` so one sender can serve concurrent
/// webhook invocations.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Posts `text` to `channel`.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] carrying whatever channel/timestamp
    /// diagnostics the platform returned.
    async fn send(&self, channel: &str, text: &str) -> Result<PostedMessage, SendError>;
}
