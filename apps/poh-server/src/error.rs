//! Error types for the poh-server application.
//!
//! Defines [`ServerError`] for startup and Slack API failures. Per-request
//! failures never surface here; the dispatcher turns them into 502
//! responses.

use thiserror::Error;

/// Error type for poh-server operations.
///
/// # Examples
///
/// ```
/// use poh_server::error::ServerError;
///
/// let err = ServerError::Config("missing bot_token".into());
/// assert!(err.to_string().contains("missing bot_token"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// A configuration error (missing or invalid config file/values).
    #[error("Config error: {0}")]
    Config(String),

    /// An error from a Slack Web API call.
    #[error("Slack API error: {0}")]
    SlackApi(String),

    /// An I/O error (config file access, socket binding).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
