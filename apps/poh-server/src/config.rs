//! Server configuration types and loading.
//!
//! [`ServerConfig`] is resolved once at startup from, lowest precedence
//! first: built-in defaults, an optional YAML file, then command-line flags
//! and environment variables ([`ConfigOverrides`]). The result is immutable
//! for the life of the process.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ServerError;

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Default bound on `chat.postMessage`, in seconds.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

/// Base URL for Slack Web API.
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

/// Top-level server configuration.
///
/// # Examples
///
/// ```
/// use poh_server::config::ServerConfig;
///
/// let yaml = r#"
/// slack:
///   bot_token: "xoxb-test"
///   verification_token: "verify-me"
/// listen_addr: "127.0.0.1:8080"
/// "#;
///
/// let config = ServerConfig::from_yaml_str(yaml).unwrap();
/// assert_eq!(config.slack.bot_token, "xoxb-test");
/// assert_eq!(config.send_timeout_secs, 10);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Slack credentials and API endpoint.
    pub slack: SlackConfig,

    /// Socket address the webhook server binds to.
    pub listen_addr: String,

    /// Upper bound on one outbound `chat.postMessage` call.
    pub send_timeout_secs: u64,
}

/// Slack credentials and API endpoint.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot User OAuth Token for Web API calls (`xoxb-...`).
    pub bot_token: String,

    /// Events API verification token compared against inbound envelopes.
    pub verification_token: String,

    /// Web API base URL; overridden in tests.
    pub api_base: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig::default(),
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            send_timeout_secs: DEFAULT_SEND_TIMEOUT_SECS,
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            verification_token: String::new(),
            api_base: DEFAULT_SLACK_API_BASE.into(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("slack", &self.slack)
            .field("listen_addr", &self.listen_addr)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("verification_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Values supplied on the command line or through the environment.
///
/// `None` leaves the file/default value in place.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    /// Replaces `slack.bot_token`.
    pub bot_token: Option<String>,
    /// Replaces `slack.verification_token`.
    pub verification_token: Option<String>,
    /// Replaces `slack.api_base`.
    pub api_base: Option<String>,
    /// Replaces `listen_addr`.
    pub listen_addr: Option<String>,
    /// Replaces `send_timeout_secs`.
    pub send_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Parses configuration from YAML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Yaml` if the text is not valid YAML for this
    /// schema.
    pub fn from_yaml_str(content: &str) -> Result<Self, ServerError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads configuration from the given YAML file path, without
    /// validating it.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the file cannot be read or contains
    /// invalid YAML.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        info!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("Cannot read config at {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content).map_err(|e| {
            ServerError::Config(format!("Invalid YAML in config at {}: {e}", path.display()))
        })
    }

    /// Resolves the effective configuration and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the file cannot be loaded or the
    /// merged values are invalid.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ServerError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Outbound send bound as a [`Duration`].
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(token) = overrides.bot_token {
            self.slack.bot_token = token;
        }
        if let Some(token) = overrides.verification_token {
            self.slack.verification_token = token;
        }
        if let Some(base) = overrides.api_base {
            self.slack.api_base = base;
        }
        if let Some(addr) = overrides.listen_addr {
            self.listen_addr = addr;
        }
        if let Some(secs) = overrides.send_timeout_secs {
            self.send_timeout_secs = secs;
        }
    }

    /// Validates that required fields are present and well-formed.
    fn validate(&self) -> Result<(), ServerError> {
        if self.slack.bot_token.is_empty() {
            return Err(ServerError::Config(
                "slack.bot_token must not be empty (set SLACK_BOT_TOKEN)".into(),
            ));
        }
        if !self.slack.bot_token.starts_with("xoxb-") {
            return Err(ServerError::Config(
                "slack.bot_token must start with 'xoxb-'".into(),
            ));
        }
        if self.slack.verification_token.is_empty() {
            return Err(ServerError::Config(
                "slack.verification_token must not be empty (set SLACK_VERIFICATION_TOKEN)".into(),
            ));
        }
        if self.slack.api_base.is_empty() {
            return Err(ServerError::Config(
                "slack.api_base must not be empty".into(),
            ));
        }
        if self.send_timeout_secs == 0 {
            return Err(ServerError::Config(
                "send_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            bot_token: Some("xoxb-test".into()),
            verification_token: Some("verify-me".into()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn test_should_deserialize_full_config() {
        let yaml = r#"
slack:
  bot_token: "xoxb-789-012"
  verification_token: "abc123"
  api_base: "http://localhost:9999/api"
listen_addr: "127.0.0.1:8080"
send_timeout_secs: 3
"#;
        let config = ServerConfig::from_yaml_str(yaml).expect("deserialize");
        assert_eq!(config.slack.bot_token, "xoxb-789-012");
        assert_eq!(config.slack.verification_token, "abc123");
        assert_eq!(config.slack.api_base, "http://localhost:9999/api");
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.send_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_should_fill_defaults_for_missing_keys() {
        let config = ServerConfig::from_yaml_str("slack:\n  bot_token: \"xoxb-test\"\n")
            .expect("deserialize");
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.send_timeout_secs, DEFAULT_SEND_TIMEOUT_SECS);
        assert_eq!(config.slack.api_base, DEFAULT_SLACK_API_BASE);
        assert!(config.slack.verification_token.is_empty());
    }

    #[test]
    fn test_should_resolve_from_overrides_alone() {
        let config = ServerConfig::resolve(None, valid_overrides()).expect("resolve");
        assert_eq!(config.slack.bot_token, "xoxb-test");
        assert_eq!(config.slack.verification_token, "verify-me");
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn test_should_let_overrides_win_over_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.yml");
        std::fs::write(
            &path,
            r#"
slack:
  bot_token: "xoxb-from-file"
  verification_token: "file-token"
listen_addr: "127.0.0.1:1111"
"#,
        )
        .expect("write config");

        let overrides = ConfigOverrides {
            verification_token: Some("env-token".into()),
            send_timeout_secs: Some(5),
            ..ConfigOverrides::default()
        };
        let config = ServerConfig::resolve(Some(&path), overrides).expect("resolve");
        assert_eq!(config.slack.bot_token, "xoxb-from-file");
        assert_eq!(config.slack.verification_token, "env-token");
        assert_eq!(config.listen_addr, "127.0.0.1:1111");
        assert_eq!(config.send_timeout_secs, 5);
    }

    #[test]
    fn test_should_reject_missing_bot_token() {
        let overrides = ConfigOverrides {
            bot_token: None,
            ..valid_overrides()
        };
        let err = ServerConfig::resolve(None, overrides).unwrap_err().to_string();
        assert!(err.contains("bot_token"));
    }

    #[test]
    fn test_should_reject_invalid_bot_token_prefix() {
        let overrides = ConfigOverrides {
            bot_token: Some("xapp-wrong".into()),
            ..valid_overrides()
        };
        let err = ServerConfig::resolve(None, overrides).unwrap_err().to_string();
        assert!(err.contains("xoxb-"));
    }

    #[test]
    fn test_should_reject_missing_verification_token() {
        let overrides = ConfigOverrides {
            verification_token: Some(String::new()),
            ..valid_overrides()
        };
        let err = ServerConfig::resolve(None, overrides).unwrap_err().to_string();
        assert!(err.contains("verification_token"));
    }

    #[test]
    fn test_should_reject_zero_timeout() {
        let overrides = ConfigOverrides {
            send_timeout_secs: Some(0),
            ..valid_overrides()
        };
        let err = ServerConfig::resolve(None, overrides).unwrap_err().to_string();
        assert!(err.contains("send_timeout_secs"));
    }

    #[test]
    fn test_should_error_on_missing_file() {
        let result = ServerConfig::load(Path::new("/nonexistent/config.yml"));
        assert!(result.unwrap_err().to_string().contains("Cannot read"));
    }

    #[test]
    fn test_should_error_on_invalid_yaml_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "slack: [unclosed").expect("write config");
        let err = ServerConfig::load(&path).unwrap_err().to_string();
        assert!(err.contains("Invalid YAML"));
    }

    #[test]
    fn test_should_redact_tokens_in_debug() {
        let config = ServerConfig::resolve(None, valid_overrides()).expect("resolve");
        let debug = format!("{config:?}");
        assert!(!debug.contains("xoxb-test"));
        assert!(!debug.contains("verify-me"));
        assert!(debug.contains("[REDACTED]"));
    }
}
