//! CLI argument parsing.
//!
//! Every flag also reads from an environment variable, so the server can be
//! configured entirely through the environment.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigOverrides;

/// poh - Slack mention-reply webhook server
#[derive(Parser)]
#[command(name = "poh-server")]
#[command(author, version, about = "poh - Slack mention-reply webhook server")]
pub struct Cli {
    /// Optional YAML config file; flags and environment override its values.
    #[arg(long, env = "POH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bot User OAuth Token (`xoxb-...`).
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Events API verification token.
    #[arg(long, env = "SLACK_VERIFICATION_TOKEN", hide_env_values = true)]
    pub verification_token: Option<String>,

    /// Slack Web API base URL.
    #[arg(long, env = "SLACK_API_BASE")]
    pub slack_api_base: Option<String>,

    /// Address to listen on (default 0.0.0.0:3000).
    #[arg(long, env = "POH_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Timeout for posting a reply, in seconds (default 10).
    #[arg(long, env = "POH_SEND_TIMEOUT_SECS")]
    pub send_timeout_secs: Option<u64>,

    /// Skip the `auth.test` token check at startup.
    #[arg(long, env = "POH_SKIP_AUTH_CHECK")]
    pub skip_auth_check: bool,
}

impl Cli {
    /// Values that override the config file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bot_token: self.bot_token.clone(),
            verification_token: self.verification_token.clone(),
            api_base: self.slack_api_base.clone(),
            listen_addr: self.listen_addr.clone(),
            send_timeout_secs: self.send_timeout_secs,
        }
    }
}
