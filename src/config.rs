//! Runtime configuration loaded from the environment.
//!
//! All settings come from environment variables (a `.env` file is loaded
//! first by `main`). Secrets stay wrapped in [`SecretString`] so they never
//! end up in debug output.

use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;

/// Command-line and environment configuration for the bot process.
#[derive(Debug, Parser)]
#[command(name = "crosspost", about = "Telegram repost moderation bot")]
pub struct Config {
    /// Telegram Bot API token.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: SecretString,

    /// API key for the chat completions provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: SecretString,

    /// Base URL of the OpenAI-compatible completions API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com")]
    pub openai_base_url: String,

    /// Model used for the assistant screen.
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4-1106-preview")]
    pub openai_model: String,

    /// Seconds between delivery loop passes.
    #[arg(long, env = "DELIVERY_SCAN_SECS", default_value_t = 10)]
    pub delivery_scan_secs: u64,

    /// Seconds between consecutive moderated previews within one pass.
    #[arg(long, env = "DELIVERY_PACE_SECS", default_value_t = 5)]
    pub delivery_pace_secs: u64,
}

impl Config {
    /// Delivery loop pacing as a [`DeliveryConfig`](crate::engine::DeliveryConfig) source.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.delivery_scan_secs)
    }

    /// Inter-post delay on the moderated path.
    pub fn pace_interval(&self) -> Duration {
        Duration::from_secs(self.delivery_pace_secs)
    }
}
