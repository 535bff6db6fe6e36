//! Telegram Bot API channel.
//!
//! Uses long polling via `getUpdates` and `sendMessage` for notifications.
//! Docs: <https://core.telegram.org/bots/api>
//!
//! The core only ever sees `{ chat_id, text }`: voice, photos, captions, and
//! group chatter are dropped here, before a message crosses the boundary.

mod polling;
pub(crate) mod send;
pub(crate) mod types;


use std::sync::Arc;
use tokio::sync::Mutex;
use vigia_core::config::TelegramConfig;

/// Telegram channel using the Bot API with long polling.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    base_url: String,
    /// Tracks the last update_id to avoid reprocessing.
    last_update_id: Arc<Mutex<Option<i64>>>,
}

impl TelegramChannel {
    /// Create a new Telegram channel from config.
    pub fn new(config: TelegramConfig) -> Self {
        let base_url = format!("https://api.telegram.org/bot{}", config.bot_token);
        Self {
            config,
            client: reqwest::Client::new(),
            base_url,
            last_update_id: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether the channel is enabled and has a bot token.
    pub fn is_configured(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty()
    }
}
