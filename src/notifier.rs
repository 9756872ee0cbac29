use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use teloxide::prelude::*;
use teloxide::types::Recipient;

/// "Send text to the configured chat". Failures are reported, never retried here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat: Recipient,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
            chat: parse_recipient(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.chat.clone(), text)
            .await
            .context("failed to send telegram message")?;
        Ok(())
    }
}

/// Numeric ids address a chat directly, anything else is treated as `@channel`.
pub fn parse_recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if chat_id.starts_with('@') => Recipient::ChannelUsername(chat_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{chat_id}")),
    }
}
