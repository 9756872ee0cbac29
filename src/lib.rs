//! Polls the Practicum homework API and relays review status changes to a Telegram chat.

pub mod config;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod practicum;
pub mod status;
