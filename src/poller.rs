use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::config::{Config, Credentials};
use crate::error::PollError;
use crate::notifier::{Notifier, TelegramNotifier};
use crate::practicum::{check_response, PracticumClient};
use crate::status::parse_status;

/// What a single cycle ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The API reported no changed homework.
    NoNewStatuses,
    /// A status message was rendered. `notified` is false when it repeated the last one.
    StatusChanged { notified: bool },
    /// The cycle failed and a failure message was rendered instead.
    Failed { notified: bool },
}

/// Owns the poll cursor and the dedup state; one instance per process.
pub struct Poller {
    api: PracticumClient,
    notifier: Box<dyn Notifier>,
    retry_interval: Duration,
    cursor: i64,
    last_message: String,
}

impl Poller {
    pub fn new(api: PracticumClient, notifier: Box<dyn Notifier>, retry_interval: Duration) -> Self {
        Self {
            api,
            notifier,
            retry_interval,
            cursor: Utc::now().timestamp(),
            last_message: String::new(),
        }
    }

    /// Check credentials, then build the API client and the Telegram notifier.
    ///
    /// Returns `Ok(None)` when a credential is missing; nothing network-facing
    /// is constructed in that case.
    pub fn prepare<F>(cfg: &Config, lookup: F) -> anyhow::Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let creds = match Credentials::from_lookup(lookup) {
            Ok(creds) => creds,
            Err(err) => {
                error!(%err, "required credentials are missing, exiting");
                return Ok(None);
            }
        };

        let api = PracticumClient::from_settings(creds.practicum_token, &cfg.practicum)?;
        let notifier = TelegramNotifier::new(creds.telegram_token, &creds.telegram_chat_id);
        Ok(Some(Self::new(
            api,
            Box::new(notifier),
            cfg.retry_interval(),
        )))
    }

    /// Start from an explicit cursor instead of "now".
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    /// Fetch, validate and render the newest status, if any.
    pub async fn check_status(&self) -> Result<Option<String>, PollError> {
        let response = self.api.get_api_answer(self.cursor).await?;
        let answer = check_response(response)?;
        match answer.homeworks.first() {
            Some(homework) => parse_status(homework).map(Some),
            None => Ok(None),
        }
    }

    /// One poll-and-notify cycle. Never fails: errors become failure notifications.
    #[instrument(skip_all, fields(cursor = self.cursor))]
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        match self.check_status().await {
            Ok(Some(message)) => {
                let notified = self.notify(message).await;
                self.advance_cursor();
                CycleOutcome::StatusChanged { notified }
            }
            Ok(None) => {
                debug!(
                    retry_secs = self.retry_interval.as_secs(),
                    "no new statuses, retrying later"
                );
                self.advance_cursor();
                CycleOutcome::NoNewStatuses
            }
            Err(err) => {
                let message = format!("Сбой в работе программы: {err}");
                error!(kind = err.kind(), "{message}");
                let notified = self.notify(message).await;
                CycleOutcome::Failed { notified }
            }
        }
    }

    /// Poll forever at a fixed interval; returns only when Ctrl-C arrives.
    pub async fn run(&mut self) {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Poll at a fixed interval until `shutdown` completes. The shutdown
    /// future is raced against both the request and the sleep, so it is
    /// observed even while a request is in flight.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) {
        info!(
            endpoint = %self.api.endpoint(),
            retry_secs = self.retry_interval.as_secs(),
            "starting homework status polling"
        );
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = &mut shutdown => {
                    info!("interrupted during request, stopping");
                    return;
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.retry_interval) => {
                    debug!("sending repeated request after timeout");
                }
                _ = &mut shutdown => {
                    info!("interrupted, stopping");
                    return;
                }
            }
        }
    }

    /// Send `message` unless it equals the previous one. Returns whether the
    /// transport was called. A failed send still counts as the last message.
    async fn notify(&mut self, message: String) -> bool {
        if message == self.last_message {
            debug!("message unchanged, not sending");
            return false;
        }
        match self.notifier.send(&message).await {
            Ok(()) => info!("message sent"),
            Err(err) => error!(?err, "failed to send message to chat"),
        }
        self.last_message = message;
        true
    }

    fn advance_cursor(&mut self) {
        self.cursor = self.cursor.max(Utc::now().timestamp());
    }
}
