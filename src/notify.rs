//! One notification per run outcome. Delivery failures are logged and
//! swallowed: a lost message must never turn a successful check-in into
//! a failed run.

use crate::config::NotifyConfig;
use crate::constants::TELEGRAM_API_BASE;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, message: &str);
}

/// Telegram Bot API delivery.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::with_api_base(TELEGRAM_API_BASE, bot_token, chat_id)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

impl TelegramNotifier {
    async fn send(&self, text: String) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        self.client
            .post(&url)
            .json(&payload)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Failed to reach the Telegram API")?
            .error_for_status()
            .context("Telegram API rejected the message")?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, subject: &str, message: &str) {
        match self.send(format!("{subject}\n\n{message}")).await {
            Ok(()) => info!("Telegram notification sent"),
            Err(e) => error!("Failed to send Telegram notification: {:#}", e),
        }
    }
}

/// Used when `NOTIFY_TYPE=none`: outcomes still land in the log.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, subject: &str, message: &str) {
        info!("Notification suppressed: {} / {}", subject, message);
    }
}

pub fn from_config(config: &NotifyConfig) -> Box<dyn Notifier> {
    match config {
        NotifyConfig::Telegram { bot_token, chat_id } => {
            Box::new(TelegramNotifier::new(bot_token.clone(), chat_id.clone()))
        }
        NotifyConfig::None => Box::new(NoopNotifier),
    }
}

#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn notify(&self, subject: &str, message: &str) {
        self.as_ref().notify(subject, message).await;
    }
}

#[cfg(test)]
mod tests_telegram {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_send_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::Json(json!({
                "chat_id": "42",
                "text": "[mt-checkin] login ok\n\nall good"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let notifier = TelegramNotifier::with_api_base(server.url(), "123:abc", "42");
        notifier.notify("[mt-checkin] login ok", "all good").await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let notifier = TelegramNotifier::with_api_base(server.url(), "123:abc", "42");
        // Must not panic or propagate.
        notifier.notify("subject", "message").await;

        mock.assert_async().await;
    }
}
