use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::app_config::TelegramConfig;
use crate::errors::{TransportError, truncate_chars};
use crate::session::models::ChatId;
use crate::telegram::models::{
    ApiResponse, DeleteWebhookRequest, EditMessageTextRequest, GetUpdatesRequest, Message,
    SendMessageRequest, Update,
};
use crate::telegram::{ChatTransport, MessageId};

/// Slack added on top of the long-poll timeout for the HTTP request itself
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Default timeout of regular (non long-poll) Bot API calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram Bot API client
pub struct TelegramClient {
    /// HTTP client for API requests
    client: Client,
    /// `{api_base}/bot{token}`; holds the credential, never log it
    method_base: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a client for the given API base (e.g. `https://api.telegram.org`) and bot token
    pub fn new(api_base: &str, bot_token: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            method_base: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
        }
    }

    /// Create a client from the `telegram` configuration section
    pub fn from_config(config: &TelegramConfig) -> Self {
        Self::new(&config.api_base, &config.bot_token)
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.method_base, method);
        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            // reqwest errors embed the URL, which embeds the token
            .map_err(|e| TransportError::ConnectionError(format!("{} failed: {}", method, e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::ConnectionError(format!("{} failed: {}", method, e.without_url())))?;

        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            TransportError::ParseError(format!(
                "{} returned {} with unreadable body ({}): {}",
                method,
                status,
                e,
                truncate_chars(&text, 300)
            ))
        })?;

        if !envelope.ok {
            let error = TransportError::ApiError {
                code: envelope.error_code.unwrap_or(status.as_u16() as i64),
                description: envelope.description.unwrap_or_else(|| "no description".to_string()),
            };
            error!("Telegram {} rejected: {}", method, error);
            return Err(error);
        }

        envelope
            .result
            .ok_or_else(|| TransportError::ParseError(format!("{} returned ok without a result", method)))
    }

    /// Drop the webhook (if any) so long polling works, optionally discarding queued updates
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &DeleteWebhookRequest { drop_pending_updates },
                REQUEST_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`, waiting up to `timeout_secs`
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &request,
                Duration::from_secs(timeout_secs) + LONG_POLL_GRACE,
            )
            .await?;

        if !updates.is_empty() {
            debug!("Received {} update(s)", updates.len());
        }
        Ok(updates)
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId, TransportError> {
        let message: Message = self
            .call(
                "sendMessage",
                &SendMessageRequest { chat_id: chat.0, text },
                REQUEST_TIMEOUT,
            )
            .await?;
        Ok(MessageId(message.message_id))
    }

    async fn edit_message(&self, chat: ChatId, message: MessageId, text: &str) -> Result<(), TransportError> {
        // editMessageText answers with the edited Message (or `true` for inline messages)
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageTextRequest {
                    chat_id: chat.0,
                    message_id: message.0,
                    text,
                },
                REQUEST_TIMEOUT,
            )
            .await?;
        Ok(())
    }
}
