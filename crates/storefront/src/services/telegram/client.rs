//! Telegram Bot API client.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use url::Url;

use super::error::TelegramError;
use crate::config::TelegramConfig;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends HTML messages to one Telegram chat.
#[derive(Clone)]
pub struct TelegramClient {
    /// HTTP client.
    client: Client,
    /// Bot token, part of every request path.
    bot_token: SecretString,
    /// Chat that receives notifications.
    chat_id: String,
    /// API base URL.
    api_base: Url,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new Telegram client.
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            api_base: config.api_base.clone(),
        }
    }

    /// Send an HTML-formatted message.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError::Request` if the request cannot be sent.
    /// Returns `TelegramError::Api` if Telegram rejects the message.
    #[instrument(skip(self, text), fields(chat_id = %self.chat_id))]
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base.as_str().trim_end_matches('/'),
            self.bot_token.expose_secret()
        );

        let response = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await
            // The URL carries the bot token
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let body: Option<ApiResponse> = response.json().await.ok();

        match body {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                debug!("Message sent to Telegram");
                Ok(())
            }
            other => {
                let description = other
                    .and_then(|b| b.description)
                    .unwrap_or_else(|| format!("HTTP {status}"));
                error!(status = %status, error = %description, "Telegram API error sending message");
                Err(TelegramError::Api(description))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&TelegramConfig {
            bot_token: SecretString::from("123456:test-token"),
            chat_id: "6777655739".to_string(),
            api_base: Url::parse(&server.base_url()).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_send_message_posts_html_to_chat() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/bot123456:test-token/sendMessage")
                    .json_body(json!({
                        "chat_id": "6777655739",
                        "text": "<b>hello</b>",
                        "parse_mode": "HTML"
                    }));
                then.status(200)
                    .json_body(json!({"ok": true, "result": {"message_id": 1}}));
            })
            .await;

        client_for(&server).send_message("<b>hello</b>").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_message_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(400).json_body(json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: chat not found"
                }));
            })
            .await;

        let err = client_for(&server).send_message("hi").await.unwrap_err();
        assert!(matches!(&err, TelegramError::Api(d) if d.contains("chat not found")));
    }

    #[tokio::test]
    async fn test_ok_false_with_success_status_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({"ok": false}));
            })
            .await;

        let err = client_for(&server).send_message("hi").await.unwrap_err();
        assert!(matches!(err, TelegramError::Api(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error_without_token() {
        let client = TelegramClient::new(&TelegramConfig {
            bot_token: SecretString::from("123456:very-secret"),
            chat_id: "1".to_string(),
            api_base: Url::parse("http://127.0.0.1:1").unwrap(),
        });

        let err = client.send_message("hi").await.unwrap_err();
        assert!(matches!(err, TelegramError::Request(_)));
        assert!(!err.to_string().contains("very-secret"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = TelegramClient::new(&TelegramConfig {
            bot_token: SecretString::from("123456:very-secret"),
            chat_id: "42".to_string(),
            api_base: Url::parse("https://api.telegram.org").unwrap(),
        });

        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-secret"));
    }
}
