//! Outbound Messaging API calls.

use crate::{LineError, LineResult};
use futures::future::BoxFuture;
use ledgerlens_core::config::LineConfig;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// Messaging API operations the webhook consumer needs.
pub trait MessagingApi: Send + Sync {
    /// Download the content attached to a message.
    fn fetch_content<'a>(
        &'a self,
        token: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, LineResult<Vec<u8>>>;

    /// Answer an event with a single text message.
    fn reply_text<'a>(
        &'a self,
        token: &'a str,
        reply_token: &'a str,
        text: &'a str,
    ) -> BoxFuture<'a, LineResult<()>>;
}

/// Build the shared HTTP client for LINE calls.
pub fn build_http_client(config: &LineConfig) -> LineResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds.max(1)))
        .build()
        .map_err(|e| LineError::Internal(format!("failed to build HTTP client: {}", e)))
}

/// reqwest-backed Messaging API client.
#[derive(Clone)]
pub struct LineClient {
    http: reqwest::Client,
    api_base_url: String,
    data_api_base_url: String,
}

impl LineClient {
    pub fn new(http: reqwest::Client, config: &LineConfig) -> Self {
        Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            data_api_base_url: config.data_api_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, token))]
    async fn download(&self, token: &str, message_id: &str) -> LineResult<Vec<u8>> {
        let url = format!(
            "{}/v2/bot/message/{}/content",
            self.data_api_base_url, message_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| LineError::Transfer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LineError::Transfer(format!(
                "content download returned HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LineError::Transfer(e.to_string()))?;
        debug!("downloaded {} bytes of message content", bytes.len());
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, token, text))]
    async fn reply(&self, token: &str, reply_token: &str, text: &str) -> LineResult<()> {
        let url = format!("{}/v2/bot/message/reply", self.api_base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({
                "replyToken": reply_token,
                "messages": [{ "type": "text", "text": text }],
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(LineError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

impl MessagingApi for LineClient {
    fn fetch_content<'a>(
        &'a self,
        token: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, LineResult<Vec<u8>>> {
        Box::pin(self.download(token, message_id))
    }

    fn reply_text<'a>(
        &'a self,
        token: &'a str,
        reply_token: &'a str,
        text: &'a str,
    ) -> BoxFuture<'a, LineResult<()>> {
        Box::pin(self.reply(token, reply_token, text))
    }
}
