//! Channel access token cache.
//!
//! LINE issues short-lived channel access tokens through a client-credentials
//! exchange. [`CredentialCache`] hands out the cached token while it has more
//! than the refresh margin left and otherwise refreshes it, letting only one
//! caller at a time perform the exchange.

use crate::{LineError, LineResult};
use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use ledgerlens_core::config::LineConfig;
use ledgerlens_core::constants::TOKEN_REFRESH_MARGIN_SECS;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

const TOKEN_PATH: &str = "/v2/oauth/accessToken";

/// Source of bearer tokens for outbound platform calls.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> BoxFuture<'_, LineResult<String>>;
}

/// Token as returned by the exchange endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Performs the client-credentials exchange.
pub trait TokenExchange: Send + Sync {
    fn exchange(&self) -> BoxFuture<'_, LineResult<IssuedToken>>;
}

/// Cached token and its expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    fn usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        !self.token.is_empty() && now + margin < self.expires_at
    }
}

/// Single-flight cache around a [`TokenExchange`].
pub struct CredentialCache<E> {
    exchange: E,
    margin: Duration,
    current: RwLock<Option<Credential>>,
    refresh: Mutex<()>,
}

impl<E: TokenExchange> CredentialCache<E> {
    pub fn new(exchange: E) -> Self {
        Self::with_margin(exchange, Duration::seconds(TOKEN_REFRESH_MARGIN_SECS))
    }

    pub fn with_margin(exchange: E, margin: Duration) -> Self {
        Self {
            exchange,
            margin,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return a token with more than the refresh margin left, refreshing if needed.
    pub async fn get_token(&self) -> LineResult<String> {
        if let Some(token) = self.usable_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(token) = self.usable_token().await {
            return Ok(token);
        }

        debug!("channel access token missing or near expiry, refreshing");
        let issued = self.exchange.exchange().await?;
        if issued.access_token.is_empty() {
            return Err(LineError::Decode(
                "token response carried an empty access_token".to_string(),
            ));
        }

        let expires_at = Duration::try_seconds(issued.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                LineError::Decode(format!(
                    "token response carried an unusable expires_in: {}",
                    issued.expires_in
                ))
            })?;
        let credential = Credential {
            token: issued.access_token,
            expires_at,
        };
        info!(
            "refreshed channel access token (expires at {})",
            credential.expires_at.to_rfc3339()
        );
        let token = credential.token.clone();
        *self.current.write().await = Some(credential);
        Ok(token)
    }

    /// Snapshot of the cached credential.
    pub async fn cached(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    async fn usable_token(&self) -> Option<String> {
        let now = Utc::now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|credential| credential.usable_at(now, self.margin))
            .map(|credential| credential.token.clone())
    }
}

impl<E: TokenExchange> TokenProvider for CredentialCache<E> {
    fn token(&self) -> BoxFuture<'_, LineResult<String>> {
        Box::pin(self.get_token())
    }
}

/// Client-credentials exchange against the LINE OAuth endpoint.
pub struct HttpTokenExchange {
    http: reqwest::Client,
    endpoint: String,
    channel_id: Option<String>,
    channel_secret: Option<String>,
}

impl HttpTokenExchange {
    pub fn new(http: reqwest::Client, config: &LineConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", config.api_base_url.trim_end_matches('/'), TOKEN_PATH),
            channel_id: config.messaging_channel_id.clone(),
            channel_secret: config.channel_secret.clone(),
        }
    }

    async fn request_token(&self) -> LineResult<IssuedToken> {
        let (Some(channel_id), Some(channel_secret)) =
            (non_blank(&self.channel_id), non_blank(&self.channel_secret))
        else {
            return Err(LineError::Configuration(
                "LINE_MESSAGING_CHANNEL_ID or LINE_CHANNEL_SECRET not set".to_string(),
            ));
        };

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", channel_id),
                ("client_secret", channel_secret),
            ])
            .send()
            .await
            .map_err(|e| LineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LineError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| LineError::Decode(e.to_string()))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl TokenExchange for HttpTokenExchange {
    fn exchange(&self) -> BoxFuture<'_, LineResult<IssuedToken>> {
        Box::pin(self.request_token())
    }
}
