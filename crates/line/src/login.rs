//! LINE Login ID-token verification, used when an account links its LINE identity.

use crate::{LineError, LineResult};
use futures::future::BoxFuture;
use ledgerlens_core::config::LineConfig;
use serde::{Deserialize, Serialize};

const VERIFY_PATH: &str = "/oauth2/v2.1/verify";

/// Claims returned for a valid ID token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineProfile {
    /// LINE user id; becomes the external identity bound to the account.
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

pub trait IdTokenVerifier: Send + Sync {
    fn verify_id_token<'a>(&'a self, id_token: &'a str) -> BoxFuture<'a, LineResult<LineProfile>>;
}

/// Verifies ID tokens against the LINE Login endpoint.
#[derive(Clone)]
pub struct LineLogin {
    http: reqwest::Client,
    endpoint: String,
    client_id: Option<String>,
}

impl LineLogin {
    pub fn new(http: reqwest::Client, config: &LineConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", config.api_base_url.trim_end_matches('/'), VERIFY_PATH),
            client_id: config.login_channel_id.clone(),
        }
    }

    async fn verify(&self, id_token: &str) -> LineResult<LineProfile> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| LineError::Configuration("LINE_LOGIN_CHANNEL_ID not set".to_string()))?;

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("id_token", id_token), ("client_id", client_id)])
            .send()
            .await
            .map_err(|e| LineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LineError::Authentication(format!(
                "ID token rejected with HTTP {}",
                response.status().as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LineError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| LineError::Decode(e.to_string()))
    }
}

impl IdTokenVerifier for LineLogin {
    fn verify_id_token<'a>(&'a self, id_token: &'a str) -> BoxFuture<'a, LineResult<LineProfile>> {
        Box::pin(self.verify(id_token))
    }
}
