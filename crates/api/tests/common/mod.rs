#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use ledgerlens_api::audit::AuditLog;
use ledgerlens_api::database::{Repository, MIGRATOR};
use ledgerlens_api::replies::ReplyCatalog;
use ledgerlens_api::store::{AccountDirectory, DatasetStore, SqliteDatasetStore};
use ledgerlens_api::webhook::WebhookConsumer;
use ledgerlens_api::AppState;
use ledgerlens_core::{AccountId, CanonicalRecord, Error as CoreError};
use ledgerlens_line::{
    ChannelSecretVerifier, IdTokenVerifier, LineError, LineProfile, LineResult, MessagingApi,
    TokenProvider,
};
use sqlx::sqlite::SqlitePoolOptions;

pub const SECRET: &str = "channel-secret";
pub const BIND_URL: &str = "https://ledger.example/line-bind";

pub async fn setup_test_repo() -> Result<Repository, Box<dyn std::error::Error>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    MIGRATOR.run(&pool).await?;
    Ok(Repository::new(Arc::new(pool)))
}

/// Hands out a fixed token and counts requests.
#[derive(Default)]
pub struct StaticTokens {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl TokenProvider for StaticTokens {
    fn token(&self) -> BoxFuture<'_, LineResult<String>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LineError::Configuration(
                    "LINE_MESSAGING_CHANNEL_ID or LINE_CHANNEL_SECRET not set".to_string(),
                ));
            }
            Ok("channel-token".to_string())
        })
    }
}

/// Serves one file body (or a download failure) and records replies.
#[derive(Default)]
pub struct FakeMessaging {
    pub content: Mutex<Option<Vec<u8>>>,
    pub downloads: AtomicUsize,
    pub replies: Mutex<Vec<(String, String)>>,
}

impl FakeMessaging {
    pub fn serving(content: &str) -> Self {
        Self {
            content: Mutex::new(Some(content.as_bytes().to_vec())),
            ..Self::default()
        }
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl MessagingApi for FakeMessaging {
    fn fetch_content<'a>(
        &'a self,
        _token: &'a str,
        _message_id: &'a str,
    ) -> BoxFuture<'a, LineResult<Vec<u8>>> {
        Box::pin(async move {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            self.content
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| LineError::Transfer("content unavailable (404)".to_string()))
        })
    }

    fn reply_text<'a>(
        &'a self,
        _token: &'a str,
        reply_token: &'a str,
        text: &'a str,
    ) -> BoxFuture<'a, LineResult<()>> {
        Box::pin(async move {
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.to_string(), text.to_string()));
            Ok(())
        })
    }
}

/// Dataset store whose writes always fail.
pub struct BrokenStore;

impl DatasetStore for BrokenStore {
    fn upsert<'a>(
        &'a self,
        _account: AccountId,
        _records: &'a [CanonicalRecord],
    ) -> BoxFuture<'a, ledgerlens_core::Result<()>> {
        Box::pin(async { Err(CoreError::persistence("disk full")) })
    }

    fn read(&self, _account: AccountId) -> BoxFuture<'_, ledgerlens_core::Result<Vec<CanonicalRecord>>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[derive(Default)]
pub struct MemoryAudit {
    pub entries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl AuditLog for MemoryAudit {
    fn record<'a>(&'a self, label: &'a str, body: &'a [u8]) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.entries
                .lock()
                .unwrap()
                .push((label.to_string(), body.to_vec()));
        })
    }
}

/// Accepts one ID token and returns a fixed profile for it.
pub struct FakeLogin {
    pub valid_token: String,
    pub profile: LineProfile,
}

impl IdTokenVerifier for FakeLogin {
    fn verify_id_token<'a>(&'a self, id_token: &'a str) -> BoxFuture<'a, LineResult<LineProfile>> {
        Box::pin(async move {
            if id_token == self.valid_token {
                Ok(self.profile.clone())
            } else {
                Err(LineError::Authentication("IdToken expired.".to_string()))
            }
        })
    }
}

pub fn profile(sub: &str, name: &str) -> LineProfile {
    LineProfile {
        sub: sub.to_string(),
        name: Some(name.to_string()),
        picture: None,
        email: None,
        aud: None,
        exp: None,
    }
}

/// Everything a webhook test wants to inspect afterwards.
pub struct Harness {
    pub repo: Repository,
    pub tokens: Arc<StaticTokens>,
    pub messaging: Arc<FakeMessaging>,
    pub audit: Arc<MemoryAudit>,
    pub datasets: Arc<dyn DatasetStore>,
    pub consumer: Arc<WebhookConsumer>,
}

impl Harness {
    pub async fn new(messaging: FakeMessaging) -> Self {
        let repo = setup_test_repo().await.unwrap();
        let datasets: Arc<dyn DatasetStore> = Arc::new(SqliteDatasetStore::new(repo.clone()));
        Self::build(repo, messaging, StaticTokens::default(), datasets)
    }

    pub fn build(
        repo: Repository,
        messaging: FakeMessaging,
        tokens: StaticTokens,
        datasets: Arc<dyn DatasetStore>,
    ) -> Self {
        let tokens = Arc::new(tokens);
        let messaging = Arc::new(messaging);
        let audit = Arc::new(MemoryAudit::default());
        let accounts: Arc<dyn AccountDirectory> = Arc::new(repo.clone());

        let consumer = Arc::new(WebhookConsumer::new(
            Arc::new(ChannelSecretVerifier::new(Some(SECRET.to_string()))),
            tokens.clone(),
            messaging.clone(),
            accounts,
            datasets.clone(),
            audit.clone(),
            ReplyCatalog::new(BIND_URL),
        ));

        Self {
            repo,
            tokens,
            messaging,
            audit,
            datasets,
            consumer,
        }
    }

    pub fn app_state(&self, login: FakeLogin) -> AppState {
        AppState {
            webhook: self.consumer.clone(),
            login: Arc::new(login),
            accounts: Arc::new(self.repo.clone()),
            datasets: self.datasets.clone(),
        }
    }

    /// Account bound to `line_user_id`.
    pub async fn bound_account(&self, line_user_id: &str) -> AccountId {
        let id = self
            .repo
            .create_account("owner@example.com", Some("Owner"))
            .await
            .unwrap();
        assert!(self.repo.bind_line_user(id, line_user_id).await.unwrap());
        id
    }
}

pub fn file_event(user_id: &str, reply_token: &str, message_id: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "mode": "active",
        "timestamp": 1_700_000_000_000_i64,
        "replyToken": reply_token,
        "source": { "type": "user", "userId": user_id },
        "message": { "type": "file", "id": message_id, "fileName": "ledger.csv", "fileSize": 128 }
    })
}

pub fn text_event(user_id: &str, reply_token: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "message",
        "timestamp": 1_700_000_000_000_i64,
        "replyToken": reply_token,
        "source": { "type": "user", "userId": user_id },
        "message": { "type": "text", "id": "t-1", "text": text }
    })
}

pub fn delivery(events: Vec<serde_json::Value>) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "destination": "Udest", "events": events })).unwrap()
}

pub fn signed_headers(body: &[u8]) -> axum::http::HeaderMap {
    let mut headers = axum::http::HeaderMap::new();
    let signature = ChannelSecretVerifier::sign(SECRET, body).unwrap();
    headers.insert("x-line-signature", signature.parse().unwrap());
    headers
}

pub const LEDGER_CSV: &str = "日期,類別,金額,備註\n2023-12-01,Food,100,Lunch\nBAD_ROW\n2023-12-02,Salary,50000,\n";
