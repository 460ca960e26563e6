//! LINE webhook consumer.
//!
//! One call per delivery: `Received -> Verified -> dispatched per event ->
//! Acknowledged`. Once the signature has been accepted the platform always
//! gets a success status; per-event failures go back to the sender as replies.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use ledgerlens_core::{parse_ledger, AccountId};
use ledgerlens_line::{
    EventMessage, FileMessage, LineError, MessageEvent, MessagingApi, TokenProvider,
    WebhookEvent, WebhookVerifier,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::audit::AuditLog;
use crate::replies::ReplyCatalog;
use crate::store::{AccountDirectory, DatasetStore};
use crate::AppState;

const AUDIT_LABEL: &str = "Line Webhook";

/// Terminal state of one webhook call.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Signature accepted; one entry per delivered event.
    Acknowledged(Vec<EventOutcome>),
    /// Signature missing or wrong. Nothing was dispatched.
    Rejected(LineError),
    /// Internal failure before dispatch.
    Failed(LineError),
}

impl WebhookOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookOutcome::Acknowledged(_) => StatusCode::OK,
            WebhookOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
            WebhookOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What happened to a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored,
    HelpSent,
    BindingRequested,
    Imported { records: usize },
    ImportFailed(ImportFailure),
}

/// Stage at which a file import stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFailure {
    AccountLookup,
    Download,
    Parse,
    Persistence,
}

/// Verifies deliveries and turns uploaded ledger exports into datasets.
pub struct WebhookConsumer {
    verifier: Arc<dyn WebhookVerifier>,
    tokens: Arc<dyn TokenProvider>,
    messaging: Arc<dyn MessagingApi>,
    accounts: Arc<dyn AccountDirectory>,
    datasets: Arc<dyn DatasetStore>,
    audit: Arc<dyn AuditLog>,
    replies: ReplyCatalog,
}

impl WebhookConsumer {
    pub fn new(
        verifier: Arc<dyn WebhookVerifier>,
        tokens: Arc<dyn TokenProvider>,
        messaging: Arc<dyn MessagingApi>,
        accounts: Arc<dyn AccountDirectory>,
        datasets: Arc<dyn DatasetStore>,
        audit: Arc<dyn AuditLog>,
        replies: ReplyCatalog,
    ) -> Self {
        Self {
            verifier,
            tokens,
            messaging,
            accounts,
            datasets,
            audit,
            replies,
        }
    }

    /// Process one delivery.
    pub async fn handle(&self, body: &[u8], headers: &HeaderMap) -> WebhookOutcome {
        // Verification consumes the body, so the audit copy is taken first.
        self.audit.record(AUDIT_LABEL, body).await;

        let events = match self.verifier.verify_and_parse(body, headers) {
            Ok(events) => events,
            Err(err @ LineError::Authentication(_)) => {
                warn!("rejected webhook delivery: {}", err);
                return WebhookOutcome::Rejected(err);
            }
            Err(err) => {
                warn!("webhook verification failed: {}", err);
                return WebhookOutcome::Failed(err);
            }
        };
        debug!("verified webhook delivery with {} events", events.len());

        let has_messages = events
            .iter()
            .any(|event| matches!(event, WebhookEvent::Message(_)));
        if !has_messages {
            return WebhookOutcome::Acknowledged(vec![EventOutcome::Ignored; events.len()]);
        }

        let token = match self.tokens.token().await {
            Ok(token) => token,
            Err(err) => {
                warn!("cannot obtain channel access token: {}", err);
                return WebhookOutcome::Failed(err);
            }
        };

        let mut outcomes = Vec::with_capacity(events.len());
        for event in &events {
            let outcome = match event {
                WebhookEvent::Message(message) => self.dispatch(&token, message).await,
                WebhookEvent::Other => EventOutcome::Ignored,
            };
            outcomes.push(outcome);
        }
        WebhookOutcome::Acknowledged(outcomes)
    }

    async fn dispatch(&self, token: &str, event: &MessageEvent) -> EventOutcome {
        match &event.message {
            EventMessage::File(file) => self.import_file(token, event, file).await,
            EventMessage::Text(text) if ReplyCatalog::is_help_trigger(&text.text) => {
                self.reply(token, event, &self.replies.usage()).await;
                EventOutcome::HelpSent
            }
            EventMessage::Text(_) | EventMessage::Other => EventOutcome::Ignored,
        }
    }

    #[instrument(skip(self, token, event, file), fields(message_id = %file.id))]
    async fn import_file(
        &self,
        token: &str,
        event: &MessageEvent,
        file: &FileMessage,
    ) -> EventOutcome {
        let Some(line_user_id) = event.source.user_id.as_deref() else {
            debug!("file message without a sender user id, ignoring");
            return EventOutcome::Ignored;
        };

        let account = match self.accounts.find_by_line_user(line_user_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                info!("file upload from unbound LINE user");
                self.reply(token, event, &self.replies.binding_instructions())
                    .await;
                return EventOutcome::BindingRequested;
            }
            Err(err) => {
                warn!("account lookup failed: {}", err);
                self.reply(token, event, &self.replies.system_error()).await;
                return EventOutcome::ImportFailed(ImportFailure::AccountLookup);
            }
        };

        match self.import_for_account(token, account, file).await {
            Ok(records) => {
                info!("imported {} records for account {}", records, account);
                self.reply(token, event, &self.replies.imported(records))
                    .await;
                EventOutcome::Imported { records }
            }
            Err((stage, text)) => {
                self.reply(token, event, &text).await;
                EventOutcome::ImportFailed(stage)
            }
        }
    }

    async fn import_for_account(
        &self,
        token: &str,
        account: AccountId,
        file: &FileMessage,
    ) -> Result<usize, (ImportFailure, String)> {
        let content = self
            .messaging
            .fetch_content(token, &file.id)
            .await
            .map_err(|err| {
                warn!("download of {} failed: {}", file.id, err);
                (ImportFailure::Download, self.replies.download_failed())
            })?;

        // Parsing completes before anything is written, so a bad file leaves
        // the stored dataset untouched.
        let records = parse_ledger(content.as_slice()).map_err(|err| {
            warn!("ledger parse failed for {}: {}", file.id, err);
            (ImportFailure::Parse, self.replies.parse_failed(&err.detail()))
        })?;

        self.datasets
            .upsert(account, &records)
            .await
            .map_err(|err| {
                warn!("storing dataset for account {} failed: {}", account, err);
                (ImportFailure::Persistence, self.replies.save_failed())
            })?;

        Ok(records.len())
    }

    async fn reply(&self, token: &str, event: &MessageEvent, text: &str) {
        let Some(reply_token) = event.reply_token.as_deref() else {
            debug!("event carries no reply token, skipping reply");
            return;
        };
        if let Err(err) = self.messaging.reply_text(token, reply_token, text).await {
            warn!("reply delivery failed: {}", err);
        }
    }
}

/// `POST /line/webhook`. Status only, empty body.
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn line_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.webhook.handle(&body, &headers).await.status_code()
}
