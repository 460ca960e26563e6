//! Dataset endpoints for authenticated clients.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use ledgerlens_core::CanonicalRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::AuthenticatedAccount;
use crate::{ApiError, AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsBody {
    pub transactions: Vec<CanonicalRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveTransactionsResponse {
    pub message: String,
}

/// `GET /transactions`. An account without a dataset gets an empty list.
#[instrument(skip(state))]
pub async fn get_transactions(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<Json<TransactionsBody>, ApiError> {
    let transactions = state.datasets.read(account).await?;
    Ok(Json(TransactionsBody { transactions }))
}

/// `POST /transactions`. Replaces the stored dataset as a whole.
#[instrument(skip(state, payload))]
pub async fn save_transactions(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    payload: Result<Json<TransactionsBody>, JsonRejection>,
) -> Result<Json<SaveTransactionsResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    state.datasets.upsert(account, &body.transactions).await?;
    info!(
        "saved {} transactions for account {}",
        body.transactions.len(),
        account
    );

    Ok(Json(SaveTransactionsResponse {
        message: "Transactions saved successfully".to_string(),
    }))
}
