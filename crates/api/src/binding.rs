//! Links a LINE identity to the authenticated account.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::AuthenticatedAccount;
use crate::{ApiError, AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindLineRequest {
    pub id_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindLineResponse {
    pub message: String,
    pub line_user_name: Option<String>,
}

/// `POST /line/bind`.
///
/// The ID token is checked with LINE Login and its `sub` claim becomes the
/// account's LINE identity. A rejected token is a 401; an account that no
/// longer exists is a 404.
#[instrument(skip(state, payload))]
pub async fn bind_line_account(
    State(state): State<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    payload: Result<Json<BindLineRequest>, JsonRejection>,
) -> Result<Json<BindLineResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::InvalidRequest("Invalid request body".to_string()))?;

    let profile = state.login.verify_id_token(&request.id_token).await?;

    if !state.accounts.bind_line_user(account, &profile.sub).await? {
        return Err(ApiError::NotFound(format!("account {}", account)));
    }
    info!("bound LINE identity to account {}", account);

    Ok(Json(BindLineResponse {
        message: "Line account bound successfully".to_string(),
        line_user_name: profile.name,
    }))
}
