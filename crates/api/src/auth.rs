//! Authenticated identity for direct API calls.
//!
//! Authentication itself happens in middleware outside this crate; that
//! middleware inserts an [`AuthenticatedAccount`] into the request extensions.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ledgerlens_core::AccountId;

use crate::ApiError;

/// Account established by the authentication middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount(pub AccountId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAccount>()
            .copied()
            .ok_or_else(|| ApiError::Auth("authentication required".to_string()))
    }
}
