//! Axum router configuration for the LedgerLens HTTP API.

use crate::binding::bind_line_account;
use crate::config::ApiConfig;
use crate::transactions::{get_transactions, save_transactions};
use crate::webhook::line_webhook;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Build the API router without an authentication layer.
///
/// Protected routes then answer 401, since nothing establishes an
/// [`AuthenticatedAccount`](crate::auth::AuthenticatedAccount).
pub fn build_router(config: &ApiConfig, state: AppState) -> Router {
    build_router_with_auth(config, state, |routes| routes)
}

/// Build the API router, letting `authenticate` wrap the protected routes.
///
/// The wrapper is expected to insert an `AuthenticatedAccount` extension for
/// requests it accepts.
pub fn build_router_with_auth<F>(config: &ApiConfig, state: AppState, authenticate: F) -> Router
where
    F: FnOnce(Router<AppState>) -> Router<AppState>,
{
    let protected = authenticate(
        Router::new()
            .route("/transactions", get(get_transactions).post(save_transactions))
            .route("/line/bind", post(bind_line_account)),
    );

    let api = Router::new()
        .route("/line/webhook", post(line_webhook))
        .merge(protected);

    let router = if config.api_base_path.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&config.api_base_path, api)
    };

    router
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
