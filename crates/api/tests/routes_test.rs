mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::{Extension, Router};
use common::*;
use ledgerlens_api::auth::AuthenticatedAccount;
use ledgerlens_api::store::AccountDirectory;
use ledgerlens_api::{build_router, build_router_with_auth, ApiConfig};
use ledgerlens_core::AccountId;
use tower::util::ServiceExt;

fn login() -> FakeLogin {
    FakeLogin {
        valid_token: "good-id-token".to_string(),
        profile: profile("U-line-42", "Alice"),
    }
}

fn authenticated_router(harness: &Harness, account: AccountId) -> Router {
    build_router_with_auth(&ApiConfig::default(), harness.app_state(login()), |routes| {
        routes.layer(Extension(AuthenticatedAccount(account)))
    })
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_served_at_root() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let app = build_router(&ApiConfig::default(), harness.app_state(login()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_authenticated_account() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let app = build_router(&ApiConfig::default(), harness.app_state(login()));

    let response = app
        .oneshot(Request::get("/api/transactions").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transactions_round_trip_through_api() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let account = harness.repo.create_account("alice@example.com", None).await.unwrap();
    let app = authenticated_router(&harness, account);

    let response = app
        .clone()
        .oneshot(Request::get("/api/transactions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "transactions": [] }));

    let saved = serde_json::json!({
        "transactions": [
            { "date": "2024-01-02", "amount": 120, "note": "dinner", "ignored": "x" },
            { "date": "2024-01-03", "amount": "n/a" }
        ]
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/transactions", saved))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Transactions saved successfully"
    );

    let response = app
        .oneshot(Request::get("/api/transactions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        serde_json::json!({
            "transactions": [
                { "date": "2024-01-02", "amount": 120, "note": "dinner" },
                { "date": "2024-01-03", "amount": "n/a" }
            ]
        })
    );
}

#[tokio::test]
async fn malformed_transactions_body_is_bad_request() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let account = harness.repo.create_account("alice@example.com", None).await.unwrap();
    let app = authenticated_router(&harness, account);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            serde_json::json!({ "transactions": [{ "note": true }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bind_links_line_identity_to_account() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let account = harness.repo.create_account("alice@example.com", None).await.unwrap();
    let app = authenticated_router(&harness, account);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/line/bind",
            serde_json::json!({ "id_token": "good-id-token" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({
            "message": "Line account bound successfully",
            "line_user_name": "Alice"
        })
    );
    assert_eq!(
        harness.repo.find_by_line_user("U-line-42").await.unwrap(),
        Some(account)
    );
}

#[tokio::test]
async fn bind_rejects_invalid_id_token() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let account = harness.repo.create_account("alice@example.com", None).await.unwrap();
    let app = authenticated_router(&harness, account);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/line/bind",
            serde_json::json!({ "id_token": "expired" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.repo.find_by_line_user("U-line-42").await.unwrap(), None);
}

#[tokio::test]
async fn bind_for_deleted_account_is_not_found() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let app = authenticated_router(&harness, 9_999);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/line/bind",
            serde_json::json!({ "id_token": "good-id-token" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_route_answers_with_status_only() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let app = build_router(&ApiConfig::default(), harness.app_state(login()));
    let body = delivery(vec![text_event("U100", "reply-1", "help")]);
    let signature = ledgerlens_line::ChannelSecretVerifier::sign(SECRET, &body).unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/line/webhook")
                .header("x-line-signature", signature)
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(to_bytes(response.into_body(), usize::MAX).await.unwrap().is_empty());

    let response = app
        .oneshot(
            Request::post("/api/line/webhook")
                .header("x-line-signature", "bm90LWEtc2lnbmF0dXJl")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(to_bytes(response.into_body(), usize::MAX).await.unwrap().is_empty());
    assert_eq!(harness.messaging.reply_texts().len(), 1);
}
