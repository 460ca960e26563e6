mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::*;
use ledgerlens_api::webhook::{EventOutcome, ImportFailure, WebhookOutcome};
use ledgerlens_api::store::DatasetStore;
use ledgerlens_core::{CanonicalField, CanonicalRecord, FieldValue};

fn acknowledged(outcome: WebhookOutcome) -> Vec<EventOutcome> {
    match outcome {
        WebhookOutcome::Acknowledged(events) => events,
        other => panic!("expected acknowledged delivery, got {:?}", other),
    }
}

#[tokio::test]
async fn invalid_signature_is_rejected_without_dispatch() {
    let harness = Harness::new(FakeMessaging::serving(LEDGER_CSV)).await;
    harness.bound_account("U100").await;
    let body = delivery(vec![file_event("U100", "reply-1", "m-1")]);

    let mut headers = signed_headers(b"some other body");
    let outcome = harness.consumer.handle(&body, &headers).await;
    assert!(matches!(outcome, WebhookOutcome::Rejected(_)));
    assert_eq!(outcome.status_code(), 400);

    headers.remove("x-line-signature");
    let outcome = harness.consumer.handle(&body, &headers).await;
    assert!(matches!(outcome, WebhookOutcome::Rejected(_)));

    assert_eq!(harness.messaging.downloads(), 0);
    assert!(harness.messaging.reply_texts().is_empty());
    assert_eq!(harness.tokens.calls.load(Ordering::SeqCst), 0);
    // The raw body is still captured for auditing.
    assert_eq!(harness.audit.entries.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn unbound_sender_gets_binding_instructions() {
    let harness = Harness::new(FakeMessaging::serving(LEDGER_CSV)).await;
    let body = delivery(vec![file_event("U-stranger", "reply-1", "m-1")]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert_eq!(acknowledged(outcome), vec![EventOutcome::BindingRequested]);
    assert_eq!(harness.messaging.downloads(), 0);
    let replies = harness.messaging.replies.lock().unwrap().clone();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, "reply-1");
    assert!(replies[0].1.starts_with("尚未綁定帳號"));
    assert!(replies[0].1.ends_with(BIND_URL));
}

#[tokio::test]
async fn file_upload_replaces_dataset_and_confirms_count() {
    let harness = Harness::new(FakeMessaging::serving(LEDGER_CSV)).await;
    let account = harness.bound_account("U100").await;
    harness
        .datasets
        .upsert(account, &[CanonicalRecord::new().with(CanonicalField::Note, "stale")])
        .await
        .unwrap();
    let body = delivery(vec![file_event("U100", "reply-1", "m-1")]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert_eq!(outcome.status_code(), 200);
    assert_eq!(acknowledged(outcome), vec![EventOutcome::Imported { records: 2 }]);
    assert_eq!(
        harness.messaging.reply_texts(),
        vec!["已成功更新 2 筆交易紀錄。".to_string()]
    );

    let stored = harness.datasets.read(account).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(
        stored[0].get(CanonicalField::Amount),
        Some(&FieldValue::from(100))
    );
    assert_eq!(
        stored[1].get(CanonicalField::Category).and_then(FieldValue::as_text),
        Some("Salary")
    );
    assert!(stored.iter().all(|r| r.get(CanonicalField::Note) != Some(&FieldValue::from("stale"))));
}

#[tokio::test]
async fn unparseable_file_leaves_dataset_untouched() {
    let harness = Harness::new(FakeMessaging::serving("")).await;
    let account = harness.bound_account("U100").await;
    let existing = vec![CanonicalRecord::new().with(CanonicalField::Uuid, "uuid-1")];
    harness.datasets.upsert(account, &existing).await.unwrap();
    let body = delivery(vec![file_event("U100", "reply-1", "m-1")]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert_eq!(
        acknowledged(outcome),
        vec![EventOutcome::ImportFailed(ImportFailure::Parse)]
    );
    let replies = harness.messaging.reply_texts();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("CSV 解析失敗: "));
    assert_eq!(harness.datasets.read(account).await.unwrap(), existing);
}

#[tokio::test]
async fn failed_download_is_reported_to_sender_not_platform() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let account = harness.bound_account("U100").await;
    let body = delivery(vec![file_event("U100", "reply-1", "m-1")]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert_eq!(outcome.status_code(), 200);
    assert_eq!(
        acknowledged(outcome),
        vec![EventOutcome::ImportFailed(ImportFailure::Download)]
    );
    assert_eq!(harness.messaging.reply_texts(), vec!["讀取檔案失敗。".to_string()]);
    assert!(harness.datasets.read(account).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_write_is_reported_to_sender() {
    let repo = setup_test_repo().await.unwrap();
    let harness = Harness::build(
        repo,
        FakeMessaging::serving(LEDGER_CSV),
        StaticTokens::default(),
        Arc::new(BrokenStore),
    );
    harness.bound_account("U100").await;
    let body = delivery(vec![file_event("U100", "reply-1", "m-1")]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert_eq!(
        acknowledged(outcome),
        vec![EventOutcome::ImportFailed(ImportFailure::Persistence)]
    );
    assert_eq!(harness.messaging.reply_texts(), vec!["儲存失敗。".to_string()]);
}

#[tokio::test]
async fn help_triggers_reply_with_usage() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let body = delivery(vec![
        text_event("U100", "reply-1", "help"),
        text_event("U100", "reply-2", "說明"),
        text_event("U100", "reply-3", "HELP"),
        text_event("U100", "reply-4", "hello"),
    ]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert_eq!(
        acknowledged(outcome),
        vec![
            EventOutcome::HelpSent,
            EventOutcome::HelpSent,
            EventOutcome::Ignored,
            EventOutcome::Ignored,
        ]
    );
    let replies = harness.messaging.replies.lock().unwrap().clone();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].0, "reply-1");
    assert_eq!(replies[1].0, "reply-2");
    assert_eq!(replies[0].1, replies[1].1);
    assert!(replies[0].1.contains("CSV"));
}

#[tokio::test]
async fn non_message_events_are_ignored_without_token() {
    let harness = Harness::new(FakeMessaging::default()).await;
    let body = delivery(vec![
        serde_json::json!({
            "type": "follow",
            "timestamp": 1_700_000_000_000_i64,
            "replyToken": "reply-1",
            "source": { "type": "user", "userId": "U100" }
        }),
        serde_json::json!({ "type": "unfollow", "source": { "type": "user", "userId": "U100" } }),
    ]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert_eq!(
        acknowledged(outcome),
        vec![EventOutcome::Ignored, EventOutcome::Ignored]
    );
    assert_eq!(harness.tokens.calls.load(Ordering::SeqCst), 0);
    assert!(harness.messaging.reply_texts().is_empty());
}

#[tokio::test]
async fn token_failure_before_dispatch_is_server_error() {
    let repo = setup_test_repo().await.unwrap();
    let harness = Harness::build(
        repo.clone(),
        FakeMessaging::serving(LEDGER_CSV),
        StaticTokens {
            fail: true,
            ..StaticTokens::default()
        },
        Arc::new(ledgerlens_api::store::SqliteDatasetStore::new(repo)),
    );
    harness.bound_account("U100").await;
    let body = delivery(vec![file_event("U100", "reply-1", "m-1")]);

    let outcome = harness.consumer.handle(&body, &signed_headers(&body)).await;

    assert!(matches!(outcome, WebhookOutcome::Failed(_)));
    assert_eq!(outcome.status_code(), 500);
    assert_eq!(harness.messaging.downloads(), 0);
}
