// Integration tests for the command receiver.

use serde_json::json;
use std::sync::Arc;

use crate::app::ListenerApp;
use crate::config::new_test_config;
use crate::support::{do_json, oneshot, start_listener, FailingIssuer, RecordingIssuer};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_shutdown_is_issued() {
    let issuer = Arc::new(RecordingIssuer::default());
    let app =
        ListenerApp::with_issuer(CancellationToken::new(), &new_test_config(), issuer.clone())
            .unwrap();

    let reply = oneshot(app.router(), "POST", "/shutdown", Some("{}")).await;
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.body,
        json!({"success": true, "message": "Shutdown initiated"})
    );
    assert_eq!(issuer.calls(), 1);
}

/// A failed shutdown answers 500 and the receiver keeps serving.
#[tokio::test]
async fn test_failed_shutdown_keeps_serving() {
    let listener = start_listener(new_test_config(), Arc::new(FailingIssuer)).await;

    let (status, body) = do_json("POST", &listener.url("/shutdown"), Some(json!({}))).await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("permission denied"));

    let (status, body) = do_json("GET", &listener.url("/health"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"status": "running"}));

    listener.stop().await;
}

#[tokio::test]
async fn test_missing_shutdown_binary_reports_error() {
    // The test config points the command at a program that does not exist.
    let app = ListenerApp::new(CancellationToken::new(), &new_test_config()).unwrap();

    let reply = oneshot(app.router(), "POST", "/shutdown", None).await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body["success"], false);
    assert!(reply.body["error"]
        .as_str()
        .unwrap()
        .contains("/nonexistent/powerrelay-shutdown"));
}

#[tokio::test]
async fn test_health() {
    let app = ListenerApp::with_issuer(
        CancellationToken::new(),
        &new_test_config(),
        Arc::new(RecordingIssuer::default()),
    )
    .unwrap();

    let reply = oneshot(app.router(), "GET", "/health", None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["status"], "running");
}
