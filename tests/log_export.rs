//! Log shipping against a mock logging backend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use edge_proxy::config::ExportConfig;
use edge_proxy::http::HttpServer;
use edge_proxy::lifecycle::Shutdown;
use edge_proxy::observability::{CloudLoggingExporter, ExportError, LogEvent, LogSink};

mod common;

fn export_config(backend: &common::MockBackend) -> ExportConfig {
    let mut config = ExportConfig::default();
    config.endpoint = format!("{}/v2/entries:write", backend.origin());
    config.retries.steps = 3;
    config.retries.step_ms = 1;
    config
}

fn exporter(backend: &common::MockBackend) -> CloudLoggingExporter {
    CloudLoggingExporter::new(common::test_client(), common::test_credential(), &export_config(backend)).unwrap()
}

/// Verify the bearer assertion and return its claims.
fn verify_bearer(request: &common::RecordedRequest) -> Value {
    let authorization = request.headers[header::AUTHORIZATION].to_str().unwrap();
    let token = authorization.strip_prefix("Bearer ").expect("bearer scheme");

    let header = decode_header(token).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some("test-key-1"));

    let key = DecodingKey::from_rsa_pem(common::TEST_PUBLIC_KEY_PEM.as_bytes()).unwrap();
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["https://logging.googleapis.com/"]);
    validation.set_issuer(&["edge-proxy@edge-logs.iam.gserviceaccount.com"]);
    decode::<Value>(token, &key, &validation).unwrap().claims
}

#[tokio::test]
async fn test_batch_is_signed_and_shaped() {
    let backend = common::start_mock_backend(200, "{}").await;
    let batch = vec![
        LogEvent::debug("Rejected request without secret prefix").with("path", "/nope"),
        LogEvent::info("Request completed").with("status", 200).with("route", "cdn"),
    ];

    exporter(&backend).try_export(&batch).await.unwrap();

    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].uri.path(), "/v2/entries:write");
    assert_eq!(seen[0].headers[header::CONTENT_TYPE], "application/json");

    let claims = verify_bearer(&seen[0]);
    assert_eq!(claims["sub"], "edge-proxy@edge-logs.iam.gserviceaccount.com");
    assert_eq!(claims["exp"].as_u64().unwrap() - claims["iat"].as_u64().unwrap(), 3600);

    let body: Value = serde_json::from_slice(&seen[0].body).unwrap();
    assert_eq!(body["logName"], "projects/edge-logs/logs/edge-proxy");
    assert_eq!(body["resource"]["type"], "global");
    assert_eq!(body["labels"]["service"], "edge-proxy");

    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["severity"], "DEBUG");
    assert_eq!(entries[0]["jsonPayload"]["message"], "Rejected request without secret prefix");
    assert_eq!(entries[0]["jsonPayload"]["path"], "/nope");
    assert_eq!(entries[1]["severity"], "INFO");
    assert_eq!(entries[1]["jsonPayload"]["status"], 200);
}

#[tokio::test]
async fn test_every_batch_gets_its_own_assertion() {
    let backend = common::start_mock_backend(200, "{}").await;
    let exporter = exporter(&backend);

    exporter.try_export(&[LogEvent::info("one")]).await.unwrap();
    exporter.try_export(&[LogEvent::info("two")]).await.unwrap();

    let seen = backend.requests();
    assert_eq!(seen.len(), 2);
    for request in &seen {
        verify_bearer(request);
    }
}

#[tokio::test]
async fn test_backend_5xx_is_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let backend = common::start_programmable_backend(move |_| {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                (StatusCode::SERVICE_UNAVAILABLE, "try later")
            } else {
                (StatusCode::OK, "{}")
            }
        }
    })
    .await;

    exporter(&backend).try_export(&[LogEvent::warn("slow")]).await.unwrap();
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_backend_rejection_is_reported() {
    let backend = common::start_mock_backend(403, "permission denied").await;

    let err = exporter(&backend).try_export(&[LogEvent::info("x")]).await.unwrap_err();
    match err {
        ExportError::Rejected { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "permission denied");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_bad_key_never_calls_backend() {
    let backend = common::start_mock_backend(200, "{}").await;
    let mut credential = common::test_credential();
    credential.private_key = "not a pem".into();
    let exporter = CloudLoggingExporter::new(common::test_client(), credential, &export_config(&backend)).unwrap();

    let err = exporter.try_export(&[LogEvent::info("x")]).await.unwrap_err();
    assert!(matches!(err, ExportError::Credential(_)));
    assert_eq!(backend.hits(), 0);

    // Through the sink interface the failure is swallowed.
    exporter.export(vec![LogEvent::info("x")]).await;
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_unreachable_backend_is_swallowed_by_sink() {
    let mut config = ExportConfig::default();
    config.endpoint = "http://127.0.0.1:1/v2/entries:write".into();
    config.retries.steps = 2;
    config.retries.step_ms = 1;
    let exporter = CloudLoggingExporter::new(common::test_client(), common::test_credential(), &config).unwrap();

    let err = exporter.try_export(&[LogEvent::info("x")]).await.unwrap_err();
    assert!(matches!(err, ExportError::Fetch(_)));

    exporter.export(vec![LogEvent::info("x")]).await;
}

#[tokio::test]
async fn test_proxy_ships_request_logs() {
    let backend = common::start_mock_backend(200, "{}").await;
    let api = common::start_mock_backend(200, "ok").await;

    let mut config = common::proxy_config("http://127.0.0.1:1", &api.origin());
    config.export = export_config(&backend);
    config.service_account = Some(common::test_credential());
    let server = HttpServer::new(config).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = common::test_client();
    let res = client
        .get(format!("http://{addr}/nope"))
        .header(header::HOST, "segapi.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("http://{addr}/sek/v1/t"))
        .header(header::HOST, "segapi.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(10), handle).await.unwrap().unwrap().unwrap();

    let mut entries = Vec::new();
    for request in backend.requests() {
        verify_bearer(&request);
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        entries.extend(body["entries"].as_array().unwrap().clone());
    }
    // Batches from different requests may arrive in either order.
    let mut severities: Vec<&str> = entries.iter().map(|e| e["severity"].as_str().unwrap()).collect();
    severities.sort_unstable();
    assert_eq!(severities, ["DEBUG", "INFO"]);
    let summary = entries.iter().find(|e| e["severity"] == "INFO").unwrap();
    assert_eq!(summary["jsonPayload"]["route"], "api");
}
