//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;

use edge_proxy::auth::ServiceAccountKey;
use edge_proxy::config::ProxyConfig;
use edge_proxy::http::HttpServer;
use edge_proxy::lifecycle::Shutdown;
use edge_proxy::observability::{LogBuffer, LogEvent, LogSink, Severity};

pub const TEST_KEY_PEM: &str = include_str!("../fixtures/test_key.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/test_key.pub.pem");

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A running mock backend and everything it received.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

type BoxResponse = Pin<Box<dyn Future<Output = Response> + Send>>;
type Handler = Arc<dyn Fn(RecordedRequest) -> BoxResponse + Send + Sync>;

#[derive(Clone)]
struct BackendState {
    handler: Handler,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn backend_handler(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method,
        uri,
        headers,
        body,
    };
    state.requests.lock().unwrap().push(request.clone());
    (state.handler)(request).await
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut, R>(f: F) -> MockBackend
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    let f = Arc::new(f);
    let handler: Handler = Arc::new(move |request| -> BoxResponse {
        let f = f.clone();
        Box::pin(async move { f(request).await.into_response() })
    });
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        handler,
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/", any(backend_handler))
        .route("/{*path}", any(backend_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, requests }
}

/// Start a mock backend that returns a fixed response.
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockBackend {
    start_programmable_backend(move |_| async move {
        (StatusCode::from_u16(status).unwrap(), body)
    })
    .await
}

/// Sink that keeps every exported event in order.
#[derive(Debug, Default)]
pub struct CapturingSink {
    events: Mutex<Vec<LogEvent>>,
}

impl CapturingSink {
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.events().iter().filter(|e| e.severity() == severity).count()
    }
}

#[async_trait]
impl LogSink for CapturingSink {
    async fn export(&self, batch: Vec<LogEvent>) {
        self.events.lock().unwrap().extend(batch);
    }
}

/// Proxy config pointing both legs at local mocks, with fast retries.
pub fn proxy_config(cdn_origin: &str, api_origin: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.routing.secret_prefix = "sek".into();
    config.routing.cdn_origin = cdn_origin.into();
    config.routing.api_origin = api_origin.into();
    config.retries.steps = 3;
    config.retries.step_ms = 1;
    config.timeouts.drain_secs = 5;
    config
}

/// A running proxy wired to a capturing sink.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub sink: Arc<CapturingSink>,
    pub shutdown: Shutdown,
    handle: tokio::task::JoinHandle<()>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop the proxy and wait for its final log flush.
    pub async fn stop(self) -> Arc<CapturingSink> {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(10), self.handle).await;
        self.sink
    }
}

pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let sink = Arc::new(CapturingSink::default());
    let buffer = Arc::new(LogBuffer::new(sink.clone(), Severity::Debug));
    let server = HttpServer::with_log_buffer(config, test_client(), buffer).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        sink,
        shutdown,
        handle,
    }
}

/// Non-pooled client that never follows redirects.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn test_credential() -> ServiceAccountKey {
    ServiceAccountKey {
        client_email: "edge-proxy@edge-logs.iam.gserviceaccount.com".into(),
        private_key: TEST_KEY_PEM.into(),
        private_key_id: "test-key-1".into(),
        project_id: "edge-logs".into(),
    }
}
