//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID, body limit)
//! - Gate, dispatch and forward each request
//! - Hand request logs to the shared buffer and schedule their shipping
//! - Drain background work on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::client::{UpstreamClient, UpstreamRequest};
use crate::http::error::ProxyError;
use crate::http::request::{buffer_body, request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{self, public_api_host, UpstreamReply};
use crate::lifecycle::startup;
use crate::lifecycle::BackgroundTasks;
use crate::observability::{metrics, LogBuffer, LogEvent, RequestLog};
use crate::resilience::{BackoffPolicy, InvalidPolicy};
use crate::routing::matcher::{redact_first_segment, request_host};
use crate::routing::{RouteDecision, RouteKind, Router as ProxyRouter};
use crate::security::headers::forwarded_request_headers;

/// The server could not be assembled from its configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream origin: {0}")]
    Origin(#[from] url::ParseError),

    #[error(transparent)]
    Policy(#[from] InvalidPolicy),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub upstream: UpstreamClient,
    pub log_buffer: Arc<LogBuffer>,
    pub tasks: BackgroundTasks,
    pub public_api_host: Option<String>,
    pub max_body_size: usize,
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server whose logs go where `config` says.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let client = startup::upstream_client()?;
        let log_buffer = startup::log_buffer(&config, client.clone())?;
        Self::with_log_buffer(config, client, log_buffer)
    }

    /// Create a server around an existing client and log buffer.
    pub fn with_log_buffer(
        config: ProxyConfig,
        client: reqwest::Client,
        log_buffer: Arc<LogBuffer>,
    ) -> Result<Self, ServerError> {
        let router = Arc::new(ProxyRouter::from_config(&config.routing)?);
        let policy = BackoffPolicy::try_from(&config.retries)?;

        let state = AppState {
            router,
            upstream: UpstreamClient::new(client, policy),
            log_buffer,
            tasks: BackgroundTasks::new(),
            public_api_host: config.routing.public_api_host.clone(),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size)),
            )
    }

    /// The assembled router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain background work and flush logs.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(pending = self.state.tasks.len(), "HTTP server stopped, draining background tasks");
        let deadline = Duration::from_secs(self.config.timeouts.drain_secs);
        let drained = self.state.tasks.drain(deadline).await;

        let flushed = self.state.log_buffer.flush().await;
        tracing::info!(drained, flushed, "Final log flush complete");
        Ok(())
    }
}

/// Span for one inbound request. The path is left out since it carries the secret.
fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        version = ?request.version(),
        request_id = %request_id(request),
    )
}

/// Main proxy handler.
///
/// The request runs on its own tracked task so a client disconnect never
/// abandons an upstream call that is already in flight, and shutdown still
/// waits for it.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let task = state.tasks.spawn_tracked(handle_request(state.clone(), request));
    match task.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request task failed");
            response::internal_error()
        }
    }
}

/// Gate on the secret segment, dispatch by subdomain and forward.
async fn handle_request(state: AppState, request: Request<Body>) -> Response {
    let start = Instant::now();
    let mut log = RequestLog::new(request_id(&request));
    let method = request.method().clone();
    let host = request_host(&request);

    let decision = state.router.decide(host.as_deref(), request.uri().path());

    let (response, upstream_path) = match &decision {
        RouteDecision::Unauthorized => {
            log.record(
                LogEvent::debug("Rejected request without secret prefix")
                    .with("method", method.as_str())
                    .with("path", redact_first_segment(request.uri().path())),
            );
            (response::unauthorized(), None)
        }
        RouteDecision::NotFound => (response::not_found(), None),
        RouteDecision::Forward { kind, path } => {
            let response = match forward(&state, *kind, path, host.as_deref(), request).await {
                Ok(response) => response,
                Err(e) => {
                    log.record(LogEvent::error("Proxy request failed").with_metadata(e.metadata()));
                    response::internal_error()
                }
            };
            (response, Some(path.as_str()))
        }
    };

    let status = response.status().as_u16();
    metrics::record_request(decision.label(), status, start);

    if decision != RouteDecision::Unauthorized {
        log.record(
            LogEvent::info("Request completed")
                .with("method", method.as_str())
                .with("host", host.as_deref().unwrap_or_default())
                .with("path", upstream_path.unwrap_or_default())
                .with("route", decision.label())
                .with("status", status)
                .with("duration_ms", start.elapsed().as_millis() as u64),
        );
    }

    ship_logs(&state, log);
    response
}

/// Serve a routed request from its upstream.
async fn forward(
    state: &AppState,
    kind: RouteKind,
    path: &str,
    host: Option<&str>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let target = state.router.target(kind, path, parts.uri.query());

    let body = match kind {
        RouteKind::Cdn => Bytes::new(),
        RouteKind::Api => buffer_body(body, state.max_body_size)
            .await
            .map_err(ProxyError::InboundBody)?,
    };
    let headers = forwarded_request_headers(&parts.headers, kind == RouteKind::Cdn);
    let upstream = UpstreamRequest::new(parts.method, target, headers, body);

    let reply = state.upstream.send(&upstream).await?;
    let reply = UpstreamReply::read(reply).await.map_err(ProxyError::ReadBody)?;

    match kind {
        RouteKind::Api => Ok(reply.into_response()),
        RouteKind::Cdn => {
            let public_host = public_api_host(
                state.public_api_host.as_deref(),
                state.router.api_subdomain(),
                host,
            );
            let reply = reply.into_settings(&public_host, state.router.secret().as_str())?;
            Ok(reply.into_response())
        }
    }
}

/// Append the request's events and flush them after the response is sent.
fn ship_logs(state: &AppState, log: RequestLog) {
    state.log_buffer.append(log.into_events());
    let buffer = Arc::clone(&state.log_buffer);
    state.tasks.spawn(async move {
        buffer.flush().await;
    });
}
