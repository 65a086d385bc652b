//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router; every path and method goes to one handler
//! - Wire up middleware (request tracing)
//! - Bind the server to a listener and drain on shutdown
//! - Drive each exchange: authenticate, dump, resolve, forward
//! - Observability (latency log, request metrics)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::dump::{DumpSink, Dumper, TracingSink};
use crate::error::GatewayError;
use crate::http::request::outbound_body;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::proxy::{Dispatcher, Egress};
use crate::routing::RoutingDirective;
use crate::security::Authenticator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub auth: Authenticator,
    pub dumper: Dumper,
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the forwarding gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a server that writes dumps to the log.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create a server with an explicit dump destination.
    pub fn with_sink(config: GatewayConfig, sink: Arc<dyn DumpSink>) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);

        let auth = Authenticator::new(config.auth.secret.as_deref());
        if !auth.is_enabled() {
            tracing::warn!("No proxy secret configured; every request is accepted");
        }

        let dumper = Dumper::new(&config.dump, sink);
        let egress = Egress::from_config(&config.upstream)?;
        // Only the wait for response headers is bounded; relayed bodies are not cut off.
        let header_timeout = config.timeouts.request_secs.map(Duration::from_secs);

        let state = AppState {
            config: config.clone(),
            auth,
            dumper: dumper.clone(),
            dispatcher: Arc::new(Dispatcher::new(egress, dumper, header_timeout)),
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight exchanges.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy server is running");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Entry point for every inbound request.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match forward(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            e.log();
            e.into_response()
        }
    };

    let status = response.status().as_u16();
    tracing::info!(
        method = %method,
        path = %path,
        status,
        latency = ?start.elapsed(),
        "Latency"
    );
    metrics::record_request(method.as_str(), status, start);
    response
}

async fn forward(state: &AppState, request: Request<Body>) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();

    // Rejected callers are dumped without their body, which is never read.
    let authorized = state
        .auth
        .authenticate(RoutingDirective::from_headers(&parts.headers).credential());
    if !authorized {
        state.dumper.request(&parts, None);
        return Err(GatewayError::Unauthorized);
    }

    let limit = state
        .dumper
        .includes_body()
        .then_some(state.config.dump.max_body_bytes);
    let body = outbound_body(body, limit).await?;
    state.dumper.request(&parts, body.buffered());

    let target = RoutingDirective::from_headers(&parts.headers).resolve_target()?;
    tracing::debug!(target = %target, method = %parts.method, uri = %parts.uri, "Forwarding request");

    let session = state.dispatcher.open(parts, body, &target)?;
    session.relay().await
}
