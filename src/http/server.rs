//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Dispatch requests to the routing engine
//! - Drain in-flight requests on shutdown, bounded by a grace period

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::dispatch::Dispatcher;
use crate::http::forward::Forwarder;
use crate::http::request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
use crate::http::response::DispatchError;
use crate::lifecycle::shutdown::ShutdownOutcome;
use crate::routing::Router as RelayRouter;

/// Error that stops the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// HTTP server for the relay.
pub struct HttpServer {
    app: Router,
    config: RelayConfig,
    routes: Arc<RelayRouter>,
}

impl HttpServer {
    /// Create a new HTTP server over an already-built router.
    pub fn new(config: RelayConfig, routes: Arc<RelayRouter>, forwarder: Arc<dyn Forwarder>) -> Self {
        let state = AppState {
            dispatcher: Dispatcher::new(routes.clone(), forwarder),
        };
        let app = Self::build_router(&config, state);
        Self { app, config, routes }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.write_secs)))
            .layer(RequestBodyTimeoutLayer::new(Duration::from_secs(config.timeouts.read_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn start(
        self,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<ShutdownOutcome, ServerError> {
        let address = self.config.global.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        self.run(listener, shutdown).await
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns once the server stopped: `Graceful` if every in-flight request
    /// finished within the grace period, `Forced` otherwise.
    ///
    /// On `Forced` the listener is closed but connections still being served
    /// are not cancelled; their tasks live until the runtime shuts down. The
    /// binary exits right after a forced shutdown, which ends them.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<ShutdownOutcome, ServerError> {
        let addr = listener.local_addr()?;
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        tracing::info!(
            address = %addr,
            services = self.routes.services().len(),
            "HTTP server starting"
        );

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let serve = axum::serve(listener, self.app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = drain_rx.await;
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => {
                result?;
                tracing::info!("HTTP server stopped");
                return Ok(ShutdownOutcome::Graceful);
            }
            _ = shutdown.recv() => {}
        }

        tracing::info!(grace_secs = grace.as_secs(), "Draining in-flight requests");
        let _ = drain_tx.send(());

        match tokio::time::timeout(grace, &mut serve).await {
            Ok(result) => {
                result?;
                tracing::info!("HTTP server stopped");
                Ok(ShutdownOutcome::Graceful)
            }
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "Grace period elapsed with requests in flight, forcing shutdown"
                );
                Ok(ShutdownOutcome::Forced)
            }
        }
    }

    /// The axum application, for in-process serving.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Get a reference to the routing table.
    pub fn routes(&self) -> &Arc<RelayRouter> {
        &self.routes
    }
}

fn make_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Main proxy handler.
/// Looks up route, selects backend, and forwards request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    match state.dispatcher.dispatch(request).await {
        Ok(response) => {
            tracing::debug!(status = %response.status(), "Proxied");
            response
        }
        Err(err) => {
            match &err {
                DispatchError::NoRoute(_) | DispatchError::NoBackend(_) => {
                    tracing::warn!(error = %err, "Request not proxied");
                }
                DispatchError::Forward { .. } => {
                    tracing::error!(error = %err, "Upstream error");
                }
            }
            err.into_response()
        }
    }
}
