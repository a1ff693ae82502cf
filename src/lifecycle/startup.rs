//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every service (backends + balancer) from configuration
//! - Compile routes against the service registry
//! - Assemble the forwarding engine and HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, there is no degraded mode
//! - Subsystems initialize in order: services, routes, server

use std::sync::Arc;

use thiserror::Error;

use crate::config::RelayConfig;
use crate::http::forward::{Forwarder, HttpForwarder};
use crate::http::HttpServer;
use crate::load_balancer::pool::{ServiceError, ServiceRegistry};
use crate::routing::{RouteError, Router};

/// Error that aborts startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build services: {0}")]
    Service(#[from] ServiceError),

    #[error("failed to build routes: {0}")]
    Route(#[from] RouteError),
}

/// Build the server with the default HTTP forwarding engine.
pub fn build_server(config: RelayConfig) -> Result<HttpServer, StartupError> {
    let forwarder = Arc::new(HttpForwarder::new(&config.timeouts));
    build_server_with(config, forwarder)
}

/// Build the server around a given forwarding engine.
pub fn build_server_with(
    config: RelayConfig,
    forwarder: Arc<dyn Forwarder>,
) -> Result<HttpServer, StartupError> {
    let services = Arc::new(ServiceRegistry::from_configs(&config.services)?);
    let routes = Arc::new(Router::new(&config.routes, services)?);

    tracing::info!(
        services = config.services.len(),
        routes = config.routes.len(),
        "Routing table built"
    );

    Ok(HttpServer::new(config, routes, forwarder))
}
