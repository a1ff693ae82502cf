//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the request path to a service
//! - Ask the service's balancer for a backend
//! - Forward and hand the response back
//! - Release the backend slot exactly once when the request is done
//!
//! # Design Decisions
//! - The slot is a guard moved into the response body, so it is released when
//!   the body finishes streaming or the client goes away
//! - On forward errors the guard is dropped before the error response is built
//! - No retries

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;

use crate::http::forward::Forwarder;
use crate::http::response::DispatchError;
use crate::load_balancer::backend::BackendConnectionGuard;
use crate::routing::Router;

/// Binds router, balancers and the forwarding engine.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    forwarder: Arc<dyn Forwarder>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, forwarder: Arc<dyn Forwarder>) -> Self {
        Self { router, forwarder }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Route, select a backend and forward one request.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>, DispatchError> {
        let service = self
            .router
            .match_path(request.uri().path())
            .ok_or_else(|| DispatchError::NoRoute(request.uri().path().to_string()))?;

        let slot = service
            .next_backend()
            .ok_or_else(|| DispatchError::NoBackend(service.name().to_string()))?;

        tracing::debug!(
            service = %service.name(),
            algorithm = service.balancer().algorithm(),
            backend = %slot.url,
            in_flight = slot.active_connections(),
            "Backend selected"
        );

        let response = self
            .forwarder
            .forward(request, &slot.url)
            .await
            .map_err(|source| DispatchError::Forward {
                backend: slot.url.to_string(),
                source,
            })?;

        Ok(response.map(|body| hold_until_complete(body, slot)))
    }
}

/// Tie the backend slot to the lifetime of the response body.
fn hold_until_complete(body: Body, slot: BackendConnectionGuard) -> Body {
    Body::new(body.map_frame(move |frame| {
        let _slot = &slot;
        frame
    }))
}
