//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile ordered route configuration into a routing tree
//! - Resolve a request path to a live `Service`
//! - Return an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routes naming an unregistered service are rejected at construction

use std::sync::Arc;

use thiserror::Error;

use crate::config::RouteConfig;
use crate::load_balancer::pool::{Service, ServiceRegistry};
use crate::routing::tree::{PatternError, RouteTree};

/// Error building the router.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("route {pattern:?} references unknown service {service:?}")]
    UnknownService { pattern: String, service: String },
}

/// Routing tree bound to the service registry.
#[derive(Debug)]
pub struct Router {
    tree: RouteTree<String>,
    services: Arc<ServiceRegistry>,
}

impl Router {
    /// Build the router from ordered routes and the already-built services.
    pub fn new(routes: &[RouteConfig], services: Arc<ServiceRegistry>) -> Result<Self, RouteError> {
        if let Some(route) = routes.iter().find(|r| !services.contains(&r.service)) {
            return Err(RouteError::UnknownService {
                pattern: route.path.clone(),
                service: route.service.clone(),
            });
        }

        let tree = RouteTree::from_patterns(
            routes.iter().map(|r| (r.path.as_str(), r.service.clone())),
        )?;

        tracing::debug!("Routing tree:\n{}", tree);

        Ok(Self { tree, services })
    }

    /// Resolve `path` to a service. Both the tree lookup and the registry
    /// lookup must succeed.
    pub fn match_path(&self, path: &str) -> Option<&Arc<Service>> {
        let name = self.tree.search(path)?;
        self.services.get(name)
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }
}
