//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → Service identified
//!     → pool.rs (service registry, one balancer per service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through backends)
//!         - least_conn.rs (pick backend with fewest in-flight requests)
//!     → backend.rs (claim an in-flight slot via guard)
//!     → Guard dropped when the request finishes → slot released
//! ```
//!
//! # Design Decisions
//! - Each balancer owns its fixed backend set
//! - Selection and the in-flight increment happen together inside `next`
//! - Algorithms are looked up by name in `ALGORITHMS`; adding one means adding a row

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod round_robin;

use std::sync::Arc;

use thiserror::Error;

use crate::load_balancer::backend::{Backend, BackendConnectionGuard};
use crate::load_balancer::least_conn::LeastConnections;
use crate::load_balancer::round_robin::RoundRobin;

/// A backend selection strategy bound to one service's backends.
pub trait Balancer: Send + Sync + std::fmt::Debug {
    /// Select a backend and claim an in-flight slot on it.
    /// Returns `None` when the backend set is empty.
    fn next(&self) -> Option<BackendConnectionGuard>;

    /// Identifier this strategy is registered under.
    fn algorithm(&self) -> &'static str;

    /// Backends in registration order.
    fn backends(&self) -> &[Arc<Backend>];
}

/// Error creating a balancer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalancerError {
    #[error("unknown balancing algorithm {0:?}")]
    UnknownAlgorithm(String),
}

type Constructor = fn(Vec<Arc<Backend>>) -> Box<dyn Balancer>;

/// Registered strategies, by configuration name.
pub const ALGORITHMS: &[(&str, Constructor)] = &[
    (RoundRobin::NAME, build_round_robin),
    (LeastConnections::NAME, build_least_connections),
];

fn build_round_robin(backends: Vec<Arc<Backend>>) -> Box<dyn Balancer> {
    Box::new(RoundRobin::new(backends))
}

fn build_least_connections(backends: Vec<Arc<Backend>>) -> Box<dyn Balancer> {
    Box::new(LeastConnections::new(backends))
}

/// Names accepted by [`new_balancer`].
pub fn algorithm_names() -> impl Iterator<Item = &'static str> {
    ALGORITHMS.iter().map(|(name, _)| *name)
}

/// Construct the balancer registered under `algorithm`.
pub fn new_balancer(
    algorithm: &str,
    backends: Vec<Arc<Backend>>,
) -> Result<Box<dyn Balancer>, BalancerError> {
    ALGORITHMS
        .iter()
        .find(|(name, _)| *name == algorithm)
        .map(|(_, construct)| construct(backends))
        .ok_or_else(|| BalancerError::UnknownAlgorithm(algorithm.to_string()))
}
