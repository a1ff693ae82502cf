//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{
    backend::{Backend, BackendConnectionGuard},
    Balancer,
};

/// Least connections selector.
/// Selects the backend with the fewest in-flight requests.
///
/// Counts are read one by one without a snapshot, so two concurrent callers
/// may both pick the same momentarily idle backend.
#[derive(Debug)]
pub struct LeastConnections {
    backends: Vec<Arc<Backend>>,
}

impl LeastConnections {
    pub const NAME: &'static str = "least_connections";

    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self { backends }
    }
}

impl Balancer for LeastConnections {
    fn next(&self) -> Option<BackendConnectionGuard> {
        // In case of tie, the first one is selected (stability)
        self.backends
            .iter()
            .min_by_key(|b| b.active_connections())
            .map(Backend::acquire)
    }

    fn algorithm(&self) -> &'static str {
        Self::NAME
    }

    fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }
}
