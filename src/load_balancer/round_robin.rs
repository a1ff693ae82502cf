//! Round-robin load balancing strategy.

use std::sync::{Arc, Mutex, PoisonError};

use crate::load_balancer::{
    backend::{Backend, BackendConnectionGuard},
    Balancer,
};

/// Round-robin selector.
/// Rotates a cursor over the backends in registration order.
#[derive(Debug)]
pub struct RoundRobin {
    backends: Vec<Arc<Backend>>,
    cursor: Mutex<usize>,
}

impl RoundRobin {
    pub const NAME: &'static str = "round_robin";

    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            cursor: Mutex::new(0),
        }
    }
}

impl Balancer for RoundRobin {
    fn next(&self) -> Option<BackendConnectionGuard> {
        if self.backends.is_empty() {
            return None;
        }

        // The cursor read, advance and the slot claim happen under one lock so
        // concurrent callers never observe the same position.
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let backend = &self.backends[*cursor];
        *cursor = (*cursor + 1) % self.backends.len();
        Some(backend.acquire())
    }

    fn algorithm(&self) -> &'static str {
        Self::NAME
    }

    fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }
}
