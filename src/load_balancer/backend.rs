//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream instance of a service
//! - Track in-flight requests (for Least Connections LB)
//! - Release the in-flight slot exactly once through a RAII guard

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use url::Url;

/// Error building a backend from its configured URL.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {scheme:?} in backend URL {url:?} (expected http or https)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("backend URL {0:?} has no host")]
    MissingHost(String),
}

/// A single upstream server.
#[derive(Debug)]
pub struct Backend {
    /// Forwarding target. Scheme, authority and base path are applied to each request.
    pub url: Url,
    /// Static weight. Stored for configuration, not consulted by any strategy.
    pub weight: u32,
    /// Number of requests currently in flight.
    active_connections: AtomicUsize,
}

impl Backend {
    /// Parse and validate a backend URL.
    pub fn parse(raw: &str, weight: u32) -> Result<Self, BackendError> {
        let url = Url::parse(raw).map_err(|source| BackendError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(BackendError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: url.scheme().to_string(),
            });
        }
        if url.host_str().is_none() {
            return Err(BackendError::MissingHost(raw.to_string()));
        }

        Ok(Self {
            url,
            weight,
            active_connections: AtomicUsize::new(0),
        })
    }

    /// Current number of in-flight requests.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Claim an in-flight slot. The slot is released when the guard drops.
    pub fn acquire(self: &Arc<Self>) -> BackendConnectionGuard {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        BackendConnectionGuard {
            backend: Arc::clone(self),
        }
    }

    fn release(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A RAII guard holding one in-flight slot on a backend.
#[derive(Debug)]
pub struct BackendConnectionGuard {
    backend: Arc<Backend>,
}

impl Deref for BackendConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendConnectionGuard {
    fn drop(&mut self) {
        self.backend.release();
    }
}
