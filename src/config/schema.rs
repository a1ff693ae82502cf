//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listen address and port.
    pub global: GlobalConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Service definitions, each with its own balancer.
    pub services: Vec<ServiceConfig>,

    /// Ordered route definitions. For duplicate patterns the last one wins.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Listen address (e.g., "127.0.0.1").
    pub addr: String,

    /// Listen port.
    pub port: u16,
}

impl GlobalConfig {
    /// `addr:port` as accepted by `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Timeout configuration. Applies to every route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Read timeout in seconds. Bounds the wait for the backend's response
    /// head, the gap between two frames of its body, and the gap between two
    /// frames of an inbound request body.
    pub read_secs: u64,

    /// Time allowed to produce the response head for the client, in seconds.
    pub write_secs: u64,

    /// Idle pooled upstream connections are closed after this many seconds.
    /// Inbound keep-alive connections are not bounded by it.
    pub idle_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            write_secs: 30,
            idle_secs: 120,
            shutdown_grace_secs: 15,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A named service balanced over a fixed set of backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service name, referenced by routes.
    pub name: String,

    /// Balancing algorithm (default: round_robin).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Backend URLs, in selection order.
    #[serde(default)]
    pub backends: Vec<BackendEntry>,
}

fn default_algorithm() -> String {
    "round_robin".to_string()
}

/// A backend given either as a bare URL or as a table with a weight.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BackendEntry {
    Url(String),
    Weighted {
        url: String,
        #[serde(default = "default_weight")]
        weight: u32,
    },
}

impl BackendEntry {
    pub fn url(&self) -> &str {
        match self {
            BackendEntry::Url(url) => url,
            BackendEntry::Weighted { url, .. } => url,
        }
    }

    pub fn weight(&self) -> u32 {
        match self {
            BackendEntry::Url(_) => default_weight(),
            BackendEntry::Weighted { weight, .. } => *weight,
        }
    }
}

impl From<&str> for BackendEntry {
    fn from(url: &str) -> Self {
        BackendEntry::Url(url.to_string())
    }
}

fn default_weight() -> u32 {
    1
}

/// Route mapping a path pattern to a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// `/`-delimited pattern; `*` matches any one segment.
    pub path: String,

    /// Service name to forward to.
    pub service: String,
}
