//! Relay: a path-routing HTTP load balancer.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownOutcome};
