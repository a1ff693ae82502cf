//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → request.rs (request ID)
//!     → dispatch.rs (route → service → backend slot)
//!     → forward.rs (rewrite target, send upstream, stream response)
//!     → response.rs (map failures to status codes)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::Dispatcher;
pub use forward::{ForwardError, Forwarder, HttpForwarder};
pub use request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use response::DispatchError;
pub use server::{HttpServer, ServerError};
