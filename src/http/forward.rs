//! Outbound forwarding engine.
//!
//! # Responsibilities
//! - Rewrite the request target to the selected backend
//! - Send the request upstream over plain HTTP or TLS
//! - Bound the wait for the response head and for every body frame after it
//! - Stream the backend response back without buffering
//!
//! # Design Decisions
//! - Method, headers, query and body are preserved; only scheme, authority
//!   and base path change
//! - Hop-by-hop headers stripped in both directions
//! - Upstream requests are always HTTP/1.1

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, Response, Uri, Version};
use futures_util::future::{BoxFuture, FutureExt};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use thiserror::Error;
use tower_http::timeout::TimeoutBody;
use url::Url;

use crate::config::TimeoutConfig;

/// Headers that only apply to a single connection.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
];

/// Error forwarding a request upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream URI: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("invalid upstream host header: {0}")]
    InvalidHost(#[from] axum::http::header::InvalidHeaderValue),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Sends a request to a backend and returns its response.
pub trait Forwarder: Send + Sync {
    fn forward(
        &self,
        request: Request<Body>,
        target: &Url,
    ) -> BoxFuture<'static, Result<Response<Body>, ForwardError>>;
}

/// Forwarder backed by a pooled hyper client.
///
/// `timeout` bounds the wait for the response head and, once streaming, the
/// gap between two body frames. A stalled body ends in an error, which drops
/// the response and whatever was attached to it.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let timeout = Duration::from_secs(timeouts.read_secs);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        connector.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .build(connector);

        Self { client, timeout }
    }
}

impl Forwarder for HttpForwarder {
    fn forward(
        &self,
        request: Request<Body>,
        target: &Url,
    ) -> BoxFuture<'static, Result<Response<Body>, ForwardError>> {
        let prepared = prepare_request(request, target);
        let client = self.client.clone();
        let timeout = self.timeout;

        async move {
            let request = prepared?;
            let response = tokio::time::timeout(timeout, client.request(request))
                .await
                .map_err(|_| ForwardError::Timeout(timeout))??;

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            let body = TimeoutBody::new(timeout, body);
            Ok::<_, ForwardError>(Response::from_parts(parts, Body::new(body)))
        }
        .boxed()
    }
}

/// Point `request` at `target`, keeping everything the client sent.
pub fn prepare_request(request: Request<Body>, target: &Url) -> Result<Request<Body>, ForwardError> {
    let (mut parts, body) = request.into_parts();

    parts.uri = rewrite_uri(target, &parts.uri)?;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);
    parts
        .headers
        .insert(header::HOST, HeaderValue::from_str(&authority(target))?);

    Ok(Request::from_parts(parts, body))
}

/// Join the backend URL with the request path and query.
pub fn rewrite_uri(target: &Url, uri: &Uri) -> Result<Uri, ForwardError> {
    let path = join_paths(target.path(), uri.path());

    let target_query = target.query().filter(|q| !q.is_empty());
    let request_query = uri.query().filter(|q| !q.is_empty());
    let query = match (target_query, request_query) {
        (Some(t), Some(r)) => format!("?{}&{}", t, r),
        (Some(q), None) | (None, Some(q)) => format!("?{}", q),
        (None, None) => String::new(),
    };

    let uri = format!("{}://{}{}{}", target.scheme(), authority(target), path, query);
    Ok(uri.parse()?)
}

fn authority(target: &Url) -> String {
    let host = target.host_str().unwrap_or_default();
    match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Join two paths with exactly one `/` between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in &listed {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}
