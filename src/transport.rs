//! Transport: one HTTP exchange.
//!
//! The [`Transport`] trait is the seam between a [`Source`](crate::Source)
//! and the network. [`HyperTransport`] is the default: a pooled `hyper`
//! client speaking HTTP/1.1 and HTTP/2 over plain TCP or rustls. Tests and
//! embedders can substitute anything else, e.g. with [`transport_fn`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::error::BoxError;
use crate::source::SourceConfig;

/// A heap-allocated, type-erased `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Streaming response body. Dropping it releases the underlying connection.
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Outgoing request as handed to a [`Transport`].
pub type OutgoingRequest = http::Request<Full<Bytes>>;

/// Performs a single HTTP exchange.
///
/// Returns as soon as the response head is available; the body streams.
pub trait Transport: Send + Sync {
    fn send(&self, req: OutgoingRequest) -> BoxFuture<'_, Result<http::Response<ResponseBody>, BoxError>>;
}

// ── HyperTransport ────────────────────────────────────────────────────────────

/// Pooled `hyper` client with a per-exchange timeout.
#[derive(Clone, Debug)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl HyperTransport {
    /// `timeout` bounds the wait for the response head; `pool_max_idle_per_host`
    /// caps the idle connections kept for reuse.
    pub fn new(timeout: Duration, pool_max_idle_per_host: usize) -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .build(connector);

        Self { client, timeout }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.client_timeout(), config.pool_max_idle_per_host)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::from_config(&SourceConfig::default())
    }
}

impl Transport for HyperTransport {
    fn send(&self, req: OutgoingRequest) -> BoxFuture<'_, Result<http::Response<ResponseBody>, BoxError>> {
        Box::pin(async move {
            let res = tokio::time::timeout(self.timeout, self.client.request(req))
                .await
                .map_err(BoxError::from)?
                .map_err(BoxError::from)?;
            Ok(res.map(|body| body.map_err(BoxError::from).boxed_unsync()))
        })
    }
}

// ── Closure adapter ───────────────────────────────────────────────────────────

/// A [`Transport`] backed by a closure. Built by [`transport_fn`].
pub struct FnTransport<F>(F);

/// Adapts `Fn(OutgoingRequest) -> impl Future<Output = Result<Response, BoxError>>`
/// into a [`Transport`].
pub fn transport_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(OutgoingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<http::Response<ResponseBody>, BoxError>> + Send + 'static,
{
    FnTransport(f)
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(OutgoingRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<http::Response<ResponseBody>, BoxError>> + Send + 'static,
{
    fn send(&self, req: OutgoingRequest) -> BoxFuture<'_, Result<http::Response<ResponseBody>, BoxError>> {
        Box::pin((self.0)(req))
    }
}

/// Wraps a fully-buffered body as a [`ResponseBody`].
pub fn full_body(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed_unsync()
}
