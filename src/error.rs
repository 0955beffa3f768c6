//! Error types.
//!
//! Two families, matching the two moments something can go wrong with a
//! [`Source`](crate::Source): building it ([`ConfigError`]) and calling it
//! ([`RequestError`]). Inbound middleware failures are expressed as HTTP
//! [`Response`](crate::Response) values, not as errors.

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Boxed error for failures raised by foreign transports and bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A source could not be constructed.
///
/// Returned by [`Source::new`](crate::Source::new). There is no way to obtain
/// a `Source` with a broken endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: url::ParseError },

    #[error("endpoint `{endpoint}` uses unsupported scheme `{scheme}` (expected http or https)")]
    UnsupportedScheme { endpoint: String, scheme: String },

    #[error("endpoint `{endpoint}` has no host")]
    MissingHost { endpoint: String },
}

/// An inbound request carried a method [`Method`](crate::Method) cannot represent
/// (WebDAV verbs, `PURGE`, ...).
#[derive(Debug, Error)]
#[error("unsupported request method `{0}`")]
pub struct UnsupportedMethod(pub http::Method);

/// A [`Source::query`](crate::Source::query) call failed.
///
/// Every variant is returned to the caller as a value; nothing is retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    /// The outgoing request could not be assembled.
    #[error("failed to build request: {0}")]
    Build(#[from] http::Error),

    /// The resolved URL is not a valid HTTP URI.
    #[error("invalid request url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: http::uri::InvalidUri },

    /// Connection, DNS or protocol failure inside the transport.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The call did not complete before its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with a non-2xx status.
    #[error("invalid response status {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// The response body could not be fully read.
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),

    /// Raised by custom executors that have no better variant.
    #[error("{0}")]
    Other(String),
}

impl RequestError {
    /// The HTTP status carried by the error, if the endpoint answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
