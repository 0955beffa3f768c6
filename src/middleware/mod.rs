//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: response headers, structured request logging,
//! authentication-header inspection.
//!
//! A middleware is a function from handler to handler. A [`Chain`] holds an
//! ordered list of them and wraps a terminal handler so that the **first
//! registered middleware is outermost**: it sees the request first and the
//! response last.
//!
//! ```rust
//! use svcbase::middleware::{self, Chain};
//! use svcbase::{Request, Response};
//!
//! async fn data(_req: Request) -> Response {
//!     Response::json(br#"{"ok":true}"#.to_vec())
//! }
//!
//! let chain = Chain::new([
//!     middleware::layer(middleware::trace::log_requests),
//!     middleware::layer(middleware::headers::json_cors),
//! ]);
//! let app = chain.run_fn(data);
//! ```

pub mod headers;
pub mod trace;

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// A handler-wrapping function.
pub type Middleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static>;

/// Wraps a plain function or closure as a [`Middleware`].
pub fn layer<F>(f: F) -> Middleware
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fallback used by [`Chain::run`] when no terminal handler is given.
///
/// Always answers `404 Not Found`.
pub async fn not_found(_req: Request) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}

/// An ordered middleware pipeline.
///
/// Append-only. Handlers produced by [`run`](Chain::run) are independent of
/// the chain afterwards: appending later does not change them.
#[derive(Clone)]
pub struct Chain {
    middleware: Vec<Middleware>,
    fallback: BoxedHandler,
}

impl Chain {
    pub fn new(middleware: impl IntoIterator<Item = Middleware>) -> Self {
        Self {
            middleware: middleware.into_iter().collect(),
            fallback: BoxedHandler::new(not_found),
        }
    }

    /// Replaces the handler returned by `run(None)`.
    pub fn with_fallback(mut self, fallback: impl Handler) -> Self {
        self.fallback = BoxedHandler::new(fallback);
        self
    }

    /// Adds middleware to the end of the chain (innermost position).
    pub fn append(&mut self, middleware: impl IntoIterator<Item = Middleware>) {
        self.middleware.extend(middleware);
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    pub fn fallback(&self) -> &BoxedHandler {
        &self.fallback
    }

    /// Wraps `terminal` with every registered middleware.
    ///
    /// `None` yields the fallback handler unchanged. With an empty chain the
    /// terminal handler itself is returned.
    pub fn run(&self, terminal: Option<BoxedHandler>) -> BoxedHandler {
        let Some(terminal) = terminal else {
            return self.fallback.clone();
        };
        self.middleware.iter().rev().fold(terminal, |next, mw| mw(next))
    }

    /// Like [`run`](Chain::run) for a plain async fn.
    pub fn run_fn(&self, terminal: impl Handler) -> BoxedHandler {
        self.run(Some(BoxedHandler::new(terminal)))
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new([])
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middleware", &self.middleware.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}
