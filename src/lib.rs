//! # svcbase
//!
//! Building blocks for services that answer HTTP by asking other HTTP
//! services. Two pieces, nothing else.
//!
//! ## Outbound: data sources
//!
//! A [`Source`] is a named remote endpoint with a request template,
//! credentials, headers and a pluggable way of executing a call:
//!
//! - Every query is bounded: 5 s by default, a caller deadline can only tighten it
//! - Failures are logged and counted once, in one place, whatever the executor
//! - The transport and the executor are traits; swap either at runtime
//! - Reconfiguration is atomic; in-flight queries keep their snapshot
//!
//! ## Inbound: middleware
//!
//! A [`Chain`] wraps a terminal handler in an ordered list of middleware.
//! The first one registered sees the request first. Serving the result is
//! left to whatever server the application already runs: [`BoxedHandler`]
//! takes a [`Request`] and yields a [`Response`], which converts into an
//! `http::Response` with [`Response::into_http`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use svcbase::middleware::{self, Chain};
//! use svcbase::{JsonLogger, Request, RequestSpec, Response, Source, options};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Arc::new(Source::new("users", "v1", "https://api.example.com/users")?);
//!     users.set_options([
//!         options::set_basic_auth("svc", "secret"),
//!         options::set_logger(Arc::new(JsonLogger::new(std::io::stderr()))),
//!     ]);
//!
//!     let app = Chain::new([
//!         middleware::layer(middleware::trace::log_requests),
//!         middleware::layer(middleware::headers::json_cors),
//!     ])
//!     .run_fn(move |_req: Request| {
//!         let users = Arc::clone(&users);
//!         async move {
//!             match users.query(RequestSpec::new()).await {
//!                 Ok(bytes) => Response::json(bytes.to_vec()),
//!                 Err(_) => Response::status(http::StatusCode::BAD_GATEWAY),
//!             }
//!         }
//!     });
//!
//!     let res = app.call(Request::new(svcbase::Method::Get, "/users")).await;
//!     println!("{}", res.status_code());
//!     Ok(())
//! }
//! ```

mod counter;
mod error;
mod handler;
mod log;
mod method;
mod registry;
mod request;
mod response;
mod source;

pub mod middleware;
pub mod transport;

pub use counter::Counter;
pub use error::{BoxError, ConfigError, RequestError, UnsupportedMethod};
pub use handler::{BoxedHandler, Handler, ResponseFuture};
pub use log::{Fields, JsonLogger, Logger, TracingLogger};
pub use method::Method;
pub use middleware::Chain;
pub use registry::SourceRegistry;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use source::options;
pub use source::{
    Call, Credentials, DefaultExecute, Execute, FnExecute, MAX_QUERY_CEILING, RequestSpec, Source, SourceConfig,
    SourceOption, Template, execute_fn,
};
pub use transport::{HyperTransport, Transport, transport_fn};
