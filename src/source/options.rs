//! Runtime configuration of a source.
//!
//! Each option is a value describing one mutation. [`Source::set_options`]
//! applies them in order; applying the same option twice is harmless.
//!
//! [`Source::set_options`]: super::Source::set_options

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;

use super::Settings;
use super::execute::Execute;
use super::spec::Credentials;
use crate::counter::Counter;
use crate::log::Logger;
use crate::transport::Transport;

#[derive(Clone)]
pub enum SourceOption {
    BasicAuth(Credentials),
    Headers(HeaderMap),
    Logger(Arc<dyn Logger>),
    Metrics(Arc<dyn Counter>),
    Client(Arc<dyn Transport>),
    Execute(Arc<dyn Execute>),
}

impl SourceOption {
    pub(super) fn apply(&self, settings: &mut Settings) {
        match self {
            Self::BasicAuth(credentials) => settings.template.credentials = Some(credentials.clone()),
            Self::Headers(headers) => settings.template.headers = headers.clone(),
            Self::Logger(logger) => settings.logger = Some(Arc::clone(logger)),
            Self::Metrics(counter) => settings.counter = Some(Arc::clone(counter)),
            Self::Client(transport) => settings.transport = Arc::clone(transport),
            Self::Execute(executor) => settings.executor = Arc::clone(executor),
        }
    }
}

impl fmt::Debug for SourceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BasicAuth(credentials) => f.debug_tuple("BasicAuth").field(credentials).finish(),
            Self::Headers(headers) => f.debug_tuple("Headers").field(headers).finish(),
            Self::Logger(_) => f.write_str("Logger(..)"),
            Self::Metrics(_) => f.write_str("Metrics(..)"),
            Self::Client(_) => f.write_str("Client(..)"),
            Self::Execute(_) => f.write_str("Execute(..)"),
        }
    }
}

/// Credentials sent as basic auth on every query that does not override them.
pub fn set_basic_auth(username: impl Into<String>, password: impl Into<String>) -> SourceOption {
    SourceOption::BasicAuth(Credentials::new(username, password))
}

/// Replaces the template headers wholesale.
pub fn set_headers(headers: HeaderMap) -> SourceOption {
    SourceOption::Headers(headers)
}

pub fn set_logger(logger: Arc<dyn Logger>) -> SourceOption {
    SourceOption::Logger(logger)
}

pub fn set_metrics(counter: Arc<dyn Counter>) -> SourceOption {
    SourceOption::Metrics(counter)
}

/// Replaces the transport used by the default executor.
pub fn set_client(transport: Arc<dyn Transport>) -> SourceOption {
    SourceOption::Client(transport)
}

/// Replaces the executor; the default transport-backed behavior is bypassed.
pub fn set_execute(executor: Arc<dyn Execute>) -> SourceOption {
    SourceOption::Execute(executor)
}
