//! Outbound data sources.
//!
//! A [`Source`] is a named, configured HTTP endpoint. It owns a request
//! [`Template`], a [`Transport`] and an [`Execute`] strategy, and exposes a
//! single operation, [`Source::query`].
//!
//! ```rust,no_run
//! use svcbase::{RequestSpec, Source, options};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let users = Source::new("users", "v1", "https://api.example.com/users")?;
//! users.set_options([options::set_basic_auth("svc", "secret")]);
//!
//! let bytes = users.query(RequestSpec::new().query_pair("page", "2")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Deadlines
//!
//! Every query is bounded by [`SourceConfig::query_ceiling`] (5 s by
//! default). A caller deadline passed to [`Source::query_before`] can only
//! tighten that bound, never loosen it. The bound wraps the whole executor,
//! so a custom executor that ignores its deadline is still cut off.
//!
//! # Failure reporting
//!
//! Failures are reported centrally: each failed query calls the configured
//! [`Logger`]'s `debug` once and the configured [`Counter`] once, whichever
//! executor is installed.
//!
//! # Reconfiguration
//!
//! Settings live behind an [`ArcSwap`]. [`Source::set_options`] publishes a
//! new snapshot; a query in flight keeps the snapshot it started with.

mod config;
mod execute;
pub mod options;
mod spec;

pub use config::{MAX_QUERY_CEILING, SourceConfig};
pub use execute::{Call, DefaultExecute, Execute, FnExecute, execute_fn};
pub use options::SourceOption;
pub use spec::{Credentials, RequestSpec, Template};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use bytes::Bytes;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::counter::Counter;
use crate::error::{ConfigError, RequestError};
use crate::log::{Fields, Logger};
use crate::transport::{HyperTransport, Transport};

/// Mutable part of a source. Replaced as a whole on every reconfiguration.
#[derive(Clone)]
struct Settings {
    template: Template,
    transport: Arc<dyn Transport>,
    executor: Arc<dyn Execute>,
    logger: Option<Arc<dyn Logger>>,
    counter: Option<Arc<dyn Counter>>,
}

/// A named outbound HTTP data source.
pub struct Source {
    name: String,
    tag: String,
    config: SourceConfig,
    settings: ArcSwap<Settings>,
}

impl Source {
    /// Builds a source for `endpoint` with default policy.
    ///
    /// Fails when `endpoint` is not an absolute `http`/`https` URL with a host.
    pub fn new(name: impl Into<String>, tag: impl Into<String>, endpoint: &str) -> Result<Self, ConfigError> {
        Self::with_config(name, tag, endpoint, SourceConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        tag: impl Into<String>,
        endpoint: &str,
        config: SourceConfig,
    ) -> Result<Self, ConfigError> {
        let url = parse_endpoint(endpoint)?;
        let name = name.into();

        debug!(source = %name, endpoint = %url, "source created");

        let settings = Settings {
            template: Template::new(url),
            transport: Arc::new(HyperTransport::from_config(&config)),
            executor: Arc::new(DefaultExecute),
            logger: None,
            counter: None,
        };

        Ok(Self {
            name,
            tag: tag.into(),
            config,
            settings: ArcSwap::from_pointee(settings),
        })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn tag(&self) -> &str { &self.tag }
    pub fn config(&self) -> &SourceConfig { &self.config }

    /// The configured endpoint.
    pub fn endpoint(&self) -> Url {
        self.settings.load().template.url.clone()
    }

    /// A copy of the current template.
    pub fn template(&self) -> Template {
        self.settings.load().template.clone()
    }

    /// Applies `options` in order and publishes the result atomically.
    pub fn set_options(&self, options: impl IntoIterator<Item = SourceOption>) {
        let options: Vec<SourceOption> = options.into_iter().collect();
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            for option in &options {
                option.apply(&mut next);
            }
            next
        });
    }

    /// Shorthand for `set_options([options::set_basic_auth(..)])`.
    pub fn set_basic_auth(&self, username: impl Into<String>, password: impl Into<String>) {
        self.set_options([options::set_basic_auth(username, password)]);
    }

    /// Performs one request, bounded by the query ceiling.
    pub async fn query(&self, spec: RequestSpec) -> Result<Bytes, RequestError> {
        self.run(None, spec).await
    }

    /// Like [`query`](Source::query), finishing by `deadline` or the
    /// ceiling, whichever comes first.
    pub async fn query_before(&self, deadline: Instant, spec: RequestSpec) -> Result<Bytes, RequestError> {
        self.run(Some(deadline), spec).await
    }

    async fn run(&self, caller_deadline: Option<Instant>, spec: RequestSpec) -> Result<Bytes, RequestError> {
        let settings = self.settings.load_full();

        let started = Instant::now();
        let deadline = effective_deadline(started, self.config.query_ceiling(), caller_deadline);

        let query_pairs = spec.query_pairs().map(<[_]>::to_vec);
        let call = Call {
            deadline,
            template: &settings.template,
            transport: settings.transport.as_ref(),
        };

        let result = match tokio::time::timeout_at(deadline, settings.executor.execute(call, spec)).await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Timeout(deadline.saturating_duration_since(started))),
        };

        if let Err(err) = &result {
            let pairs = query_pairs.as_deref().unwrap_or(&settings.template.query);
            self.report_failure(&settings, err, pairs);
        }
        result
    }

    fn report_failure(&self, settings: &Settings, err: &RequestError, query: &[(String, String)]) {
        debug!(source = %self.name, tag = %self.tag, error = %err, "query failed");

        if let Some(logger) = &settings.logger {
            let mut context = Fields::new();
            context.insert("err".to_owned(), Value::String(err.to_string()));
            context.insert("urlValues".to_owned(), url_values(query));
            context.insert("source".to_owned(), Value::String(self.name.clone()));
            logger.debug("Failed Request", &context);
        }
        if let Some(counter) = &settings.counter {
            counter.increment();
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("endpoint", &self.settings.load().template.url.as_str())
            .field("config", &self.config)
            .finish()
    }
}

/// `min(caller, started + ceiling)`, without overflowing the clock.
fn effective_deadline(started: Instant, ceiling: Duration, caller: Option<Instant>) -> Instant {
    match (started.checked_add(ceiling), caller) {
        (Some(ceiling), Some(caller)) => caller.min(ceiling),
        (Some(ceiling), None) => ceiling,
        // Only when the clock sits within `ceiling` of its representable end.
        (None, caller) => caller.unwrap_or(started),
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint).map_err(|reason| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        reason,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            endpoint: endpoint.to_owned(),
            scheme: url.scheme().to_owned(),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingHost { endpoint: endpoint.to_owned() });
    }
    Ok(url)
}

/// Query parameters as `{"name": ["v1", "v2"]}`.
fn url_values(query: &[(String, String)]) -> Value {
    let mut values = serde_json::Map::new();
    for (name, value) in query {
        let entry = values.entry(name.clone()).or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            list.push(Value::String(value.clone()));
        }
    }
    Value::Object(values)
}
