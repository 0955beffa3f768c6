//! Outbound request descriptions.
//!
//! A [`Template`] is the fully-populated baseline a [`Source`](super::Source)
//! owns. A [`RequestSpec`] is what a caller passes per query: every field is
//! optional, and a field that is set replaces the template's field wholesale
//! (headers and query parameters are not unioned).

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, InvalidHeaderValue};
use http::{HeaderMap, HeaderValue};
use url::Url;

use crate::method::Method;

/// Username / password pair for HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    pub fn username(&self) -> &str { &self.username }
    pub fn password(&self) -> &str { &self.password }

    /// Basic auth is only sent when both halves are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `Basic <base64(username:password)>`, marked sensitive.
    pub fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::from_str(&format!("Basic {token}"))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The baseline request of a source.
#[derive(Clone, Debug)]
pub struct Template {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub query: Vec<(String, String)>,
    pub credentials: Option<Credentials>,
}

impl Template {
    /// `GET url` with JSON accept / content-type headers and nothing else.
    pub fn new(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Self::default_headers(),
            body: Bytes::new(),
            query: Vec::new(),
            credentials: None,
        }
    }

    pub fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// The URL with the query parameters appended to any it already has.
    pub fn request_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }
}

/// Per-call overrides for a [`Template`].
///
/// ```rust
/// use svcbase::{Method, RequestSpec};
///
/// let spec = RequestSpec::new()
///     .method(Method::Post)
///     .query_pair("page", "2")
///     .body(r#"{"name":"alice"}"#);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestSpec {
    method: Option<Method>,
    url: Option<Url>,
    headers: Option<HeaderMap>,
    body: Option<Bytes>,
    query: Option<Vec<(String, String)>>,
    credentials: Option<Credentials>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Replaces the template headers for this call.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the template query parameters for this call.
    pub fn query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query = Some(pairs.into_iter().collect());
        self
    }

    /// Adds one query parameter to this call's override list.
    pub fn query_pair(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.get_or_insert_with(Vec::new).push((name.into(), value.into()));
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn query_pairs(&self) -> Option<&[(String, String)]> {
        self.query.as_deref()
    }

    /// Fills every unset field from `template`.
    pub fn resolve(self, template: &Template) -> Template {
        Template {
            method: self.method.unwrap_or(template.method),
            url: self.url.unwrap_or_else(|| template.url.clone()),
            headers: self.headers.unwrap_or_else(|| template.headers.clone()),
            body: self.body.unwrap_or_else(|| template.body.clone()),
            query: self.query.unwrap_or_else(|| template.query.clone()),
            credentials: self.credentials.or_else(|| template.credentials.clone()),
        }
    }
}
