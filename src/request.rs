//! Incoming HTTP request type, as seen by middleware and handlers.

use bytes::Bytes;

use crate::error::UnsupportedMethod;
use crate::method::Method;

/// An incoming HTTP request.
///
/// The embedding server builds one per inbound call (directly, or from an
/// `http::Request` via [`TryFrom`]) and hands it to the handler produced by
/// [`Chain::run`](crate::Chain::run).
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Request {
    /// `target` is a path with an optional `?query` suffix, as on the wire.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let mut path = target.into();
        let query = path.find('?').map(|at| {
            let query = path[at + 1..].to_owned();
            path.truncate(at);
            query
        });
        Self { method, path, query, headers: Vec::new(), body: Bytes::new() }
    }

    /// Adds a header. Returns `self` for chaining.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Decoded `application/x-www-form-urlencoded` query pairs, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Fails on methods outside [`Method`]; non-UTF-8 header values are dropped.
impl TryFrom<http::Request<Bytes>> for Request {
    type Error = UnsupportedMethod;

    fn try_from(req: http::Request<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = req.into_parts();
        let method = Method::try_from(&parts.method).map_err(|()| UnsupportedMethod(parts.method.clone()))?;
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        Ok(Self {
            method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers,
            body,
        })
    }
}
