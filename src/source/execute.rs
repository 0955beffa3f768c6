//! Execution strategies.
//!
//! An [`Execute`] turns one call into bytes. [`DefaultExecute`] resolves the
//! caller's [`RequestSpec`] against the source template and performs the
//! exchange through the configured [`Transport`]. Anything else (mocks,
//! instrumentation, other protocols) plugs in through the same trait, or
//! through [`execute_fn`] for a closure.

use std::future::Future;

use bytes::Bytes;
use http::header::AUTHORIZATION;
use http_body_util::{BodyExt, Full};
use tokio::time::Instant;
use tracing::debug;

use super::spec::{RequestSpec, Template};
use crate::error::RequestError;
use crate::transport::{BoxFuture, OutgoingRequest, Transport};

/// Everything a source hands its executor besides the caller's spec.
#[derive(Clone, Copy)]
pub struct Call<'a> {
    /// Effective deadline. The source enforces it around the whole execution.
    pub deadline: Instant,
    pub template: &'a Template,
    pub transport: &'a dyn Transport,
}

/// Turns a call into the response payload.
pub trait Execute: Send + Sync {
    fn execute<'a>(&'a self, call: Call<'a>, spec: RequestSpec) -> BoxFuture<'a, Result<Bytes, RequestError>>;
}

// ── DefaultExecute ────────────────────────────────────────────────────────────

/// Template-resolving, transport-backed executor.
///
/// Non-2xx statuses are errors. The response body is owned here and dropped
/// on every path, which hands the connection back exactly once.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultExecute;

impl Execute for DefaultExecute {
    fn execute<'a>(&'a self, call: Call<'a>, spec: RequestSpec) -> BoxFuture<'a, Result<Bytes, RequestError>> {
        Box::pin(async move {
            let resolved = spec.resolve(call.template);
            let url = resolved.request_url();
            let req = build_request(&resolved, url.as_str())?;

            debug!(method = %resolved.method, url = %url, "sending request");
            let res = call.transport.send(req).await.map_err(RequestError::Transport)?;

            let status = res.status();
            if !status.is_success() {
                return Err(RequestError::Status { status, url: url.into() });
            }

            let body = res.into_body().collect().await.map_err(RequestError::Body)?;
            Ok(body.to_bytes())
        })
    }
}

fn build_request(resolved: &Template, url: &str) -> Result<OutgoingRequest, RequestError> {
    let uri: http::Uri = url.parse().map_err(|reason| RequestError::InvalidUrl {
        url: url.to_owned(),
        reason,
    })?;

    let mut builder = http::Request::builder()
        .method(http::Method::from(resolved.method))
        .uri(uri);

    if let Some(headers) = builder.headers_mut() {
        for (name, value) in &resolved.headers {
            headers.append(name, value.clone());
        }
        if let Some(credentials) = resolved.credentials.as_ref().filter(|c| c.is_complete()) {
            let value = credentials.header_value().map_err(http::Error::from)?;
            headers.insert(AUTHORIZATION, value);
        }
    }

    Ok(builder.body(Full::new(resolved.body.clone()))?)
}

// ── Closure adapter ───────────────────────────────────────────────────────────

/// An [`Execute`] backed by a closure. Built by [`execute_fn`].
///
/// The closure sees the deadline and the raw spec; the template and
/// transport are not passed, so such executors work without them.
pub struct FnExecute<F>(F);

pub fn execute_fn<F, Fut>(f: F) -> FnExecute<F>
where
    F: Fn(Instant, RequestSpec) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, RequestError>> + Send + 'static,
{
    FnExecute(f)
}

impl<F, Fut> Execute for FnExecute<F>
where
    F: Fn(Instant, RequestSpec) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, RequestError>> + Send + 'static,
{
    fn execute<'a>(&'a self, call: Call<'a>, spec: RequestSpec) -> BoxFuture<'a, Result<Bytes, RequestError>> {
        Box::pin((self.0)(call.deadline, spec))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::{HeaderMap, HeaderValue, StatusCode};
    use url::Url;

    use super::*;
    use crate::error::BoxError;
    use crate::method::Method;
    use crate::source::spec::Credentials;
    use crate::transport::{full_body, transport_fn};

    fn template() -> Template {
        Template::new(Url::parse("http://example.test/data").unwrap())
    }

    /// Transport that records the request it saw and answers with `status`/`body`.
    fn recording(
        status: StatusCode,
        body: &'static str,
    ) -> (impl Transport, Arc<Mutex<Option<OutgoingRequest>>>) {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let transport = transport_fn(move |req: OutgoingRequest| {
            *sink.lock().unwrap() = Some(req);
            async move {
                let mut res = http::Response::new(full_body(body));
                *res.status_mut() = status;
                Ok::<_, BoxError>(res)
            }
        });
        (transport, seen)
    }

    fn call<'a>(template: &'a Template, transport: &'a dyn Transport) -> Call<'a> {
        Call { deadline: Instant::now(), template, transport }
    }

    #[tokio::test]
    async fn success_returns_body() {
        let (transport, seen) = recording(StatusCode::OK, "ok");
        let t = template();

        let bytes = DefaultExecute.execute(call(&t, &transport), RequestSpec::new()).await.unwrap();
        assert_eq!(bytes, "ok");

        let req = seen.lock().unwrap().take().unwrap();
        assert_eq!(req.method(), http::Method::GET);
        assert_eq!(req.uri(), "http://example.test/data");
        assert_eq!(req.headers()["accept"], "application/json");
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (transport, _) = recording(StatusCode::SERVICE_UNAVAILABLE, "down");
        let t = template();

        let err = DefaultExecute.execute(call(&t, &transport), RequestSpec::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn multi_value_headers_are_all_sent() {
        let (transport, seen) = recording(StatusCode::OK, "");
        let mut t = template();
        t.headers.append("x-tag", HeaderValue::from_static("a"));
        t.headers.append("x-tag", HeaderValue::from_static("b"));

        DefaultExecute.execute(call(&t, &transport), RequestSpec::new()).await.unwrap();

        let req = seen.lock().unwrap().take().unwrap();
        let tags: Vec<_> = req.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, ["a", "b"]);
    }

    #[tokio::test]
    async fn basic_auth_replaces_templated_authorization() {
        let (transport, seen) = recording(StatusCode::OK, "");
        let mut t = template();
        t.headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));
        t.credentials = Some(Credentials::new("user", "pass"));

        DefaultExecute.execute(call(&t, &transport), RequestSpec::new()).await.unwrap();

        let req = seen.lock().unwrap().take().unwrap();
        let auth: Vec<_> = req.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(auth, ["Basic dXNlcjpwYXNz"]);
    }

    #[tokio::test]
    async fn spec_overrides_reach_the_wire() {
        let (transport, seen) = recording(StatusCode::CREATED, "");
        let t = template();

        let mut headers = HeaderMap::new();
        headers.insert("x-only", HeaderValue::from_static("1"));
        let spec = RequestSpec::new()
            .method(Method::Post)
            .url(Url::parse("http://other.test/items").unwrap())
            .headers(headers)
            .query_pair("id", "7")
            .body("payload");

        DefaultExecute.execute(call(&t, &transport), spec).await.unwrap();

        let req = seen.lock().unwrap().take().unwrap();
        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(req.uri(), "http://other.test/items?id=7");
        assert_eq!(req.headers().len(), 1);
        let body = req.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "payload");
    }

    #[tokio::test]
    async fn closure_executor_ignores_template() {
        let executor = execute_fn(|_deadline, spec: RequestSpec| async move {
            Ok::<_, RequestError>(Bytes::from(format!("{:?}", spec.query_pairs())))
        });
        let (transport, seen) = recording(StatusCode::OK, "unused");
        let t = template();

        let bytes = executor
            .execute(call(&t, &transport), RequestSpec::new().query_pair("a", "1"))
            .await
            .unwrap();

        assert_eq!(bytes, r#"Some([("a", "1")])"#);
        assert!(seen.lock().unwrap().is_none());
    }
}
