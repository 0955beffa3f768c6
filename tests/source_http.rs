//! End-to-end: a `Source` on the default transport talking to a local
//! hyper server whose handler is built by a middleware `Chain`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use svcbase::middleware::{self, Chain};
use svcbase::{
    BoxedHandler, Counter, Fields, HyperTransport, Logger, Method, Request, RequestError, RequestSpec, Response, Source,
    SourceRegistry, Transport, options,
};
use tokio::net::TcpListener;

// ── Test server ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Seen {
    uri: String,
    authorization: Option<String>,
}

/// Serves `app` on an ephemeral port and records every request head.
async fn serve(app: BoxedHandler) -> (SocketAddr, Arc<Mutex<Vec<Seen>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            let app = app.clone();
            let log = Arc::clone(&log);

            tokio::spawn(async move {
                let svc = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let app = app.clone();
                    let log = Arc::clone(&log);
                    async move {
                        log.lock().unwrap().push(Seen {
                            uri: req.uri().to_string(),
                            authorization: req
                                .headers()
                                .get(http::header::AUTHORIZATION)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_owned),
                        });
                        let (parts, body) = req.into_parts();
                        let body = body.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
                        let res = match Request::try_from(http::Request::from_parts(parts, body)) {
                            Ok(req) => app.call(req).await,
                            Err(_) => Response::status(StatusCode::METHOD_NOT_ALLOWED),
                        };
                        Ok::<_, Infallible>(res.into_http())
                    }
                });
                let _ = ConnBuilder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(stream), svc)
                    .await;
            });
        }
    });

    (addr, seen)
}

fn app() -> BoxedHandler {
    Chain::new([middleware::layer(middleware::headers::json_cors)]).run_fn(|req: Request| async move {
        match req.path() {
            "/ok" => Response::json(br#"{"ok":true}"#.to_vec()),
            "/echo" => Response::text(String::from_utf8_lossy(req.body()).into_owned()),
            "/params" => Response::text(format!("{:?}", req.query_pairs())),
            _ => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    })
}

// ── Doubles ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    entries: Mutex<Vec<(String, Fields)>>,
}

impl Logger for Recorder {
    fn log(&self, msg: &str, context: &Fields) {
        self.entries.lock().unwrap().push((msg.to_owned(), context.clone()));
    }
    fn debug(&self, msg: &str, context: &Fields) {
        self.log(msg, context);
    }
}

#[derive(Default)]
struct Tally(AtomicUsize);

impl Counter for Tally {
    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_transport_returns_payload() {
    let (addr, seen) = serve(app()).await;
    let source = Source::new("local", "t", &format!("http://{addr}/ok")).unwrap();

    let bytes = source.query(RequestSpec::new()).await.unwrap();

    assert_eq!(bytes, Bytes::from_static(br#"{"ok":true}"#));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn basic_auth_and_query_reach_the_server() {
    let (addr, seen) = serve(app()).await;
    let source = Source::new("local", "t", &format!("http://{addr}/ok")).unwrap();
    source.set_options([options::set_basic_auth("user", "pass")]);

    source
        .query(RequestSpec::new().query_pair("page", "2").query_pair("tag", "a b"))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].uri, "/ok?page=2&tag=a+b");
    assert_eq!(seen[0].authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
}

#[tokio::test]
async fn inbound_query_reaches_the_handler() {
    let (addr, _) = serve(app()).await;
    let source = Source::new("local", "t", &format!("http://{addr}/params")).unwrap();

    let bytes = source
        .query(RequestSpec::new().query_pair("page", "2").query_pair("tag", "a b"))
        .await
        .unwrap();

    assert_eq!(bytes, r#"[("page", "2"), ("tag", "a b")]"#);
}

#[tokio::test]
async fn extension_method_is_refused_not_rewritten() {
    let (addr, _) = serve(app()).await;
    let req = http::Request::builder()
        .method("PURGE")
        .uri(format!("http://{addr}/ok"))
        .body(http_body_util::Full::default())
        .unwrap();

    let res = HyperTransport::default().send(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn post_body_is_delivered() {
    let (addr, _) = serve(app()).await;
    let source = Source::new("local", "t", &format!("http://{addr}/echo")).unwrap();

    let bytes = source
        .query(RequestSpec::new().method(Method::Post).body("hello"))
        .await
        .unwrap();

    assert_eq!(bytes, "hello");
}

#[tokio::test]
async fn server_error_is_logged_and_counted_once() {
    let (addr, _) = serve(app()).await;
    let source = Source::new("local", "t", &format!("http://{addr}/broken")).unwrap();
    let logger = Arc::new(Recorder::default());
    let tally = Arc::new(Tally::default());
    source.set_options([
        options::set_logger(logger.clone()),
        options::set_metrics(tally.clone()),
    ]);

    let err = source.query(RequestSpec::new().query_pair("id", "9")).await.unwrap_err();

    assert!(matches!(err, RequestError::Status { .. }));
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(tally.0.load(Ordering::SeqCst), 1);

    let entries = logger.entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    let (msg, context) = &entries[0];
    assert_eq!(msg, "Failed Request");
    assert_eq!(context["urlValues"], serde_json::json!({ "id": ["9"] }));
    assert_eq!(context["source"], "local");
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = Source::new("gone", "t", &format!("http://{addr}/")).unwrap();
    let err = source.query(RequestSpec::new()).await.unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)));
}

#[tokio::test]
async fn registry_hands_out_shared_sources() {
    let (addr, _) = serve(app()).await;
    let registry = SourceRegistry::new("svc", "v1");
    registry.register(Source::new("local", "t", &format!("http://{addr}/ok")).unwrap());

    let source = registry.get("local").unwrap();
    assert!(source.query(RequestSpec::new()).await.is_ok());
}

#[tokio::test]
async fn chain_headers_survive_into_http() {
    let res = app().call(Request::new(Method::Get, "/ok")).await.into_http();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["content-type"], "application/json");
}
