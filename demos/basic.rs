//! Minimal svcbase example: one data source behind a middleware chain.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic -- https://httpbin.org/get
//!
//! The handler forwards to the source and relays its payload. Failed
//! queries show up as JSON lines on stderr.

use std::sync::Arc;

use http::StatusCode;
use svcbase::middleware::{self, Chain};
use svcbase::{JsonLogger, Method, Request, RequestSpec, Response, Source, SourceRegistry, options};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let endpoint = std::env::args().nth(1).unwrap_or_else(|| "https://httpbin.org/get".to_owned());

    let registry = Arc::new(SourceRegistry::new("demo", "v1"));
    let upstream = Source::new("upstream", "v1", &endpoint)?;
    upstream.set_options([
        options::set_logger(Arc::new(JsonLogger::new(std::io::stderr()))),
        options::set_metrics(Arc::new(metrics::counter!("upstream_failures_total"))),
    ]);
    registry.register(upstream);

    let app = Chain::new([
        middleware::layer(middleware::trace::log_requests),
        middleware::layer(middleware::headers::json_cors),
    ])
    .run_fn(move |req: Request| {
        let registry = Arc::clone(&registry);
        async move { relay(&registry, req).await }
    });

    for path in ["/", "/?page=2"] {
        let res = app.call(Request::new(Method::Get, path)).await;
        println!("{path} -> {} ({} bytes)", res.status_code(), res.body().len());
    }
    Ok(())
}

// GET /?page=2
//
// Inbound query pairs are forwarded upstream; without any, the source's
// template query applies.
async fn relay(registry: &SourceRegistry, req: Request) -> Response {
    let Some(source) = registry.get("upstream") else {
        return Response::status(StatusCode::SERVICE_UNAVAILABLE);
    };

    let pairs = req.query_pairs();
    let spec = if pairs.is_empty() { RequestSpec::new() } else { RequestSpec::new().query(pairs) };

    match source.query(spec).await {
        Ok(bytes) => Response::json(bytes.to_vec()),
        Err(err) => Response::builder()
            .status(err.status().unwrap_or(StatusCode::BAD_GATEWAY))
            .json(serde_json::json!({ "error": err.to_string() }).to_string().into_bytes()),
    }
}
