//! Per-request logging middleware.

use std::time::Instant;

use tracing::info;

use crate::handler::BoxedHandler;
use crate::request::Request;

/// Emits one `info` event per request with method, path, status and latency.
pub fn log_requests(next: BoxedHandler) -> BoxedHandler {
    BoxedHandler::new(move |req: Request| {
        let next = next.clone();
        async move {
            let started = Instant::now();
            let method = req.method();
            let path = req.path().to_owned();

            let res = next.call(req).await;

            info!(
                %method,
                path = %path,
                status = res.status_code().as_u16(),
                latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                "request served"
            );
            res
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use http::StatusCode;

    use super::*;
    use crate::method::Method;
    use crate::middleware::{Chain, layer};

    #[tokio::test]
    async fn passes_response_through() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let app = Chain::new([layer(log_requests)])
            .run_fn(|_req: Request| async { StatusCode::ACCEPTED });

        let res = app.call(Request::new(Method::Post, "/jobs")).await;
        assert_eq!(res.status_code(), StatusCode::ACCEPTED);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn logs_request_fields() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Chain::new([layer(log_requests)])
            .run_fn(|_req: Request| async { StatusCode::ACCEPTED });
        app.call(Request::new(Method::Post, "/jobs?id=1")).await;

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("request served"), "{out}");
        assert!(out.contains("method=POST"), "{out}");
        assert!(out.contains("path=/jobs"), "{out}");
        assert!(out.contains("status=202"), "{out}");
        assert!(out.contains("latency_us="), "{out}");
    }
}
