//! Response-header middleware.

use crate::handler::BoxedHandler;
use crate::request::Request;

const JSON_CORS_HEADERS: [(&str, &str); 4] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, OPTIONS"),
    ("Access-Control-Allow-Headers", "Origin, Content-Type"),
    ("Content-Type", "application/json"),
];

/// Marks every response as a JSON payload readable from any origin.
///
/// Headers the inner handler already set win over these defaults.
pub fn json_cors(next: BoxedHandler) -> BoxedHandler {
    BoxedHandler::new(move |req: Request| {
        let next = next.clone();
        async move {
            let mut res = next.call(req).await;
            for (name, value) in JSON_CORS_HEADERS {
                res.set_header_if_absent(name, value);
            }
            res
        }
    })
}
