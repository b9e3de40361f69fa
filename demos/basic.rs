//! Minimal agw example — a JSON echo endpoint behind the full middleware set.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -i -X POST 'http://localhost:3000/x?y=1' -d '{"a":1}'
//!   curl -i -X POST 'http://localhost:3000/x' -d 'not-json'     # 400

use agw::{Pipeline, Request, Response, Server, TracingLog};
use http::StatusCode;

#[tokio::main]
async fn main() -> Result<(), agw::Error> {
    tracing_subscriber::fmt::init();

    let app = Pipeline::new()
        .log_requests(TracingLog)
        .cors()
        .json_body(TracingLog)
        .handler(echo_a);

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// Replies with the value under key "a", serialised as JSON.
async fn echo_a(req: Request) -> Response {
    match req.json().and_then(|doc| doc.get("a")) {
        Some(a) => Response::json(a.to_string()),
        None => Response::status(StatusCode::UNPROCESSABLE_ENTITY),
    }
}
