//! Middleware layer.
//!
//! Each middleware is a function that takes the next handler and returns a
//! new handler, so they compose by nesting:
//!
//! ```rust
//! use agw::{Request, TracingLog};
//! use agw::middleware::{cors, json_body, log_requests};
//!
//! async fn echo_a(req: Request) -> String {
//!     req.json().map(|doc| doc["a"].to_string()).unwrap_or_default()
//! }
//!
//! let app = log_requests(TracingLog, cors(json_body(TracingLog, echo_a)));
//! # let _ = agw::Service::new(app);
//! ```
//!
//! | Middleware | Adds | Originates |
//! |---|---|---|
//! | [`cors`] | `Access-Control-Allow-Origin: *` on every response | nothing |
//! | [`json_body`] | [`ParsedBody::Json`](crate::ParsedBody::Json) | `400` on unreadable or invalid JSON |
//! | [`raw_body`] | [`ParsedBody::Raw`](crate::ParsedBody::Raw) | `400` on unreadable body |
//! | [`log_requests`] | one [`RequestRecord`](crate::RequestRecord) per request | nothing |
//!
//! Nesting by hand lets you stack two body parsers; the second one then sees
//! an empty body. [`Pipeline`] rules that out and always puts the body parser
//! innermost.

mod body;
mod cors;
mod logger;
mod pipeline;

pub use body::{json_body, raw_body};
pub use cors::cors;
pub use logger::log_requests;
pub use pipeline::{BodySlot, NoBody, Pipeline, WithBody};
