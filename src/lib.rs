//! # agw
//!
//! Small HTTP middleware for services that sit behind an API gateway.
//!
//! ## The contract
//!
//! The gateway owns routing, authentication, rate limiting and TLS. What it
//! often leaves to the backend is the glue this crate provides:
//!
//! - [`cors`](middleware::cors) — `Access-Control-Allow-Origin: *` on every
//!   response
//! - [`json_body`](middleware::json_body) — body parsed into a
//!   `serde_json::Value`, or `400`
//! - [`raw_body`](middleware::raw_body) — body read into `Bytes`, or `400`
//! - [`log_requests`](middleware::log_requests) — one timing line per request
//!
//! Each is a function from handler to handler. The parsed body travels on the
//! request as a typed [`ParsedBody`], and logging goes through a [`Log`] you
//! pass in.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use agw::{Pipeline, Request, Server, TracingLog};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), agw::Error> {
//!     let app = Pipeline::new()
//!         .log_requests(TracingLog)
//!         .cors()
//!         .json_body(TracingLog)
//!         .handler(echo_a);
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn echo_a(req: Request) -> String {
//!     req.json().map(|doc| doc["a"].to_string()).unwrap_or_default()
//! }
//! ```

mod body;
mod error;
mod handler;
mod log;
mod request;
mod response;
mod server;

pub mod middleware;

pub use body::{Body, ParsedBody};
pub use error::{BodyError, BoxError, Error};
pub use handler::{Handler, Service};
pub use log::{Log, MemoryLog, RequestRecord, TracingLog};
pub use middleware::Pipeline;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use server::Server;
