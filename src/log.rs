//! The logging collaborator handed to each middleware that logs.
//!
//! Middleware never reaches for a global logger. [`json_body`], [`raw_body`]
//! and [`log_requests`] each take a [`Log`] when they are built. Production
//! code passes [`TracingLog`]; tests pass a [`MemoryLog`] and inspect it.
//!
//! [`json_body`]: crate::middleware::json_body
//! [`raw_body`]: crate::middleware::raw_body
//! [`log_requests`]: crate::middleware::log_requests

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use http::{Method, Uri};
use tracing::{info, warn};

use crate::error::BodyError;

/// One completed request, as seen by the request logger.
#[derive(Clone, Debug)]
pub struct RequestRecord {
    pub elapsed: Duration,
    pub method: Method,
    pub uri: Uri,
}

/// `[0.00012s][POST:"/x?y=1"]`: seconds to five decimals, then the method
/// and the quoted URL including its query string.
impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.5}s][{}:{:?}]",
            self.elapsed.as_secs_f64(),
            self.method,
            self.uri.to_string(),
        )
    }
}

/// Receives the diagnostics middleware produces.
///
/// Implementations must be cheap and must not block: they run inline on the
/// request's task.
pub trait Log: Send + Sync + 'static {
    /// A request finished. Called once per request by `log_requests`, after
    /// the wrapped handler returned.
    fn request(&self, record: &RequestRecord);

    /// A body parser answered `400` instead of calling the next handler.
    fn body_rejected(&self, method: &Method, uri: &Uri, err: &BodyError);
}

impl<L: Log + ?Sized> Log for Arc<L> {
    fn request(&self, record: &RequestRecord) {
        (**self).request(record);
    }

    fn body_rejected(&self, method: &Method, uri: &Uri, err: &BodyError) {
        (**self).body_rejected(method, uri, err);
    }
}

// ── TracingLog ────────────────────────────────────────────────────────────────

/// Emits `tracing` events. Install a subscriber (e.g. `tracing_subscriber::fmt`)
/// to see them.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl Log for TracingLog {
    fn request(&self, record: &RequestRecord) {
        info!(
            elapsed_s = record.elapsed.as_secs_f64(),
            method = %record.method,
            uri = %record.uri,
            "{record}"
        );
    }

    fn body_rejected(&self, method: &Method, uri: &Uri, err: &BodyError) {
        warn!(%method, %uri, error = %err, "request body rejected");
    }
}

// ── MemoryLog ─────────────────────────────────────────────────────────────────

/// Keeps every line in memory. Meant for tests.
///
/// Share it with `Arc` so the test still holds a handle after handing one to
/// the middleware.
#[derive(Debug, Default)]
pub struct MemoryLog {
    requests: Mutex<Vec<RequestRecord>>,
    rejections: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Requests recorded so far, oldest first.
    pub fn requests(&self) -> Vec<RequestRecord> {
        lock(&self.requests).clone()
    }

    /// Formatted request lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.requests).iter().map(ToString::to_string).collect()
    }

    /// Rejected bodies, formatted as `METHOD uri: error`.
    pub fn rejections(&self) -> Vec<String> {
        lock(&self.rejections).clone()
    }
}

impl Log for MemoryLog {
    fn request(&self, record: &RequestRecord) {
        lock(&self.requests).push(record.clone());
    }

    fn body_rejected(&self, method: &Method, uri: &Uri, err: &BodyError) {
        lock(&self.rejections).push(format!("{method} {uri}: {err}"));
    }
}

// A panicking test thread must not hide what was logged before it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(millis: u64, method: Method, uri: &'static str) -> RequestRecord {
        RequestRecord {
            elapsed: Duration::from_millis(millis),
            method,
            uri: Uri::from_static(uri),
        }
    }

    #[test]
    fn line_format() {
        let line = record(1234, Method::POST, "/x?y=1").to_string();
        assert_eq!(line, r#"[1.23400s][POST:"/x?y=1"]"#);
    }

    #[test]
    fn line_keeps_five_decimals_for_fast_requests() {
        let line = record(0, Method::GET, "/").to_string();
        assert_eq!(line, r#"[0.00000s][GET:"/"]"#);
    }

    #[test]
    fn memory_log_records_through_arc() {
        let log = MemoryLog::new();
        let shared: Arc<MemoryLog> = Arc::clone(&log);
        shared.request(&record(5, Method::DELETE, "/a"));

        let err = BodyError::Json(serde_json::from_slice::<serde_json::Value>(b"").unwrap_err());
        shared.body_rejected(&Method::PUT, &Uri::from_static("/b"), &err);

        assert_eq!(log.lines(), vec![r#"[0.00500s][DELETE:"/a"]"#.to_owned()]);
        assert_eq!(log.requests()[0].method, Method::DELETE);
        let rejections = log.rejections();
        assert_eq!(rejections.len(), 1);
        assert!(rejections[0].starts_with("PUT /b: parse json body:"));
    }

    #[test]
    fn tracing_log_does_not_panic_without_subscriber() {
        TracingLog.request(&record(1, Method::GET, "/"));
    }
}
