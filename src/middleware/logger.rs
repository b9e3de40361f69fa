//! Request timing.

use std::sync::Arc;
use std::time::Instant;

use crate::handler::Handler;
use crate::log::{Log, RequestRecord};
use crate::request::Request;

/// Times `next` and reports one [`RequestRecord`] per request to `log`.
///
/// The record is written after `next` returns, whatever it returned. Status
/// codes are not looked at; only elapsed time, method and URL (query
/// included) are recorded.
pub fn log_requests(log: impl Log, next: impl Handler) -> impl Handler {
    let log = Arc::new(log);
    let next = next.into_boxed_handler();
    move |req: Request| {
        let log = Arc::clone(&log);
        let next = Arc::clone(&next);
        let method = req.method().clone();
        let uri = req.uri().clone();
        async move {
            let started = Instant::now();
            let res = next.call(req).await;
            log.request(&RequestRecord { elapsed: started.elapsed(), method, uri });
            res
        }
    }
}
