//! Body parsers: read the request body once, hand the result downstream.
//!
//! Both parsers drain the body stream. Whichever runs first gets the bytes;
//! anything after it sees an empty body. Put exactly one of them directly
//! around the handler that needs the body, or use
//! [`Pipeline`](super::Pipeline), which refuses a second one at compile time.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;

use crate::body::{self, ParsedBody};
use crate::error::BodyError;
use crate::handler::Handler;
use crate::log::Log;
use crate::request::Request;
use crate::response::Response;

/// Parses the body as JSON and stores it as [`ParsedBody::Json`].
///
/// A body that cannot be read, is empty, or is not valid JSON is answered with
/// `400 Bad Request` and `next` never runs. The failure goes to `log`.
///
/// ```rust
/// use agw::{MemoryLog, Request, middleware::json_body};
///
/// let echo_a = json_body(MemoryLog::new(), |req: Request| async move {
///     req.json().map(|doc| doc["a"].to_string()).unwrap_or_default()
/// });
/// # let _ = agw::Service::new(echo_a);
/// ```
pub fn json_body(log: impl Log, next: impl Handler) -> impl Handler {
    parse_with(log, next, |bytes| Ok(ParsedBody::Json(body::parse_json(&bytes)?)))
}

/// Reads the body into memory as-is and stores it as [`ParsedBody::Raw`].
///
/// A read failure is answered with `400 Bad Request` and `next` never runs.
/// An empty body is not a failure: the handler gets empty bytes.
pub fn raw_body(log: impl Log, next: impl Handler) -> impl Handler {
    parse_with(log, next, |bytes| Ok(ParsedBody::Raw(bytes)))
}

fn parse_with<P>(log: impl Log, next: impl Handler, parse: P) -> impl Handler
where
    P: Fn(Bytes) -> Result<ParsedBody, BodyError> + Copy + Send + Sync + 'static,
{
    let log = Arc::new(log);
    let next = next.into_boxed_handler();
    move |mut req: Request| {
        let log = Arc::clone(&log);
        let next = Arc::clone(&next);
        async move {
            // `collect` drops the stream whether or not the read succeeded.
            let parsed = body::collect(req.body.take()).await.and_then(parse);
            match parsed {
                Ok(parsed) => {
                    req.parsed = parsed;
                    next.call(req).await
                }
                Err(err) => {
                    log.body_rejected(&req.method, &req.uri, &err);
                    Response::status(StatusCode::BAD_REQUEST)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryLog, Service};
    use http_body_util::Full;
    use hyper::body::Frame;
    use serde_json::json;
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    fn post(body: &'static [u8]) -> Request {
        http::Request::post("/x")
            .body(Full::new(Bytes::from_static(body)))
            .unwrap()
            .into()
    }

    /// A body whose connection drops before the first byte.
    struct Reset;

    impl hyper::body::Body for Reset {
        type Data = Bytes;
        type Error = io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
            Poll::Ready(Some(Err(io::Error::from(io::ErrorKind::ConnectionReset))))
        }
    }

    fn reset() -> Request {
        http::Request::post("/upload").body(Reset).unwrap().into()
    }

    /// A handler that counts its calls and returns what it was given.
    fn counted(calls: &Arc<AtomicUsize>) -> impl Handler {
        let calls = Arc::clone(calls);
        move |req: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            let parsed = req.parsed_body().clone();
            async move {
                match parsed {
                    ParsedBody::Json(doc) => Response::json(doc.to_string()),
                    ParsedBody::Raw(bytes) => Response::json(bytes),
                    ParsedBody::None => Response::status(StatusCode::NO_CONTENT),
                }
            }
        }
    }

    #[tokio::test]
    async fn json_document_reaches_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let log = MemoryLog::new();
        let svc = Service::new(json_body(Arc::clone(&log), counted(&calls)));

        let res = svc.call(post(br#"{"a":1,"b":[true,null,"s"]}"#)).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        let echoed: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(echoed, json!({"a": 1, "b": [true, null, "s"]}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(log.rejections().is_empty());
    }

    #[tokio::test]
    async fn json_numbers_keep_their_source_text() {
        let svc = Service::new(json_body(MemoryLog::new(), |req: Request| async move {
            req.json().map(|doc| doc["a"].to_string()).unwrap_or_default()
        }));

        for number in [
            "100000000000000000000000",
            "18446744073709551616",
            "0.1000000000000000055511151231257827",
            "-7",
        ] {
            let body: &'static str = format!(r#"{{"a":{number}}}"#).leak();
            let res = svc.call(post(body.as_bytes())).await;
            assert_eq!(res.status_code(), StatusCode::OK);
            assert_eq!(&res.body()[..], number.as_bytes());
        }
    }

    #[tokio::test]
    async fn malformed_json_is_400_and_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let log = MemoryLog::new();
        let svc = Service::new(json_body(Arc::clone(&log), counted(&calls)));

        for body in [&b"not-json"[..], b"", b"{\"a\":", b"{} trailing"] {
            let res = svc.call(post(body)).await;
            assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
            assert!(res.body().is_empty());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(log.rejections().len(), 4);
        assert!(log.rejections()[0].starts_with("POST /x: parse json body"));
    }

    #[tokio::test]
    async fn json_read_failure_is_400() {
        let calls = Arc::new(AtomicUsize::new(0));
        let log = MemoryLog::new();
        let svc = Service::new(json_body(Arc::clone(&log), counted(&calls)));

        let res = svc.call(reset()).await;

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(log.rejections()[0].starts_with("POST /upload: read body"));
    }

    #[tokio::test]
    async fn raw_bytes_arrive_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = Service::new(raw_body(MemoryLog::new(), counted(&calls)));

        for body in [&b""[..], b"not-json", b"\x00\x01\xfe\xff", br#"{"a":1}"#] {
            let res = svc.call(post(body)).await;
            assert_eq!(res.status_code(), StatusCode::OK);
            assert_eq!(&res.body()[..], body);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn raw_read_failure_is_400() {
        let calls = Arc::new(AtomicUsize::new(0));
        let log = MemoryLog::new();
        let svc = Service::new(raw_body(Arc::clone(&log), counted(&calls)));

        let res = svc.call(reset()).await;

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(log.rejections().len(), 1);
    }

    #[tokio::test]
    async fn body_is_drained_for_the_handler() {
        let svc = Service::new(raw_body(MemoryLog::new(), |mut req: Request| async move {
            let rest = req.read_body().await.unwrap();
            let stream_gone = req.take_body().is_none();
            Response::text(format!("{}:{stream_gone}", rest.len()))
        }));

        let res = svc.call(post(b"payload")).await;
        assert_eq!(&res.body()[..], b"0:true");
    }

    #[tokio::test]
    async fn second_parser_sees_empty_body() {
        let log = MemoryLog::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = Service::new(raw_body(
            Arc::clone(&log),
            json_body(Arc::clone(&log), counted(&calls)),
        ));

        let res = svc.call(post(br#"{"a":1}"#)).await;

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
