//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use http_body_util::BodyExt;
use serde_json::Value;

use crate::body::{self, Body, ParsedBody};
use crate::error::{BodyError, BoxError};

/// An incoming HTTP request as handlers and middleware see it.
///
/// Besides the usual method, URI and headers, a request carries two things
/// for the body: the unread stream, and the [`ParsedBody`] slot filled in by
/// [`json_body`](crate::middleware::json_body) or
/// [`raw_body`](crate::middleware::raw_body).
///
/// The stream can be read once. After a body parser ran, [`read_body`]
/// returns empty bytes; use [`json`] or [`raw`] instead.
///
/// [`read_body`]: Request::read_body
/// [`json`]: Request::json
/// [`raw`]: Request::raw
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Body>,
    pub(crate) parsed: ParsedBody,
}

impl Request {
    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn parsed_body(&self) -> &ParsedBody { &self.parsed }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The document parsed by `json_body`, if that middleware ran.
    pub fn json(&self) -> Option<&Value> {
        self.parsed.as_json()
    }

    /// The bytes read by `raw_body`, if that middleware ran.
    pub fn raw(&self) -> Option<&Bytes> {
        self.parsed.as_raw()
    }

    /// Reads the rest of the body stream into memory.
    ///
    /// The stream is consumed: a second call, or a call after a body parser
    /// ran, returns empty bytes.
    pub async fn read_body(&mut self) -> Result<Bytes, BodyError> {
        body::collect(self.body.take()).await
    }

    /// Takes the unread body stream, leaving nothing behind.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }
}

impl<B> From<http::Request<B>> for Request
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    fn from(req: http::Request<B>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body: Some(body.map_err(Into::into).boxed_unsync()),
            parsed: ParsedBody::None,
        }
    }
}
