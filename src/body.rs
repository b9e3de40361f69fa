//! Request body stream and the typed slot the body parsers fill.

use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::combinators::UnsyncBoxBody;
use serde_json::Value;

use crate::error::{BodyError, BoxError};

/// The request body as it arrives off the wire.
///
/// Any `http_body::Body` yielding [`Bytes`] can be boxed into this, including
/// hyper's `Incoming` and `http_body_util::Full` in tests.
pub type Body = UnsyncBoxBody<Bytes, BoxError>;

/// What a body-parsing middleware left on the request.
///
/// A request starts out as [`ParsedBody::None`]. At most one of
/// [`json_body`](crate::middleware::json_body) and
/// [`raw_body`](crate::middleware::raw_body) replaces it before the handler
/// runs, so the handler matches on the variant instead of guessing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ParsedBody {
    #[default]
    None,
    Json(Value),
    Raw(Bytes),
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Reads `body` to the end and drops the stream.
///
/// A body that was already taken reads as empty.
pub(crate) async fn collect(body: Option<Body>) -> Result<Bytes, BodyError> {
    let Some(body) = body else {
        return Ok(Bytes::new());
    };
    let collected = body.collect().await.map_err(BodyError::Read)?;
    Ok(collected.to_bytes())
}

/// Parses `bytes` as a single JSON document. Anything after the value is an
/// error. Numbers keep their source text (`arbitrary_precision`).
pub(crate) fn parse_json(bytes: &[u8]) -> Result<Value, BodyError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::json;

    fn body(bytes: &'static [u8]) -> Option<Body> {
        Some(Full::new(Bytes::from_static(bytes)).map_err(|e| -> BoxError { match e {} }).boxed_unsync())
    }

    #[tokio::test]
    async fn collect_returns_every_byte() {
        let bytes = collect(body(b"\x00\xffhello")).await.unwrap();
        assert_eq!(&bytes[..], b"\x00\xffhello");
    }

    #[tokio::test]
    async fn collect_of_taken_body_is_empty() {
        assert!(collect(None).await.unwrap().is_empty());
    }

    #[test]
    fn parse_json_accepts_documents() {
        assert_eq!(parse_json(br#"{"a":[1,2]}"#).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn parse_json_rejects_empty_and_garbage() {
        assert!(matches!(parse_json(b""), Err(BodyError::Json(_))));
        assert!(matches!(parse_json(b"not-json"), Err(BodyError::Json(_))));
    }

    #[test]
    fn accessors_match_variant() {
        let doc = ParsedBody::Json(json!(1));
        assert_eq!(doc.as_json(), Some(&json!(1)));
        assert_eq!(doc.as_raw(), None);

        let raw = ParsedBody::Raw(Bytes::from_static(b"x"));
        assert_eq!(raw.as_raw().map(|b| &b[..]), Some(&b"x"[..]));
        assert!(raw.as_json().is_none());

        assert!(ParsedBody::default().is_none());
    }
}
