//! Permissive CORS.

use std::sync::Arc;

use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue};

use crate::handler::Handler;
use crate::request::Request;

/// Adds `Access-Control-Allow-Origin: *` to every response.
///
/// Some gateways (AWS API Gateway in proxy mode, for one) leave CORS headers
/// to the backend even with CORS switched on in their console. This puts the
/// header on every response, whatever the method, path or status, including
/// `400`s produced by body parsers further in. A different origin set by the
/// wrapped handler is overwritten.
pub fn cors(next: impl Handler) -> impl Handler {
    let next = next.into_boxed_handler();
    move |req: Request| {
        let next = Arc::clone(&next);
        async move {
            let mut res = next.call(req).await;
            res.headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            res
        }
    }
}
