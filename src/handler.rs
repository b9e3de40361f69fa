//! Handler trait, type erasure, and the finished [`Service`].
//!
//! # How a middleware chain is stored
//!
//! Every middleware wraps "the next handler" without knowing its concrete
//! type, so the next handler is held as a trait object
//! (`Arc<dyn ErasedHandler>`) and called through one vtable dispatch:
//!
//! ```text
//! async fn echo(req: Request) -> Response { … }    ← user writes this
//!        ↓ cors(echo)
//! echo.into_boxed_handler()                         ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(echo))                         ← stored as BoxedHandler
//!        ↓
//! next.call(req)  at request time                   ← one vtable dispatch
//!        ↓
//! Box::pin(async { echo(req).await.into_response() })
//! ```
//!
//! A middleware returns a closure holding its `BoxedHandler`, and closures
//! are handlers too, so wrapping nests to any depth.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` let tokio move the future across threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid handler, and for every middleware's output.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure) with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Turns an erased handler back into something that satisfies [`Handler`].
///
/// Boxing the result again adds one more `Arc`; builders use this once per
/// stage at startup, never per request.
pub(crate) fn unerase(next: BoxedHandler) -> impl Handler {
    move |req: Request| next.call(req)
}

// ── Service ──────────────────────────────────────────────────────────────────

/// A finished handler chain, ready to answer requests.
///
/// Cloning is one atomic increment. [`Server`](crate::Server) builds one of
/// these from whatever it is given to serve; tests can drive one directly:
///
/// ```rust
/// # async fn demo() {
/// use agw::{Request, Service, middleware::cors};
/// use bytes::Bytes;
/// use http_body_util::Empty;
///
/// let svc = Service::new(cors(|_req: Request| async { "ok" }));
/// let req = Request::from(http::Request::new(Empty::<Bytes>::new()));
/// let res = svc.call(req).await;
/// assert_eq!(res.headers()["access-control-allow-origin"], "*");
/// # }
/// ```
#[derive(Clone)]
pub struct Service(BoxedHandler);

impl Service {
    pub fn new(handler: impl Handler) -> Self {
        Self(handler.into_boxed_handler())
    }

    pub async fn call(&self, req: Request) -> Response {
        self.0.call(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Empty;

    fn get() -> Request {
        Request::from(http::Request::new(Empty::<Bytes>::new()))
    }

    async fn teapot(_req: Request) -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    #[tokio::test]
    async fn async_fn_is_a_handler() {
        let res = Service::new(teapot).call(get()).await;
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn unerase_round_trips() {
        let svc = Service::new(unerase(teapot.into_boxed_handler()));
        assert_eq!(svc.call(get()).await.status_code(), StatusCode::IM_A_TEAPOT);
    }
}
