//! A builder that composes the middleware in this crate in a valid order.

use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler, unerase};
use crate::log::Log;

use super::{cors, json_body, log_requests, raw_body};

/// Composes middleware around a handler, with the body parser innermost.
///
/// Outer stages wrap in the order they are added: the first one added sees
/// the request first and the response last. The body stage, if any, always
/// sits directly around the handler, and there can be only one:
///
/// ```rust
/// use agw::{Pipeline, Request, TracingLog};
///
/// let app = Pipeline::new()
///     .log_requests(TracingLog)
///     .cors()
///     .json_body(TracingLog)
///     .handler(|req: Request| async move {
///         req.json().map(|doc| doc["a"].to_string()).unwrap_or_default()
///     });
/// # let _ = agw::Service::new(app);
/// ```
///
/// A second body stage is a type error:
///
/// ```rust,compile_fail
/// use agw::{Pipeline, TracingLog};
///
/// Pipeline::new().json_body(TracingLog).raw_body(TracingLog);
/// ```
pub struct Pipeline<B = NoBody> {
    stages: Vec<Stage>,
    body: B,
}

enum Stage {
    Cors,
    LogRequests(Arc<dyn Log>),
}

/// Typestate: no body parser chosen yet.
pub struct NoBody;

/// Typestate: a body parser has been chosen.
pub struct WithBody(BodyStage);

enum BodyStage {
    Json(Arc<dyn Log>),
    Raw(Arc<dyn Log>),
}

impl Pipeline<NoBody> {
    pub fn new() -> Self {
        Self { stages: Vec::new(), body: NoBody }
    }

    /// Parse the body as JSON before the handler runs. See [`json_body`].
    pub fn json_body(self, log: impl Log) -> Pipeline<WithBody> {
        self.with_body(BodyStage::Json(Arc::new(log)))
    }

    /// Read the raw body before the handler runs. See [`raw_body`].
    pub fn raw_body(self, log: impl Log) -> Pipeline<WithBody> {
        self.with_body(BodyStage::Raw(Arc::new(log)))
    }

    fn with_body(self, stage: BodyStage) -> Pipeline<WithBody> {
        Pipeline { stages: self.stages, body: WithBody(stage) }
    }
}

impl Default for Pipeline<NoBody> {
    fn default() -> Self { Self::new() }
}

impl<B: BodySlot> Pipeline<B> {
    /// Add the CORS header to every response. See [`cors`].
    pub fn cors(mut self) -> Self {
        self.stages.push(Stage::Cors);
        self
    }

    /// Time and log every request. See [`log_requests`].
    pub fn log_requests(mut self, log: impl Log) -> Self {
        self.stages.push(Stage::LogRequests(Arc::new(log)));
        self
    }

    /// Wraps `handler` in every stage and returns the finished chain.
    pub fn handler(self, handler: impl Handler) -> impl Handler {
        let mut next = self.body.wrap(handler.into_boxed_handler());
        for stage in self.stages.into_iter().rev() {
            next = match stage {
                Stage::Cors => cors(unerase(next)).into_boxed_handler(),
                Stage::LogRequests(log) => log_requests(log, unerase(next)).into_boxed_handler(),
            };
        }
        unerase(next)
    }
}

/// Implemented by the two body typestates.
pub trait BodySlot: private::Sealed {
    #[doc(hidden)]
    fn wrap(self, next: BoxedHandler) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::NoBody {}
    impl Sealed for super::WithBody {}
}

impl BodySlot for NoBody {
    fn wrap(self, next: BoxedHandler) -> BoxedHandler {
        next
    }
}

impl BodySlot for WithBody {
    fn wrap(self, next: BoxedHandler) -> BoxedHandler {
        match self.0 {
            BodyStage::Json(log) => json_body(log, unerase(next)).into_boxed_handler(),
            BodyStage::Raw(log) => raw_body(log, unerase(next)).into_boxed_handler(),
        }
    }
}
