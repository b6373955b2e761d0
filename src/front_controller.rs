//! The front controller: one request in, exactly one response out.

use std::any::Any;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::error;

use crate::bootstrap::Bootstrap;
use crate::error::{Error, Result};
use crate::error_handler::ErrorHandler;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, CallStack, Middleware, MiddlewareProvider, MiddlewareStack};
use crate::request::Request;
use crate::response::Response;
use crate::sender::{ResponseSender, WriteSender};

// ── Instance ──────────────────────────────────────────────────────────────────

/// Whatever a resolver produced. Only handlers can be dispatched; anything
/// else fails the cycle with [`Error::BootstrapFailure`].
pub struct Instance(Box<dyn Any + Send>);

impl Instance {
    pub fn handler(h: impl Handler) -> Self {
        Self(Box::new(crate::handler::handler(h)))
    }

    /// Wrap an arbitrary value.
    pub fn value<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn into_handler(self) -> Option<BoxedHandler> {
        self.0.downcast::<BoxedHandler>().ok().map(|h| *h)
    }
}

impl From<BoxedHandler> for Instance {
    fn from(h: BoxedHandler) -> Self {
        Self(Box::new(h))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Instance(..)")
    }
}

// ── HandlerSource ─────────────────────────────────────────────────────────────

type Resolver = Box<dyn Fn(&Request) -> Result<Instance> + Send + Sync>;

/// Where the front controller gets its handler from.
pub enum HandlerSource {
    /// The same handler for every request.
    Handler(BoxedHandler),
    /// Called with each request to produce the handler.
    Resolver(Resolver),
}

impl HandlerSource {
    pub fn handler(h: impl Handler) -> Self {
        Self::Handler(crate::handler::handler(h))
    }

    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&Request) -> Result<Instance> + Send + Sync + 'static,
    {
        Self::Resolver(Box::new(f))
    }

    fn resolve(&self, req: &Request) -> Result<BoxedHandler> {
        match self {
            Self::Handler(h) => Ok(Arc::clone(h)),
            Self::Resolver(resolve) => resolve(req)?.into_handler().ok_or(Error::BootstrapFailure),
        }
    }
}

impl From<BoxedHandler> for HandlerSource {
    fn from(h: BoxedHandler) -> Self {
        Self::Handler(h)
    }
}

impl From<Bootstrap> for HandlerSource {
    fn from(bootstrap: Bootstrap) -> Self {
        Self::resolver(move |req: &Request| bootstrap.resolve(req).map(Instance::from))
    }
}

impl fmt::Debug for HandlerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("HandlerSource::Handler(..)"),
            Self::Resolver(_) => f.write_str("HandlerSource::Resolver(..)"),
        }
    }
}

// ── FrontController ───────────────────────────────────────────────────────────

/// Runs the dispatch cycle.
///
/// 1. Resolve a handler from the [`HandlerSource`].
/// 2. Wrap it in a [`CallStack`]: the handler's own middleware first, then
///    the front controller's global middleware on top.
/// 3. Dispatch. A handler that returns nothing is answered `204 No Content`.
/// 4. Any failure along the way is logged and turned into a response by the
///    [`ErrorHandler`].
/// 5. The response goes to the [`ResponseSender`] exactly once.
///
/// ```rust
/// use warpcore::{CaptureSender, FrontController, HandlerSource, JsonErrorHandler, Request, Response, Verb};
///
/// let front = FrontController::new(JsonErrorHandler::new(), CaptureSender::new());
/// let source = HandlerSource::handler(|_req: &mut Request| Response::text("hi"));
///
/// let res = front.respond(&source, Request::new(Verb::Get, "/"));
/// assert_eq!(res.body(), b"hi");
/// ```
pub struct FrontController {
    error_handler: Arc<dyn ErrorHandler>,
    sender: Box<dyn ResponseSender>,
    middleware: MiddlewareStack,
}

impl FrontController {
    /// [`bootstrap`](FrontController::bootstrap) delivers through `sender`.
    /// [`Server`](crate::Server) does not: it answers over the connection.
    pub fn new(error_handler: impl ErrorHandler + 'static, sender: impl ResponseSender + 'static) -> Self {
        Self {
            error_handler: Arc::new(error_handler),
            sender: Box::new(sender),
            middleware: MiddlewareStack::new(),
        }
    }

    /// A front controller whose [`bootstrap`](FrontController::bootstrap)
    /// writes HTTP/1.1 to stdout. Enough for one that is handed to
    /// [`Server`](crate::Server), which never uses the sender.
    pub fn with_error_handler(error_handler: impl ErrorHandler + 'static) -> Self {
        Self::new(error_handler, WriteSender::new(io::stdout()))
    }

    /// Global middleware, wrapped around every handler. The last one added
    /// runs first.
    pub fn add_middleware(&mut self, m: impl Middleware) -> &mut Self {
        self.middleware.add_middleware(m);
        self
    }

    pub fn add_multiple_middleware(
        &mut self,
        middleware: impl IntoIterator<Item = BoxedMiddleware>,
    ) -> &mut Self {
        self.middleware.add_multiple_middleware(middleware);
        self
    }

    pub fn reset_middleware(&mut self) -> &mut Self {
        self.middleware.reset_middleware();
        self
    }

    pub fn replace_middleware_with(&mut self, m: impl Middleware) -> &mut Self {
        self.middleware.replace_middleware_with(m);
        self
    }

    pub fn error_handler(&self) -> &Arc<dyn ErrorHandler> {
        &self.error_handler
    }

    /// Run one cycle and hand the response to the configured sender.
    ///
    /// The returned error is the sender's own. Dispatch failures never
    /// surface here: they are already part of the response.
    pub fn bootstrap(&self, source: &HandlerSource, req: Request) -> Result<()> {
        self.bootstrap_with(source, req, &*self.sender)
    }

    /// [`bootstrap`](FrontController::bootstrap) against another sender.
    pub fn bootstrap_with(&self, source: &HandlerSource, req: Request, sender: &dyn ResponseSender) -> Result<()> {
        let res = self.respond(source, req);
        sender.send(&res)
    }

    /// Run one cycle and return the response instead of sending it.
    pub fn respond(&self, source: &HandlerSource, mut req: Request) -> Response {
        match self.dispatch(source, &mut req) {
            Ok(res) => res,
            Err(e) => {
                let code = e.status().as_u16();
                error!(code, kind = e.type_name(), uri = req.uri(), "[Core] [{code}] Error: {e}");
                self.error_handler.handle(&e)
            }
        }
    }

    fn dispatch(&self, source: &HandlerSource, req: &mut Request) -> Result<Response> {
        let handler = source.resolve(req)?;
        let stack = CallStack::build(handler, self);
        Ok(stack.dispatch(req)?.unwrap_or_else(Response::no_content))
    }
}

impl MiddlewareProvider for FrontController {
    fn all_middleware(&self) -> &[BoxedMiddleware] {
        self.middleware.all_middleware()
    }
}

impl fmt::Debug for FrontController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontController")
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::StatusCode;

    use super::*;
    use crate::error::ApplicationError;
    use crate::error_handler::JsonErrorHandler;
    use crate::method::Verb;
    use crate::sender::CaptureSender;

    fn front() -> (FrontController, Arc<CaptureSender>) {
        let sender = Arc::new(CaptureSender::new());
        (FrontController::new(JsonErrorHandler::new(), Arc::clone(&sender)), sender)
    }

    fn get(uri: &str) -> Request {
        Request::new(Verb::Get, uri)
    }

    #[test]
    fn sends_exactly_one_response() {
        let (front, sender) = front();
        let source = HandlerSource::handler(|_req: &mut Request| Response::text("once"));

        front.bootstrap(&source, get("/")).unwrap();
        assert_eq!(sender.take().unwrap().into_response().body(), b"once");
        assert!(sender.take().is_none());
    }

    #[test]
    fn no_response_becomes_no_content() {
        let (front, _) = front();
        let source = HandlerSource::handler(|_req: &mut Request| {});
        assert_eq!(front.respond(&source, get("/")).status_code(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn non_handler_instances_fail_to_bootstrap() {
        let (front, _) = front();
        let source = HandlerSource::resolver(|_req: &Request| Ok(Instance::value("not a handler")));
        assert_eq!(front.respond(&source, get("/")).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn resolver_errors_become_responses() {
        let (front, _) = front();
        let source = HandlerSource::resolver(|req: &Request| Err(Error::NoRouteToController(req.uri().to_owned())));
        assert_eq!(front.respond(&source, get("/nowhere")).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn resolver_handlers_dispatch() {
        let (front, _) = front();
        let source = HandlerSource::resolver(|_req: &Request| Ok(Instance::handler(|_req: &mut Request| "resolved")));
        assert_eq!(front.respond(&source, get("/")).body(), b"resolved");
    }

    #[test]
    fn global_middleware_wraps_every_handler() {
        let (mut front, _) = front();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        front.add_middleware(move |req: &mut Request, next: &dyn Handler| -> Result<Response> {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut res = next.dispatch(req)?.unwrap_or_else(Response::no_content);
            res.set_header("x-global", "1");
            Ok(res)
        });

        let source = HandlerSource::handler(|_req: &mut Request| Response::text("inner"));
        let res = front.respond(&source, get("/"));
        assert_eq!(res.header("x-global"), Some("1"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        front.reset_middleware();
        assert!(front.respond(&source, get("/")).header("x-global").is_none());
    }

    #[test]
    fn middleware_failures_go_through_the_error_handler() {
        let (mut front, _) = front();
        front.add_middleware(|_req: &mut Request, _next: &dyn Handler| -> Result<Response> {
            Err(ApplicationError::new("Unauthorized", "no token").with_status(401).into())
        });

        let source = HandlerSource::handler(|_req: &mut Request| "never");
        let res = front.respond(&source, get("/"));
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.content_type(), Some("application/json"));
    }
}
