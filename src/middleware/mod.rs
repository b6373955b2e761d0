//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, request-id injection,
//! authentication-header inspection, response decoration.
//!
//! A middleware receives the request and `next`, everything further inward.
//! It may work on the request, call `next`, work on the response, or skip
//! `next` altogether and answer by itself.
//!
//! ```rust
//! use warpcore::{Handler, Request, Response, Result};
//!
//! fn stamp(req: &mut Request, next: &dyn Handler) -> Result<Response> {
//!     req.set_header("x-stamped", "1");
//!     let mut res = next.dispatch(req)?.unwrap_or_else(Response::no_content);
//!     res.set_header("x-stamped", "1");
//!     Ok(res)
//! }
//! ```
//!
//! Ordering is the part people get wrong; see [`CallStack`].

mod call_stack;
mod profiler;

use std::sync::Arc;

pub use call_stack::CallStack;
pub use profiler::Profiler;

use crate::error::Result;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// A cross-cutting interceptor wrapped around a handler or other middleware.
///
/// Implemented automatically for functions and closures with the signature
/// `fn(&mut Request, &dyn Handler) -> Result<Response>`.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &mut Request, next: &dyn Handler) -> Result<Response>;
}

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Erase a middleware into the form providers and call stacks store.
pub fn middleware(m: impl Middleware) -> BoxedMiddleware {
    Arc::new(m)
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, &dyn Handler) -> Result<Response> + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request, next: &dyn Handler) -> Result<Response> {
        self(req, next)
    }
}

// ── Providers ─────────────────────────────────────────────────────────────────

/// Something that owns an ordered list of middleware.
pub trait MiddlewareProvider {
    fn all_middleware(&self) -> &[BoxedMiddleware];
}

/// The standard [`MiddlewareProvider`]: an ordered list held by composition.
///
/// Controllers and the front controller embed one and expose it, instead of
/// each reimplementing the same list handling.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    middleware: Vec<BoxedMiddleware>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_middleware(&mut self, m: impl Middleware) -> &mut Self {
        self.middleware.push(middleware(m));
        self
    }

    pub fn add_multiple_middleware(
        &mut self,
        middleware: impl IntoIterator<Item = BoxedMiddleware>,
    ) -> &mut Self {
        self.middleware.extend(middleware);
        self
    }

    pub fn reset_middleware(&mut self) -> &mut Self {
        self.middleware.clear();
        self
    }

    pub fn replace_middleware_with(&mut self, m: impl Middleware) -> &mut Self {
        self.reset_middleware().add_middleware(m)
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl MiddlewareProvider for MiddlewareStack {
    fn all_middleware(&self) -> &[BoxedMiddleware] {
        &self.middleware
    }
}
