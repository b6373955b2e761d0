//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! Handlers of different concrete types meet in one place: the root of a
//! [`CallStack`](crate::CallStack), the registry of a
//! [`HandlerFactory`](crate::HandlerFactory), the `next` link of every
//! middleware slot. So they travel as trait objects behind an `Arc`:
//!
//! ```text
//! fn hello(req: &mut Request) -> Response { … }    ← user writes this
//!        ↓ CallStack::new(handler(hello))
//! Arc::new(hello)                                  ← Handler blanket impl
//!        ↓  stored as BoxedHandler = Arc<dyn Handler>
//! entry_point.dispatch(&mut req)  at request time  ← one vtable dispatch
//!        ↓
//! hello(req).into_outcome()                        ← Result<Option<Response>>
//! ```
//!
//! Controllers with their own middleware implement [`Handler`] on a struct
//! and answer [`Handler::middleware_provider`].

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::error::Result;
use crate::middleware::MiddlewareProvider;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// What one dispatch produces: a response, nothing, or a failure.
///
/// "Nothing" is legal. The front controller answers it with `204 No Content`.
pub type Outcome = Result<Option<Response>>;

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Anything that can dispatch a request.
///
/// Implemented automatically for any function or closure with the signature
///
/// ```text
/// fn name(req: &mut Request) -> impl IntoOutcome
/// ```
///
/// Implement it on a struct for controllers that carry state or own
/// middleware.
pub trait Handler: Send + Sync + 'static {
    fn dispatch(&self, req: &mut Request) -> Outcome;

    /// The middleware this handler owns, if it is a middleware provider.
    ///
    /// A call stack rooted at this handler pulls these in first, so they run
    /// innermost.
    fn middleware_provider(&self) -> Option<&dyn MiddlewareProvider> {
        None
    }
}

impl fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("owns_middleware", &self.middleware_provider().is_some())
            .finish()
    }
}

/// Erase a handler into the form the call stack and factory store.
pub fn handler(h: impl Handler) -> BoxedHandler {
    Arc::new(h)
}

impl<F, R> Handler for F
where
    F: Fn(&mut Request) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn dispatch(&self, req: &mut Request) -> Outcome {
        self(req).into_outcome()
    }
}

// ── IntoOutcome ───────────────────────────────────────────────────────────────

/// Conversion of a handler's return value into an [`Outcome`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome { self }
}

impl IntoOutcome for Result<Response> {
    fn into_outcome(self) -> Outcome { self.map(Some) }
}

impl IntoOutcome for Option<Response> {
    fn into_outcome(self) -> Outcome { Ok(self) }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome { Ok(None) }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome { Ok(Some(self)) }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Outcome { Ok(Some(self.into_response())) }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome { Ok(Some(self.into_response())) }
}

impl IntoOutcome for StatusCode {
    fn into_outcome(self) -> Outcome { Ok(Some(self.into_response())) }
}
