//! The standard handler source: route, then construct.

use std::fmt;

use crate::error::Result;
use crate::factory::HandlerFactory;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::router::Router;

/// Wires a [`Router`] to a [`HandlerFactory`].
///
/// Every request is routed to an identity and the factory builds a fresh
/// handler for it. Hand it to the front controller as a
/// [`HandlerSource`](crate::HandlerSource):
///
/// ```rust
/// use warpcore::{
///     Arguments, Bootstrap, CaptureSender, FrontController, HandlerFactory, HandlerSource,
///     JsonErrorHandler, Request, Response, Router, StaticStrategy, Verb,
/// };
///
/// let router = Router::new().strategy(StaticStrategy::new(Verb::Get).with_route("/ping", "app::Ping"));
/// let mut factory = HandlerFactory::new();
/// factory.register("app::Ping", |_: &Arguments| Ok(|_req: &mut Request| Response::text("pong")));
///
/// let source = HandlerSource::from(Bootstrap::new(router, factory));
/// let front = FrontController::new(JsonErrorHandler::new(), CaptureSender::new());
///
/// let res = front.respond(&source, Request::new(Verb::Get, "/ping"));
/// assert_eq!(res.body(), b"pong");
/// ```
pub struct Bootstrap {
    router: Router,
    factory: HandlerFactory,
}

impl Bootstrap {
    pub fn new(router: Router, factory: HandlerFactory) -> Self {
        Self { router, factory }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn factory(&self) -> &HandlerFactory {
        &self.factory
    }

    /// Route the request and construct its handler.
    pub fn resolve(&self, req: &Request) -> Result<BoxedHandler> {
        let identity = self.router.route(req)?;
        self.factory.make(&identity)
    }
}

impl fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap").field("factory", &self.factory).finish_non_exhaustive()
    }
}
