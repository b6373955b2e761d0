//! # warpcore
//!
//! A minimal HTTP request-dispatch framework. One request in, one response
//! out, and a small, strict pipeline in between.
//!
//! ## The pipeline
//!
//! ```text
//! Request ─▶ FrontController ─▶ HandlerSource ─▶ CallStack ─▶ Response ─▶ ResponseSender
//!                                    │                │
//!                          Router ─▶ HandlerFactory   └─ middleware around the handler
//! ```
//!
//! - [`Router`] validates the path and asks its [`RoutingStrategy`]s, in
//!   registration order, which handler *identity* should serve it.
//! - [`HandlerFactory`] turns the identity into a live [`Handler`]. Only
//!   registered identities can ever be constructed.
//! - [`CallStack`] wraps the handler in middleware: its own first, then the
//!   front controller's global middleware on top.
//! - [`FrontController`] runs the cycle and catches every failure in one
//!   place, turning it into a response through an [`ErrorHandler`].
//!
//! What warpcore leaves alone: TLS, rate limiting, body-size limits and
//! connection pooling belong to the proxy in front of it. There is no
//! hot-reload of routes.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use warpcore::{
//!     Arguments, Bootstrap, Config, FrontController, HandlerFactory,
//!     HandlerSource, JsonErrorHandler, PathNamespaceStrategy, Profiler, Request, Response,
//!     Router, Server, Verb,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env();
//!
//!     let router = Router::new().strategy(PathNamespaceStrategy::new("app", [Verb::Get, Verb::Post]));
//!     let mut factory = HandlerFactory::new();
//!     factory.register("app::Hello", |_: &Arguments| {
//!         Ok(|_req: &mut Request| Response::json(r#"{"message":"Hello, World!"}"#))
//!     });
//!
//!     let mut front = FrontController::with_error_handler(JsonErrorHandler::from_config(&config));
//!     front.add_middleware(Profiler);
//!
//!     Server::from_config(&config)
//!         .serve(front, HandlerSource::from(Bootstrap::new(router, factory)))
//!         .await
//!         .unwrap();
//! }
//! ```

mod bootstrap;
mod config;
mod error;
mod error_handler;
mod factory;
mod front_controller;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod sender;
mod server;
mod shutdown;

pub mod middleware;

pub use bootstrap::Bootstrap;
pub use config::Config;
pub use error::{ApplicationError, Error, FatalError, PathRejection, Result};
pub use error_handler::{ErrorHandler, JsonErrorHandler};
pub use factory::{Arguments, HandlerFactory};
pub use front_controller::{FrontController, HandlerSource, Instance};
pub use handler::{handler, BoxedHandler, Handler, IntoOutcome, Outcome};
pub use method::{Verb, VerbSet};
pub use middleware::{
    middleware, BoxedMiddleware, CallStack, Middleware, MiddlewareProvider, MiddlewareStack, Profiler,
};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{
    HandlerIdentity, PathNamespaceStrategy, PathValidator, RouteSpec, Router, RoutingStrategy,
    SingleControllerStrategy, StaticStrategy,
};
pub use sender::{CaptureSender, Delivery, ResponseSender, WriteSender};
pub use server::Server;
pub use shutdown::{FatalRecorder, ShutdownHandler};
