//! Middleware ordering, short-circuiting and controller-owned middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example middleware
//!
//! Try:
//!   curl -i http://localhost:3000/                              # 401
//!   curl -i -H 'authorization: Bearer demo' http://localhost:3000/
//!
//! The profiler is added last, so it runs first and times everything,
//! including the auth check that may refuse the request.

use http::StatusCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warpcore::{
    ApplicationError, Config, FrontController, Handler, HandlerSource,
    JsonErrorHandler, Middleware, MiddlewareProvider, MiddlewareStack, Outcome, Profiler, Request,
    Response, Result, Server,
};

/// Refuses requests without the demo bearer token. Never calls `next` then.
struct RequireToken;

impl Middleware for RequireToken {
    fn handle(&self, req: &mut Request, next: &dyn Handler) -> Result<Response> {
        match req.header("authorization") {
            Some("Bearer demo") => {
                req.set_header("x-principal", "demo");
                Ok(next.dispatch(req)?.unwrap_or_else(Response::no_content))
            }
            _ => Err(ApplicationError::new("Unauthorized", "missing or wrong token")
                .with_status(StatusCode::UNAUTHORIZED.as_u16())
                .into()),
        }
    }
}

/// Greets the authenticated principal and tags its own responses.
struct Dashboard {
    middleware: MiddlewareStack,
}

impl Dashboard {
    fn new() -> Self {
        let mut middleware = MiddlewareStack::new();
        middleware.add_middleware(|req: &mut Request, next: &dyn Handler| -> Result<Response> {
            let mut res = next.dispatch(req)?.unwrap_or_else(Response::no_content);
            res.set_header("x-served-by", "dashboard");
            Ok(res)
        });
        Self { middleware }
    }
}

impl Handler for Dashboard {
    fn dispatch(&self, req: &mut Request) -> Outcome {
        let who = req.header("x-principal").unwrap_or("nobody");
        info!(principal = who, "rendering dashboard");
        Ok(Some(Response::text(format!("welcome, {who}"))))
    }

    fn middleware_provider(&self) -> Option<&dyn MiddlewareProvider> {
        Some(&self.middleware)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    let mut front = FrontController::with_error_handler(JsonErrorHandler::from_config(&config));
    front.add_middleware(RequireToken).add_middleware(Profiler);

    Server::from_config(&config)
        .serve(front, HandlerSource::handler(Dashboard::new()))
        .await
        .expect("server error");
}
