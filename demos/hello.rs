//! Minimal warpcore service: one controller per path, JSON errors.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example hello
//!
//! Try:
//!   curl http://localhost:3000/hello
//!   curl http://localhost:3000/users/list
//!   curl -X DELETE http://localhost:3000/hello    # 405
//!   curl http://localhost:3000/nope--nope         # 400
//!   WARPCORE_EXPOSE_DETAILS=1 cargo run --example hello   # error details in bodies

use serde::Serialize;
use tracing_subscriber::EnvFilter;
use warpcore::{
    Arguments, Bootstrap, Config, FrontController, HandlerFactory, HandlerSource,
    JsonErrorHandler, PathNamespaceStrategy, Request, Response, Result, Router, Server,
    StaticStrategy, Verb,
};

#[derive(Serialize)]
struct User {
    id: u32,
    name: &'static str,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    let router = Router::new()
        .strategy(StaticStrategy::new(Verb::Get).with_route("/", "app::Hello"))
        .strategy(PathNamespaceStrategy::new("app", [Verb::Get, Verb::Head]));

    let mut factory = HandlerFactory::new();
    factory
        .register("app::Hello", |args: &Arguments| {
            let greeting = args.get::<String>(0).cloned().unwrap_or_else(|| "Hello".to_owned());
            Ok(move |_req: &mut Request| {
                Response::json(format!(r#"{{"message":"{greeting}, World!"}}"#))
            })
        })
        .register("app::Users::List", |_: &Arguments| Ok(list_users))
        .with_arguments(Arguments::new().with("Hello".to_owned()));

    let front = FrontController::with_error_handler(JsonErrorHandler::from_config(&config));

    Server::from_config(&config)
        .serve(front, HandlerSource::from(Bootstrap::new(router, factory)))
        .await
        .expect("server error");
}

// GET /users/list
fn list_users(_req: &mut Request) -> Result<Response> {
    let users = [User { id: 1, name: "ada" }, User { id: 2, name: "grace" }];
    let body = serde_json::to_vec(&users)
        .map_err(|e| warpcore::ApplicationError::new("SerializationFailed", e.to_string()))?;
    Ok(Response::json(body))
}
