//! Request/response cycle profiler.

use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

use super::Middleware;

/// Tags every cycle with a request id and logs how long everything inside it
/// took.
///
/// The id goes into the request's `x-request-id` header (an existing value,
/// set by a proxy, is kept) and onto the response. Timing covers everything
/// further inward, so register this as the outermost middleware: last.
#[derive(Clone, Copy, Debug, Default)]
pub struct Profiler;

pub(crate) const REQUEST_ID: &str = "x-request-id";

impl Middleware for Profiler {
    fn handle(&self, req: &mut Request, next: &dyn Handler) -> Result<Response> {
        let id = match req.header(REQUEST_ID) {
            Some(id) => id.to_owned(),
            None => {
                let id = Uuid::new_v4().to_string();
                req.set_header(REQUEST_ID, &id);
                id
            }
        };

        let start = Instant::now();
        info!(request_id = %id, verb = %req.verb(), uri = req.uri(), "request started");

        let result = next.dispatch(req);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(res) => {
                let mut res = res.unwrap_or_else(Response::no_content);
                res.set_header(REQUEST_ID, &id);
                info!(
                    request_id = %id,
                    status = res.status_code().as_u16(),
                    elapsed_ms,
                    "request ended",
                );
                Ok(res)
            }
            Err(e) => {
                info!(request_id = %id, error = %e, elapsed_ms, "request failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApplicationError;
    use crate::handler::handler;
    use crate::method::Verb;
    use crate::middleware::{middleware, CallStack};

    fn echo_id(req: &mut Request) -> Response {
        Response::text(req.header(REQUEST_ID).unwrap_or("missing").to_owned())
    }

    #[test]
    fn tags_request_and_response_with_the_same_id() {
        let mut stack = CallStack::new(handler(echo_id));
        stack.add(middleware(Profiler));

        let res = stack.dispatch(&mut Request::new(Verb::Get, "/")).unwrap().unwrap();
        let seen = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(Uuid::parse_str(&seen).is_ok());
        assert_eq!(res.header(REQUEST_ID), Some(seen.as_str()));
    }

    #[test]
    fn keeps_an_upstream_request_id() {
        let mut stack = CallStack::new(handler(echo_id));
        stack.add(middleware(Profiler));

        let mut req = Request::new(Verb::Get, "/").with_header("X-Request-Id", "from-proxy");
        let res = stack.dispatch(&mut req).unwrap().unwrap();
        assert_eq!(res.body(), b"from-proxy");
    }

    #[test]
    fn passes_failures_through() {
        let failing = handler(|_req: &mut Request| -> Result<Response> {
            Err(ApplicationError::new("Broken", "nope").into())
        });
        let mut stack = CallStack::new(failing);
        stack.add(middleware(Profiler));

        assert!(stack.dispatch(&mut Request::new(Verb::Get, "/")).is_err());
    }
}
