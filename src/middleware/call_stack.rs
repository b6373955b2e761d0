//! The middleware call stack.

use std::fmt;
use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler, Outcome};
use crate::request::Request;

use super::{BoxedMiddleware, MiddlewareProvider};

/// A nested chain of middleware around one root handler.
///
/// Every [`add`](CallStack::add) wraps the current entry point in a new slot,
/// so the most recently added middleware is outermost. Middleware therefore
/// sees the request in **reverse** order of addition and the response in
/// order of addition:
///
/// ```text
/// add(A); add(B); add(C);
///
///   request  →  C → B → A → root
///   response ←  C ← B ← A ← root
/// ```
///
/// Add the middleware that must run first (authentication, profiling) last.
///
/// If the root is a middleware provider its middleware is added during
/// construction, before anything else, so handler-owned middleware always
/// sits innermost.
pub struct CallStack {
    root: BoxedHandler,
    entry_point: BoxedHandler,
}

impl CallStack {
    pub fn new(root: BoxedHandler) -> Self {
        let mut stack = Self { entry_point: Arc::clone(&root), root: Arc::clone(&root) };
        if let Some(provider) = root.middleware_provider() {
            stack.from_provider(provider);
        }
        stack
    }

    /// A stack around `root` with the global middleware of `provider` added
    /// on top of whatever the root brings along.
    pub fn build(root: BoxedHandler, provider: &dyn MiddlewareProvider) -> Self {
        let mut stack = Self::new(root);
        stack.from_provider(provider);
        stack
    }

    /// Wrap the current entry point. The new middleware becomes outermost.
    pub fn add(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        let next = Arc::clone(&self.entry_point);
        self.entry_point = Arc::new(Slot { middleware, next });
        self
    }

    /// [`add`](CallStack::add) each middleware in the order given.
    pub fn add_multi(&mut self, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> &mut Self {
        for m in middleware {
            self.add(m);
        }
        self
    }

    /// Drop every middleware, leaving only the root.
    pub fn reset(&mut self) -> &mut Self {
        self.entry_point = Arc::clone(&self.root);
        self
    }

    pub fn replace_with(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        self.reset().add(middleware)
    }

    pub fn from_provider(&mut self, provider: &dyn MiddlewareProvider) -> &mut Self {
        self.add_multi(provider.all_middleware().iter().cloned())
    }

    /// `true` once any middleware wraps the root.
    pub fn is_configured(&self) -> bool {
        !Arc::ptr_eq(&self.entry_point, &self.root)
    }
}

impl Handler for CallStack {
    fn dispatch(&self, req: &mut Request) -> Outcome {
        self.entry_point.dispatch(req)
    }
}

impl fmt::Debug for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallStack")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

// ── Slot ──────────────────────────────────────────────────────────────────────

/// One link of the chain: a middleware and everything inside it.
struct Slot {
    middleware: BoxedMiddleware,
    next: BoxedHandler,
}

impl Handler for Slot {
    fn dispatch(&self, req: &mut Request) -> Outcome {
        self.middleware.handle(req, &*self.next).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Result;
    use crate::handler::handler;
    use crate::method::Verb;
    use crate::middleware::{middleware, Middleware, MiddlewareStack};
    use crate::response::Response;

    /// Appends its name to the body on the way out and to `x-trail` on the
    /// way in.
    struct Append(&'static str);

    impl Middleware for Append {
        fn handle(&self, req: &mut Request, next: &dyn Handler) -> Result<Response> {
            let trail = format!("{}{}", req.header("x-trail").unwrap_or(""), self.0);
            req.set_header("x-trail", &trail);

            let mut res = next.dispatch(req)?.unwrap_or_else(Response::no_content);
            let body = format!("{}{}", String::from_utf8_lossy(res.body()), self.0);
            res.set_body(body);
            Ok(res)
        }
    }

    fn controller(req: &mut Request) -> Response {
        let trail = req.header("x-trail").unwrap_or("").to_owned();
        Response::builder().header("x-seen", &trail).text("controller")
    }

    fn run(stack: &CallStack) -> Response {
        stack.dispatch(&mut Request::new(Verb::Get, "/")).unwrap().unwrap()
    }

    #[test]
    fn runs_in_reverse_order_of_addition() {
        let mut stack = CallStack::new(handler(controller));
        stack
            .add(middleware(Append("A")))
            .add(middleware(Append("B")))
            .add(middleware(Append("C")));

        let res = run(&stack);
        assert_eq!(res.body(), b"controllerABC");
        assert_eq!(res.header("x-seen"), Some("CBA"));
    }

    #[test]
    fn add_multi_matches_successive_adds() {
        let mut stack = CallStack::new(handler(controller));
        stack.add_multi([middleware(Append("A")), middleware(Append("B"))]);
        stack.add(middleware(Append("C")));

        assert_eq!(run(&stack).body(), b"controllerABC");
    }

    #[test]
    fn short_circuit_skips_everything_inward() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let root = handler(move |_req: &mut Request| {
            counted.fetch_add(1, Ordering::SeqCst);
            Response::text("root")
        });

        let mut stack = CallStack::new(root);
        stack
            .add(middleware(Append("inner")))
            .add(middleware(|_req: &mut Request, _next: &dyn Handler| -> Result<Response> {
                Ok(Response::text("denied"))
            }));

        assert_eq!(run(&stack).body(), b"denied");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reset_restores_root_only_behaviour() {
        let mut stack = CallStack::new(handler(controller));
        assert!(!stack.is_configured());

        stack.add(middleware(Append("A"))).add(middleware(Append("B")));
        assert!(stack.is_configured());

        stack.reset();
        assert!(!stack.is_configured());
        assert_eq!(run(&stack).body(), b"controller");
    }

    #[test]
    fn replace_with_equals_reset_then_add() {
        let mut replaced = CallStack::new(handler(controller));
        replaced.add(middleware(Append("A"))).replace_with(middleware(Append("X")));

        let mut rebuilt = CallStack::new(handler(controller));
        rebuilt.add(middleware(Append("A"))).reset().add(middleware(Append("X")));

        assert_eq!(run(&replaced).body(), b"controllerX");
        assert_eq!(run(&replaced).body(), run(&rebuilt).body());
    }

    struct OwnsMiddleware {
        middleware: MiddlewareStack,
    }

    impl Handler for OwnsMiddleware {
        fn dispatch(&self, req: &mut Request) -> Outcome {
            Ok(Some(controller(req)))
        }

        fn middleware_provider(&self) -> Option<&dyn MiddlewareProvider> {
            Some(&self.middleware)
        }
    }

    #[test]
    fn handler_middleware_sits_innermost() {
        let mut owned = MiddlewareStack::new();
        owned.add_middleware(Append("h1")).add_middleware(Append("h2"));
        let mut global = MiddlewareStack::new();
        global.add_middleware(Append("g1")).add_middleware(Append("g2"));

        let stack = CallStack::build(handler(OwnsMiddleware { middleware: owned }), &global);
        assert!(stack.is_configured());

        let res = run(&stack);
        assert_eq!(res.body(), b"controllerh1h2g1g2");
        assert_eq!(res.header("x-seen"), Some("g2g1h2h1"));
    }

    #[test]
    fn reset_also_drops_handler_middleware() {
        let mut owned = MiddlewareStack::new();
        owned.add_middleware(Append("h"));

        let mut stack = CallStack::new(handler(OwnsMiddleware { middleware: owned }));
        stack.reset();
        assert_eq!(run(&stack).body(), b"controller");
    }
}
