//! Strategy-based request router.
//!
//! The router does not hold handlers. It answers one question: which handler
//! *identity* should serve this request? Strategies are tried in the order
//! they were registered, their answers cached per path, and the first answer
//! valid for the request's verb wins. No re-sorting, no "best match".

mod path;
mod strategy;

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::method::VerbSet;
use crate::request::Request;

pub use path::PathValidator;
pub use strategy::{PathNamespaceStrategy, RoutingStrategy, SingleControllerStrategy, StaticStrategy};

// ── HandlerIdentity ───────────────────────────────────────────────────────────

/// A token naming a handler, e.g. `app::controllers::Users`.
///
/// The router's output and the handler factory's input. Not executable by
/// itself.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct HandlerIdentity(Arc<str>);

impl HandlerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HandlerIdentity {
    fn from(s: &str) -> Self { Self(Arc::from(s)) }
}

impl From<String> for HandlerIdentity {
    fn from(s: String) -> Self { Self(Arc::from(s)) }
}

impl Borrow<str> for HandlerIdentity {
    fn borrow(&self) -> &str { &self.0 }
}

impl fmt::Display for HandlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── RouteSpec ─────────────────────────────────────────────────────────────────

/// What one strategy made of one path: an identity and the verbs it serves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteSpec {
    identity: HandlerIdentity,
    verbs: VerbSet,
}

impl RouteSpec {
    pub fn identity(&self) -> &HandlerIdentity { &self.identity }
    pub fn verbs(&self) -> VerbSet { self.verbs }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Build it once at startup; share it between requests. Each distinct path
/// runs through the strategies once, and the resulting route specs are
/// cached for the lifetime of the router.
///
/// ```rust
/// use warpcore::{Request, Router, SingleControllerStrategy, StaticStrategy, Verb};
///
/// let router = Router::new()
///     .strategy(StaticStrategy::new(Verb::Post).with_route("/users", "app::CreateUser"))
///     .strategy(SingleControllerStrategy::new("app::Fallback", Verb::Get));
///
/// let id = router.route(&Request::new(Verb::Post, "/users")).unwrap();
/// assert_eq!(id.as_str(), "app::CreateUser");
/// ```
pub struct Router {
    validator: PathValidator,
    strategies: Vec<Box<dyn RoutingStrategy>>,
    cache: DashMap<String, Arc<[RouteSpec]>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            validator: PathValidator,
            strategies: Vec::new(),
            cache: DashMap::new(),
        }
    }

    /// Register a strategy after those already registered. Returns `self`
    /// for chaining.
    pub fn strategy(mut self, strategy: impl RoutingStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Resolve the request to a handler identity.
    ///
    /// Fails with [`Error::InvalidPath`] when the URI does not pass the path
    /// validator, [`Error::NoRouteToController`] when no strategy matched the
    /// path, and [`Error::MethodNotAllowed`] when strategies matched but none
    /// for this verb.
    pub fn route(&self, req: &Request) -> Result<HandlerIdentity> {
        let path = self.validator.get_path(req.uri())?;
        let specs = self.resolve(&path);

        if specs.is_empty() {
            return Err(Error::NoRouteToController(path));
        }

        let verb = req.verb();
        specs
            .iter()
            .find(|spec| spec.verbs.contains(verb))
            .map(|spec| spec.identity.clone())
            .ok_or(Error::MethodNotAllowed { path, verb })
    }

    /// The cached route specs for a validated path, if it was routed before.
    pub fn cached(&self, path: &str) -> Option<Arc<[RouteSpec]>> {
        self.cache.get(path).map(|specs| Arc::clone(specs.value()))
    }

    fn resolve(&self, path: &str) -> Arc<[RouteSpec]> {
        if let Some(specs) = self.cached(path) {
            return specs;
        }

        let entry = self.cache.entry(path.to_owned()).or_insert_with(|| {
            let specs: Arc<[RouteSpec]> = self
                .strategies
                .iter()
                .filter_map(|strategy| {
                    strategy.route(path).map(|identity| RouteSpec {
                        identity,
                        verbs: strategy.for_verbs(),
                    })
                })
                .collect();
            debug!(path, matches = specs.len(), "route cache filled");
            specs
        });
        Arc::clone(entry.value())
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
