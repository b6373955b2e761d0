//! Routing strategies: pluggable path → handler-identity rules.

use std::collections::HashMap;

use crate::method::VerbSet;

use super::HandlerIdentity;

/// One rule for mapping a validated path to a handler identity.
///
/// `for_verbs` names the verbs the strategy's routes are valid for. An empty
/// set accepts no verb; see [`VerbSet`].
pub trait RoutingStrategy: Send + Sync {
    fn route(&self, path: &str) -> Option<HandlerIdentity>;
    fn for_verbs(&self) -> VerbSet;
}

// ── SingleControllerStrategy ──────────────────────────────────────────────────

/// Routes every path to the same handler.
///
/// Handy for single-endpoint services, or registered last as a catch-all.
#[derive(Clone, Debug)]
pub struct SingleControllerStrategy {
    identity: HandlerIdentity,
    verbs: VerbSet,
}

impl SingleControllerStrategy {
    pub fn new(identity: impl Into<HandlerIdentity>, verbs: impl Into<VerbSet>) -> Self {
        Self { identity: identity.into(), verbs: verbs.into() }
    }
}

impl RoutingStrategy for SingleControllerStrategy {
    fn route(&self, _path: &str) -> Option<HandlerIdentity> {
        Some(self.identity.clone())
    }

    fn for_verbs(&self) -> VerbSet {
        self.verbs
    }
}

// ── StaticStrategy ────────────────────────────────────────────────────────────

/// Routes through an explicit path → identity table.
///
/// ```rust
/// use warpcore::{RoutingStrategy, StaticStrategy, Verb};
///
/// let mut routes = StaticStrategy::new(Verb::Get)
///     .with_route("/users", "app::Users");
/// routes.add_route("/posts", "app::Posts");
///
/// assert_eq!(routes.route("/posts").unwrap().as_str(), "app::Posts");
/// assert!(routes.route("/comments").is_none());
/// ```
#[derive(Clone, Debug)]
pub struct StaticStrategy {
    routes: HashMap<String, HandlerIdentity>,
    verbs: VerbSet,
}

impl StaticStrategy {
    pub fn new(verbs: impl Into<VerbSet>) -> Self {
        Self { routes: HashMap::new(), verbs: verbs.into() }
    }

    pub fn with_route(mut self, path: impl Into<String>, identity: impl Into<HandlerIdentity>) -> Self {
        self.add_route(path, identity);
        self
    }

    /// Adds a route, replacing any identity already mapped to `path`.
    pub fn add_route(
        &mut self,
        path: impl Into<String>,
        identity: impl Into<HandlerIdentity>,
    ) -> &mut Self {
        self.routes.insert(path.into(), identity.into());
        self
    }
}

impl RoutingStrategy for StaticStrategy {
    fn route(&self, path: &str) -> Option<HandlerIdentity> {
        self.routes.get(path).cloned()
    }

    fn for_verbs(&self) -> VerbSet {
        self.verbs
    }
}

// ── PathNamespaceStrategy ─────────────────────────────────────────────────────

/// Derives the identity from the path itself.
///
/// `/`, `-` and `_` are word boundaries. Each word is lower-cased, then its
/// first letter upper-cased; words within a segment are joined, segments are
/// joined with `::`, and the configured root is prefixed:
///
/// ```text
/// root "app::controllers", path /foo/bar-baz  →  app::controllers::Foo::BarBaz
/// root "",                 path /FOO_bar      →  ::FooBar
/// ```
///
/// # Security
///
/// This strategy "matches" every path but `/`. Whatever the handler factory
/// can construct under the derived name becomes reachable from the network.
/// Always give it a root that only your controllers live under, and keep
/// non-controller registrations in the factory outside that root.
#[derive(Clone, Debug)]
pub struct PathNamespaceStrategy {
    root: String,
    verbs: VerbSet,
}

impl PathNamespaceStrategy {
    pub fn new(root: impl Into<String>, verbs: impl Into<VerbSet>) -> Self {
        Self { root: root.into(), verbs: verbs.into() }
    }
}

impl RoutingStrategy for PathNamespaceStrategy {
    /// Returns `None` for `/`: there is nothing to derive a name from.
    fn route(&self, path: &str) -> Option<HandlerIdentity> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return None;
        }

        let mut identity = self.root.clone();
        for segment in segments {
            identity.push_str("::");
            for word in segment.split(['-', '_']) {
                push_capitalised(&mut identity, word);
            }
        }
        Some(identity.into())
    }

    fn for_verbs(&self) -> VerbSet {
        self.verbs
    }
}

fn push_capitalised(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.extend(chars.flat_map(char::to_lowercase));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Verb;

    #[test]
    fn single_controller_ignores_the_path() {
        let strategy = SingleControllerStrategy::new("RoutedController", Verb::Get);
        for path in ["/foo", "/foo/bar", "/foo/bar/baz", "/"] {
            assert_eq!(strategy.route(path).unwrap().as_str(), "RoutedController");
        }
        assert!(strategy.for_verbs().contains(Verb::Get));
        assert!(!strategy.for_verbs().contains(Verb::Post));
    }

    #[test]
    fn static_routes_hit_and_miss() {
        let strategy = StaticStrategy::new(VerbSet::all())
            .with_route("/foo", "FooController")
            .with_route("/foo/bar", "FooBarController")
            .with_route("/foo/bar/baz", "FooBarBazController");

        assert_eq!(strategy.route("/foo").unwrap().as_str(), "FooController");
        assert_eq!(strategy.route("/foo/bar").unwrap().as_str(), "FooBarController");
        assert_eq!(strategy.route("/foo/bar/baz").unwrap().as_str(), "FooBarBazController");
        assert!(strategy.route("/quux").is_none());
    }

    #[test]
    fn static_routes_can_be_added_and_replaced() {
        let mut strategy = StaticStrategy::new(Verb::Get);
        assert!(strategy.route("/foo").is_none());

        strategy.add_route("/foo", "FooController");
        assert_eq!(strategy.route("/foo").unwrap().as_str(), "FooController");

        strategy.add_route("/foo", "OtherController");
        assert_eq!(strategy.route("/foo").unwrap().as_str(), "OtherController");
    }

    #[test]
    fn path_namespace_derivation() {
        let cases = [
            ("", "/foo/bar/baz/quux", "::Foo::Bar::Baz::Quux"),
            ("app::prefix", "/foo/bar/baz/quux", "app::prefix::Foo::Bar::Baz::Quux"),
            ("", "/foo-bar-baz-quux", "::FooBarBazQuux"),
            ("app::prefix", "/foo-bar-baz-quux", "app::prefix::FooBarBazQuux"),
            ("", "/foo_bar_baz_quux", "::FooBarBazQuux"),
            ("app::prefix", "/foo_bar-baz_quux", "app::prefix::FooBarBazQuux"),
            ("", "/foo/BAR/bAZ/QuuX", "::Foo::Bar::Baz::Quux"),
        ];
        for (root, path, expected) in cases {
            let strategy = PathNamespaceStrategy::new(root, Verb::Get);
            assert_eq!(strategy.route(path).unwrap().as_str(), expected, "path {path}");
        }
    }

    #[test]
    fn path_namespace_has_nothing_to_derive_for_root() {
        assert!(PathNamespaceStrategy::new("app", Verb::Get).route("/").is_none());
    }
}
