//! HTTP verbs as a typed enum, and compact sets of them.
//!
//! Only the eight standard methods take part in routing. Unknown method
//! strings are rejected at the server level with `405 Method Not Allowed`
//! before they ever reach the front controller.

use std::fmt;
use std::str::FromStr;

/// A routable HTTP verb.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Trace,
    Patch,
}

impl Verb {
    /// Every verb, in declaration order.
    pub const ALL: [Verb; 8] = [
        Verb::Get,
        Verb::Head,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Options,
        Verb::Trace,
        Verb::Patch,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Delete  => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace   => "TRACE",
            Self::Patch   => "PATCH",
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Verb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "DELETE"  => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "TRACE"   => Ok(Self::Trace),
            "PATCH"   => Ok(Self::Patch),
            _         => Err(()),
        }
    }
}

impl TryFrom<&http::Method> for Verb {
    type Error = ();

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── VerbSet ───────────────────────────────────────────────────────────────────

/// The verbs a routing strategy's routes are valid for.
///
/// An empty set accepts **no** verb. A strategy registered with an empty set
/// still matches paths, so requests to those paths fail with
/// `MethodNotAllowed` rather than `NoRouteToController`. Use
/// [`VerbSet::all`] for a strategy that should answer every verb.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct VerbSet(u8);

impl VerbSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Verb::ALL.into_iter().collect()
    }

    pub fn with(mut self, verb: Verb) -> Self {
        self.0 |= verb.bit();
        self
    }

    pub fn contains(self, verb: Verb) -> bool {
        self.0 & verb.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the members in [`Verb::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Verb> {
        Verb::ALL.into_iter().filter(move |v| self.contains(*v))
    }
}

impl FromIterator<Verb> for VerbSet {
    fn from_iter<I: IntoIterator<Item = Verb>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Verb> for VerbSet {
    fn from(verb: Verb) -> Self {
        Self::empty().with(verb)
    }
}

impl<const N: usize> From<[Verb; N]> for VerbSet {
    fn from(verbs: [Verb; N]) -> Self {
        verbs.into_iter().collect()
    }
}

impl fmt::Debug for VerbSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_case_sensitively() {
        for verb in Verb::ALL {
            assert_eq!(verb.as_str().parse::<Verb>(), Ok(verb));
        }
        assert!("get".parse::<Verb>().is_err());
        assert!("CONNECT".parse::<Verb>().is_err());
    }

    #[test]
    fn converts_from_http_method() {
        assert_eq!(Verb::try_from(&http::Method::PATCH), Ok(Verb::Patch));
        assert!(Verb::try_from(&http::Method::CONNECT).is_err());
    }

    #[test]
    fn empty_set_accepts_no_verb() {
        let set = VerbSet::empty();
        assert!(set.is_empty());
        assert!(Verb::ALL.iter().all(|v| !set.contains(*v)));
    }

    #[test]
    fn set_membership() {
        let set = VerbSet::from([Verb::Get, Verb::Head]);
        assert!(set.contains(Verb::Get));
        assert!(set.contains(Verb::Head));
        assert!(!set.contains(Verb::Post));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Verb::Get, Verb::Head]);
        assert!(Verb::ALL.iter().all(|v| VerbSet::all().contains(*v)));
    }
}
