//! Request path extraction and validation.
//!
//! The path is user-supplied and ends up driving handler selection, so it is
//! held to a narrow grammar before any strategy sees it:
//!
//! - `/` is always accepted;
//! - otherwise one or more `/segment` groups, each segment `[A-Za-z0-9_-]+`;
//! - and never two or more `_`/`-` characters in a row (`--`, `__`, `-_`, `_-`).

use std::sync::LazyLock;

use http::Uri;
use regex::Regex;

use crate::error::{Error, PathRejection, Result};

static SAFE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:/[A-Za-z0-9_-]+)+$").expect("SAFE_PATH is a valid regex")
});

static SUSPICIOUS_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[_-]{2,}").expect("SUSPICIOUS_SEQUENCE is a valid regex")
});

/// Extracts the path of a request URI and checks it against the safety
/// grammar. Stateless: the same URI always gives the same answer.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathValidator;

impl PathValidator {
    /// Returns the validated path component of `uri`.
    ///
    /// Accepts absolute (`https://host/foo`) and origin-form (`/foo?x=1`)
    /// URIs. The query string is never part of the result. An absolute URI
    /// with nothing after its authority has no path, which is not the same
    /// as `/`.
    pub fn get_path(&self, uri: &str) -> Result<String> {
        let unparsable = || Error::InvalidPath(PathRejection::Unparsable(uri.to_owned()));

        let parsed: Uri = uri.parse().map_err(|_| unparsable())?;
        if !has_explicit_path(uri, &parsed) {
            return Err(unparsable());
        }
        let path = parsed.path();

        if path == "/" {
            return Ok(path.to_owned());
        }

        if !SAFE_PATH.is_match(path) || SUSPICIOUS_SEQUENCE.is_match(path) {
            return Err(Error::InvalidPath(PathRejection::Unsafe(path.to_owned())));
        }

        Ok(path.to_owned())
    }
}

/// `http::Uri` reports `/` for `https://host`; look at the raw text instead.
fn has_explicit_path(uri: &str, parsed: &Uri) -> bool {
    let Some(authority) = parsed.authority() else {
        return true;
    };
    uri.split_once("://")
        .and_then(|(_, rest)| rest.strip_prefix(authority.as_str()))
        .is_some_and(|after| after.starts_with('/'))
}
