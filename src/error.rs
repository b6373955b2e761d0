//! Unified error type.
//!
//! Every failure raised inside the resolve → dispatch pipeline is an
//! [`Error`]. Nothing in the pipeline catches them: they travel back to the
//! [`FrontController`](crate::FrontController), which hands them to its
//! [`ErrorHandler`](crate::ErrorHandler) and sends whatever response comes
//! back.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

use http::StatusCode;

use crate::method::Verb;
use crate::router::HandlerIdentity;

/// Shorthand used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by warpcore's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The URI could not be parsed, or its path failed the safety grammar.
    #[error(transparent)]
    InvalidPath(PathRejection),

    /// No routing strategy produced a candidate for this path.
    #[error("no controller found for URI path {0}")]
    NoRouteToController(String),

    /// The path matched, but not for this verb.
    #[error("method {verb} not allowed for URI path {path}")]
    MethodNotAllowed { path: String, verb: Verb },

    /// The identity is not registered with the handler factory.
    #[error("no controller registered for {0}")]
    HandlerNotFound(HandlerIdentity),

    /// The identity constructed something that cannot dispatch requests.
    #[error("{0} does not correspond to a controller")]
    NotAHandler(HandlerIdentity),

    /// The front controller's handler source produced a non-handler value.
    #[error("unable to bootstrap")]
    BootstrapFailure,

    /// Raised by business logic in a handler or middleware.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// A fatal error recorded outside normal control flow (a panic).
    #[error("{0}")]
    Fatal(FatalError),

    /// I/O failure in the server adapter or a response sender.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The HTTP status this error should be answered with.
    ///
    /// Application errors keep their own code when it is a valid client or
    /// server error (400–599). Anything else falls back to `500`.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPath(_) | Self::NotAHandler(_) => StatusCode::BAD_REQUEST,
            Self::NoRouteToController(_) | Self::HandlerNotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Application(e) => e.status(),
            Self::BootstrapFailure | Self::Fatal(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// `true` for failures of the runtime itself rather than exceptions
    /// raised by routing or application code.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// A short, stable name for the kind of failure, used in diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Self::InvalidPath(_) => "InvalidPath",
            Self::NoRouteToController(_) => "NoRouteToController",
            Self::MethodNotAllowed { .. } => "MethodNotAllowed",
            Self::HandlerNotFound(_) => "HandlerNotFound",
            Self::NotAHandler(_) => "NotAHandler",
            Self::BootstrapFailure => "BootstrapFailure",
            Self::Application(e) => e.type_name(),
            Self::Fatal(_) => "Fatal",
            Self::Io(_) => "Io",
        }
    }

    /// Source location the error originated at, when known.
    pub fn location(&self) -> Option<(&str, u32)> {
        match self {
            Self::Application(e) => Some((e.location.file(), e.location.line())),
            Self::Fatal(e) => e.file.as_deref().map(|file| (file, e.line)),
            _ => None,
        }
    }
}

// ── PathRejection ─────────────────────────────────────────────────────────────

/// Why a URI was refused by the path validator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathRejection {
    /// The URI does not parse, or carries no path at all.
    #[error("unable to parse URI path `{0}`")]
    Unparsable(String),

    /// The path parsed but failed the safety grammar.
    #[error("invalid characters or sequences in URI path `{0}`")]
    Unsafe(String),
}

// ── ApplicationError ──────────────────────────────────────────────────────────

/// A failure raised by handler or middleware code.
///
/// Carries a type name (shown in diagnostic output), a message, an optional
/// status code and the location it was created at.
///
/// ```rust
/// use warpcore::ApplicationError;
///
/// let err = ApplicationError::new("LegalHold", "blocked in your region").with_status(451);
/// assert_eq!(err.status().as_u16(), 451);
/// ```
#[derive(Debug)]
pub struct ApplicationError {
    type_name: Cow<'static, str>,
    message: String,
    code: Option<u16>,
    location: &'static Location<'static>,
}

impl ApplicationError {
    #[track_caller]
    pub fn new(type_name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            code: None,
            location: Location::caller(),
        }
    }

    /// Attach a status code. Codes outside 400–599 are answered with `500`.
    pub fn with_status(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<u16> {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.code
            .and_then(|c| StatusCode::from_u16(c).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApplicationError {}

// ── FatalError ────────────────────────────────────────────────────────────────

/// The last unrecoverable error the process recorded, typically a panic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FatalError {
    pub message: String,
    pub file: Option<String>,
    pub line: u32,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_errors_map_to_client_statuses() {
        let unsafe_path = Error::InvalidPath(PathRejection::Unsafe("/a=b".into()));
        assert_eq!(unsafe_path.status(), StatusCode::BAD_REQUEST);
        let unparsable = Error::InvalidPath(PathRejection::Unparsable("not a uri".into()));
        assert_eq!(unparsable.status(), StatusCode::BAD_REQUEST);
        assert_eq!(unparsable.type_name(), "InvalidPath");
        assert_eq!(Error::NoRouteToController("/a".into()).status(), StatusCode::NOT_FOUND);
        let err = Error::MethodNotAllowed { path: "/a".into(), verb: Verb::Put };
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(Error::HandlerNotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::NotAHandler("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::BootstrapFailure.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn path_rejections_say_what_went_wrong() {
        let unparsable = Error::InvalidPath(PathRejection::Unparsable("http://[::1".into()));
        assert_eq!(unparsable.to_string(), "unable to parse URI path `http://[::1`");

        let unsafe_path = Error::InvalidPath(PathRejection::Unsafe("/a--b".into()));
        assert_eq!(unsafe_path.to_string(), "invalid characters or sequences in URI path `/a--b`");
    }

    #[test]
    fn application_status_keeps_valid_error_codes() {
        let legal = ApplicationError::new("LegalHold", "nope").with_status(451);
        assert_eq!(legal.status().as_u16(), 451);

        let teapot = ApplicationError::new("Brew", "short and stout").with_status(418);
        assert_eq!(teapot.status().as_u16(), 418);
    }

    #[test]
    fn application_status_falls_back_to_500() {
        for code in [12345, 200, 302, 99] {
            let err = ApplicationError::new("Weird", "code").with_status(code);
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR, "code {code}");
        }
        assert_eq!(ApplicationError::new("Bare", "none").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn application_error_records_its_origin() {
        let err: Error = ApplicationError::new("Oops", "bad").into();
        let (file, line) = err.location().unwrap();
        assert!(file.ends_with("error.rs"));
        assert!(line > 0);
        assert_eq!(err.type_name(), "Oops");
        assert_eq!(err.to_string(), "bad");
        assert!(!err.is_internal());
    }

    #[test]
    fn fatal_errors_are_internal() {
        let err = Error::Fatal(FatalError { message: "boom".into(), file: None, line: 0 });
        assert!(err.is_internal());
        assert_eq!(err.location(), None);
    }
}
