//! Turning failures into responses.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error::Error;
use crate::response::Response;

/// Converts a failure into the response the client receives.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &Error) -> Response;
}

impl<T: ErrorHandler + ?Sized> ErrorHandler for Arc<T> {
    fn handle(&self, error: &Error) -> Response {
        (**self).handle(error)
    }
}

/// Answers every failure with a small JSON document.
///
/// ```json
/// {"code": 404, "msg": "Exception"}
/// ```
///
/// `msg` is `"Internal Error"` for fatal runtime failures and `"Exception"`
/// for everything raised by routing or application code. With
/// [`expose_details`](JsonErrorHandler::expose_details) switched on the body
/// also carries `detail` (`"<TypeName>: <message>"`) and, when known, the
/// `file` and `line` the error came from. Details are off by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonErrorHandler {
    expose_details: bool,
}

#[derive(Serialize)]
struct Payload<'a> {
    code: u16,
    msg: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

impl JsonErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self { expose_details: config.expose_details }
    }

    pub fn expose_details(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }
}

impl ErrorHandler for JsonErrorHandler {
    fn handle(&self, error: &Error) -> Response {
        let status = error.status();
        let msg = if error.is_internal() { "Internal Error" } else { "Exception" };

        let mut payload = Payload { code: status.as_u16(), msg, detail: None, file: None, line: None };
        if self.expose_details {
            payload.detail = Some(format!("{}: {}", error.type_name(), error));
            if let Some((file, line)) = error.location() {
                payload.file = Some(file);
                payload.line = Some(line);
            }
        }

        // Serialising a struct of strings and integers cannot fail.
        let body = serde_json::to_vec(&payload).unwrap_or_default();
        Response::builder().status(status).json(body)
    }
}
