//! Incoming HTTP request type.

use bytes::Bytes;

use crate::method::Verb;

/// An incoming HTTP request.
///
/// The URI and verb are fixed for the whole dispatch cycle. Headers are
/// mutable so middleware can annotate the request in place (a request id, an
/// authenticated principal) before it travels further inward.
#[derive(Clone, Debug)]
pub struct Request {
    verb: Verb,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Request {
    pub fn new(verb: Verb, uri: impl Into<String>) -> Self {
        Self { verb, uri: uri.into(), headers: Vec::new(), body: Bytes::new() }
    }

    /// Builder-style header, for constructing requests in tests and adapters.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn verb(&self) -> Verb { self.verb }
    pub fn uri(&self) -> &str { &self.uri }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.headers.push((name.to_owned(), value.to_owned())),
        }
    }

    /// Adds a header without replacing earlier values. Repeated headers from
    /// the wire stay in arrival order.
    pub(crate) fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }
}
