//! Response senders: how a finished response leaves the process.
//!
//! The dispatch core never writes to a socket. It hands the response to a
//! [`ResponseSender`], which either writes HTTP/1.1 framing to a byte sink
//! ([`WriteSender`]) or keeps the response for someone else to deliver
//! ([`CaptureSender`], used by the server adapter and in tests).

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::response::Response;

/// Emits a response.
///
/// Headers and body can go out separately. Once headers are out,
/// [`headers_sent`](ResponseSender::headers_sent) reports `true` and a late
/// error can only append a body.
pub trait ResponseSender: Send + Sync {
    /// Status line, headers, then body.
    fn send(&self, response: &Response) -> Result<()> {
        self.send_headers(response)?;
        self.send_body(response)
    }

    fn send_headers(&self, response: &Response) -> Result<()>;
    fn send_body(&self, response: &Response) -> Result<()>;
    fn headers_sent(&self) -> bool;
}

impl<T: ResponseSender + ?Sized> ResponseSender for Arc<T> {
    fn send(&self, response: &Response) -> Result<()> {
        (**self).send(response)
    }

    fn send_headers(&self, response: &Response) -> Result<()> {
        (**self).send_headers(response)
    }

    fn send_body(&self, response: &Response) -> Result<()> {
        (**self).send_body(response)
    }

    fn headers_sent(&self) -> bool {
        (**self).headers_sent()
    }
}

// ── WriteSender ───────────────────────────────────────────────────────────────

/// Writes HTTP/1.1 framing to any [`Write`] sink: a socket, stdout, a buffer.
pub struct WriteSender<W> {
    inner: Mutex<WriteState<W>>,
}

struct WriteState<W> {
    writer: W,
    headers_sent: bool,
}

impl<W: Write + Send> WriteSender<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: Mutex::new(WriteState { writer, headers_sent: false }) }
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().writer
    }
}

impl<W: Write + Send> ResponseSender for WriteSender<W> {
    fn send_headers(&self, response: &Response) -> Result<()> {
        let mut state = self.inner.lock();
        response.write_head(&mut state.writer)?;
        state.headers_sent = true;
        Ok(())
    }

    fn send_body(&self, response: &Response) -> Result<()> {
        response.write_body(&mut self.inner.lock().writer)?;
        Ok(())
    }

    fn headers_sent(&self) -> bool {
        self.inner.lock().headers_sent
    }
}

// ── CaptureSender ─────────────────────────────────────────────────────────────

/// What a [`CaptureSender`] was asked to deliver.
#[derive(Clone, Debug)]
pub enum Delivery {
    /// `send` was called.
    Complete(Response),
    /// Only headers went out.
    Headers(Response),
    /// Headers went out earlier and a body followed, possibly from a
    /// different response.
    Body { head: Response, body: Response },
}

impl Delivery {
    /// Collapse into the single response a client would have seen: the head
    /// that went out first with the body that followed it.
    pub fn into_response(self) -> Response {
        match self {
            Self::Complete(res) | Self::Headers(res) => res,
            Self::Body { mut head, body } => {
                head.set_body(body.body().to_vec());
                head
            }
        }
    }
}

/// Keeps the response in memory instead of writing it anywhere.
#[derive(Debug, Default)]
pub struct CaptureSender {
    delivery: Mutex<Option<Delivery>>,
}

impl CaptureSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take what was delivered, leaving the sender empty.
    pub fn take(&self) -> Option<Delivery> {
        self.delivery.lock().take()
    }
}

impl ResponseSender for CaptureSender {
    fn send(&self, response: &Response) -> Result<()> {
        *self.delivery.lock() = Some(Delivery::Complete(response.clone()));
        Ok(())
    }

    fn send_headers(&self, response: &Response) -> Result<()> {
        *self.delivery.lock() = Some(Delivery::Headers(response.clone()));
        Ok(())
    }

    fn send_body(&self, response: &Response) -> Result<()> {
        let mut slot = self.delivery.lock();
        *slot = Some(match slot.take() {
            Some(Delivery::Headers(head)) | Some(Delivery::Body { head, .. }) => {
                Delivery::Body { head, body: response.clone() }
            }
            Some(Delivery::Complete(_)) | None => Delivery::Complete(response.clone()),
        });
        Ok(())
    }

    fn headers_sent(&self) -> bool {
        self.delivery.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    #[test]
    fn write_sender_frames_the_response() {
        let sender = WriteSender::new(Vec::new());
        assert!(!sender.headers_sent());

        sender.send(&Response::text("hello")).unwrap();
        assert!(sender.headers_sent());

        let wire = String::from_utf8(sender.into_inner()).unwrap();
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.contains("content-type: text/plain; charset=utf-8\r\n"));
        assert!(wire.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn capture_sender_keeps_the_whole_response() {
        let sender = CaptureSender::new();
        sender.send(&Response::text("done")).unwrap();
        assert!(sender.headers_sent());

        let res = sender.take().unwrap().into_response();
        assert_eq!(res.body(), b"done");
        assert!(sender.take().is_none());
        assert!(!sender.headers_sent());
    }

    #[test]
    fn late_body_keeps_the_original_head() {
        let sender = CaptureSender::new();
        sender.send_headers(&Response::text("partial")).unwrap();
        let late = Response::builder().status(StatusCode::INTERNAL_SERVER_ERROR).text("oops");
        sender.send_body(&late).unwrap();

        let res = sender.take().unwrap().into_response();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"oops");
    }
}
