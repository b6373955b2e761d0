//! Out-of-band failure handling.
//!
//! Panics do not travel through `Result`, so the front controller never sees
//! them. A [`FatalRecorder`] keeps the last one, and a [`ShutdownHandler`]
//! turns it into a response at the end of the cycle, even when part of a
//! response already went out.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use crate::error::{Error, FatalError, Result};
use crate::error_handler::ErrorHandler;
use crate::sender::ResponseSender;

/// Holds the most recent fatal error.
///
/// The slot is shared: clones observe the same error, and with the panic
/// hook installed a panic on any thread lands here.
#[derive(Clone, Default)]
pub struct FatalRecorder {
    slot: Arc<Mutex<Option<FatalError>>>,
}

impl FatalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder fed by a process-wide panic hook. The previous hook still
    /// runs afterwards.
    pub fn install() -> Self {
        let recorder = Self::new();
        let hook_slot = Arc::clone(&recorder.slot);
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            let location = info.location();
            *hook_slot.lock() = Some(FatalError {
                message: payload_message(info.payload()),
                file: location.map(|l| l.file().to_owned()),
                line: location.map_or(0, |l| l.line()),
            });
            previous(info);
        }));
        recorder
    }

    pub fn record(&self, fatal: FatalError) {
        *self.slot.lock() = Some(fatal);
    }

    pub fn last(&self) -> Option<FatalError> {
        self.slot.lock().clone()
    }

    pub fn take(&self) -> Option<FatalError> {
        self.slot.lock().take()
    }
}

impl fmt::Debug for FatalRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FatalRecorder").field("last", &*self.slot.lock()).finish()
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_owned()
    }
}

/// Answers a recorded fatal error at the end of a cycle.
pub struct ShutdownHandler {
    sender: Arc<dyn ResponseSender>,
    error_handler: Arc<dyn ErrorHandler>,
    recorder: FatalRecorder,
}

impl ShutdownHandler {
    pub fn new(
        sender: Arc<dyn ResponseSender>,
        error_handler: Arc<dyn ErrorHandler>,
        recorder: FatalRecorder,
    ) -> Self {
        Self { sender, error_handler, recorder }
    }

    pub fn recorder(&self) -> &FatalRecorder {
        &self.recorder
    }

    /// Send the recorded fatal error, if there is one.
    ///
    /// Headers go out only when the sender has not sent any yet; the body
    /// always does. Returns whether anything was sent.
    pub fn finish(&self) -> Result<bool> {
        let Some(fatal) = self.recorder.take() else {
            return Ok(false);
        };

        error!(file = fatal.file.as_deref(), line = fatal.line, "[Core] [500] Error: {fatal}");
        let res = self.error_handler.handle(&Error::Fatal(fatal));

        if !self.sender.headers_sent() {
            self.sender.send_headers(&res)?;
        }
        self.sender.send_body(&res)?;
        Ok(true)
    }

    /// Run `f`, then [`finish`](ShutdownHandler::finish) if it panicked.
    ///
    /// Returns `f`'s value, or `None` after a panic. A panic the hook did not
    /// see is recorded from its payload, without a location.
    pub fn guard<T>(&self, f: impl FnOnce() -> T) -> Result<Option<T>> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Ok(Some(value)),
            Err(payload) => {
                if self.recorder.last().is_none() {
                    self.recorder.record(FatalError {
                        message: payload_message(&*payload),
                        file: None,
                        line: 0,
                    });
                }
                self.finish()?;
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for ShutdownHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHandler")
            .field("headers_sent", &self.sender.headers_sent())
            .field("recorder", &self.recorder)
            .finish()
    }
}
