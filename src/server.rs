//! HTTP server adapter and graceful shutdown.
//!
//! The dispatch core is synchronous and transport-free. This adapter puts it
//! behind hyper: each HTTP request becomes one front-controller cycle, run on
//! tokio's blocking pool so a slow handler never stalls the accept loop.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! There are no request timeouts: a handler that never returns keeps its
//! connection, and the drain, waiting.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Error;
use crate::front_controller::{FrontController, HandlerSource};
use crate::method::Verb;
use crate::request::Request;
use crate::response::Response;
use crate::sender::{CaptureSender, Delivery, ResponseSender};
use crate::shutdown::{FatalRecorder, ShutdownHandler};

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

/// Everything a connection task needs, shared across all of them.
struct App {
    front: FrontController,
    source: HandlerSource,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use warpcore::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    pub fn from_config(config: &Config) -> Self {
        Self { addr: config.addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Starts accepting connections and running each request through
    /// `front` with handlers from `source`.
    ///
    /// Each response goes back over the connection it came from, so the
    /// sender `front` was built with is never called here. Build it with
    /// [`FrontController::with_error_handler`] when it only serves HTTP.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, front: FrontController, source: HandlerSource) -> Result<(), Error> {
        self.serve_with_shutdown(front, source, shutdown_signal()).await
    }

    /// [`serve`](Server::serve), stopping when `signal` resolves instead of
    /// on a process signal.
    pub async fn serve_with_shutdown(
        self,
        front: FrontController,
        source: HandlerSource,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let app = Arc::new(App { front, source });

        info!(addr = %self.addr, "warpcore listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown first: a signal stops accepting even with
                // connections still queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("warpcore stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Converts one hyper request, runs one cycle, converts the response back.
///
/// Every failure is answered with a status, so hyper never sees an error.
async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let Ok(verb) = Verb::try_from(req.method()) else {
        return Ok(Response::status(StatusCode::METHOD_NOT_ALLOWED).into_inner());
    };

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(peer = %remote_addr, "body read error: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let mut request = Request::new(verb, parts.uri.to_string()).with_body(body);
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request.append_header(name.as_str(), value);
        }
    }

    let cycle = tokio::task::spawn_blocking(move || run_cycle(&app, request)).await;
    let response = match cycle {
        Ok(Some(res)) => res,
        Ok(None) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
        Err(e) => {
            error!(peer = %remote_addr, "dispatch task failed: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response.into_inner())
}

/// One synchronous cycle into a fresh capturing sender. A panic anywhere in
/// the cycle is answered through the shutdown handler.
fn run_cycle(app: &App, request: Request) -> Option<Response> {
    let sender = Arc::new(CaptureSender::new());
    let shutdown = ShutdownHandler::new(
        Arc::clone(&sender) as Arc<dyn ResponseSender>,
        Arc::clone(app.front.error_handler()),
        FatalRecorder::new(),
    );

    match shutdown.guard(|| app.front.bootstrap_with(&app.source, request, &*sender)) {
        Ok(Some(Err(e))) | Err(e) => error!("response send failed: {e}"),
        Ok(_) => {}
    }

    sender.take().map(Delivery::into_response)
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use super::*;
    use crate::error_handler::JsonErrorHandler;

    fn free_addr() -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
        let mut stream = loop {
            match TcpStream::connect(addr).await {
                Ok(s) => break s,
                Err(_) => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
            }
        };
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    async fn with_server<F, Fut>(source: HandlerSource, f: F)
    where
        F: FnOnce(SocketAddr) -> Fut,
        Fut: Future<Output = ()>,
    {
        with_front(FrontController::with_error_handler(JsonErrorHandler::new()), source, f).await;
    }

    async fn with_front<F, Fut>(front: FrontController, source: HandlerSource, f: F)
    where
        F: FnOnce(SocketAddr) -> Fut,
        Fut: Future<Output = ()>,
    {
        let addr = free_addr();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(Server::bind(&addr.to_string()).serve_with_shutdown(
            front,
            source,
            async move {
                let _ = stopped.await;
            },
        ));

        f(addr).await;

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn serves_a_cycle_over_http() {
        let source = HandlerSource::handler(|req: &mut Request| {
            Response::text(format!("{} {}", req.verb(), req.header("x-name").unwrap_or("?")))
        });

        with_server(source, |addr| async move {
            let wire = roundtrip(addr, "POST /hello HTTP/1.1\r\nhost: x\r\nx-name: ada\r\nconnection: close\r\n\r\n").await;
            assert!(wire.starts_with("HTTP/1.1 200 OK"), "{wire}");
            assert!(wire.ends_with("POST ada"), "{wire}");
        })
        .await;
    }

    #[tokio::test]
    async fn responses_bypass_the_front_controller_sender() {
        let unused = Arc::new(CaptureSender::new());
        let front = FrontController::new(JsonErrorHandler::new(), Arc::clone(&unused));
        let source = HandlerSource::handler(|_req: &mut Request| "over the wire");

        with_front(front, source, |addr| async move {
            let wire = roundtrip(addr, "GET / HTTP/1.1\r\nhost: x\r\nconnection: close\r\n\r\n").await;
            assert!(wire.ends_with("over the wire"), "{wire}");
        })
        .await;

        assert!(unused.take().is_none());
    }

    #[tokio::test]
    async fn unknown_methods_are_not_allowed() {
        let source = HandlerSource::handler(|_req: &mut Request| "unreachable");

        with_server(source, |addr| async move {
            let wire = roundtrip(addr, "BREW /pot HTTP/1.1\r\nhost: x\r\nconnection: close\r\n\r\n").await;
            assert!(wire.starts_with("HTTP/1.1 405"), "{wire}");
        })
        .await;
    }

    #[tokio::test]
    async fn panicking_handlers_get_an_internal_error() {
        let source = HandlerSource::handler(|_req: &mut Request| -> Response { panic!("handler blew up") });

        with_server(source, |addr| async move {
            let wire = roundtrip(addr, "GET / HTTP/1.1\r\nhost: x\r\nconnection: close\r\n\r\n").await;
            assert!(wire.starts_with("HTTP/1.1 500"), "{wire}");
            assert!(wire.contains(r#""msg":"Internal Error""#), "{wire}");
        })
        .await;
    }
}
