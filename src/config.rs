//! Environment-based configuration.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `WARPCORE_ADDR` | `0.0.0.0:3000` | Address the server adapter binds to. |
//! | `WARPCORE_EXPOSE_DETAILS` | off | Include error detail, file and line in error bodies. Accepts `1`, `true`, `yes`. |
//!
//! Never switch details on for a production-facing deployment: they leak
//! source locations and internal messages to clients.
//!
//! Log filtering is left to the subscriber (`RUST_LOG` with
//! `tracing_subscriber::EnvFilter`).

use std::env;
use std::net::SocketAddr;

use tracing::warn;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Runtime configuration, loaded once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub expose_details: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            expose_details: false,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let addr = match lookup("WARPCORE_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "WARPCORE_ADDR is not a socket address, using {DEFAULT_ADDR}");
                default_addr()
            }),
            None => default_addr(),
        };

        let expose_details = lookup("WARPCORE_EXPOSE_DETAILS")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self { addr, expose_details }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}
