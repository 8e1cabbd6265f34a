//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 7150                 # HTTP port number
//! ws_port = 7151              # Push channel (WebSocket) port
//! workers = 4                 # HTTP request workers
//! runtime_workers = 2         # Background producer workers
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.
//! Both ports move up to the next free port if taken.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for push transports.
    pub ws_port: u16,

    /// Thread pool size for HTTP requests.
    pub workers: usize,

    /// Worker threads of the background producer runtime.
    pub runtime_workers: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 7150,
            ws_port: 7151,
            workers: 4,
            runtime_workers: 2,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.workers == 0 {
            diag.error("serve.workers", "must be at least 1");
        }
        if self.runtime_workers == 0 {
            diag.error("serve.runtime_workers", "must be at least 1");
        }
        if self.port != 0 && self.port == self.ws_port {
            diag.error_with_hint(
                "serve.ws_port",
                format!("conflicts with serve.port ({})", self.port),
                "use a different port for the push channel",
            );
        }
    }
}
