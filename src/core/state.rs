//! Ctrl+C handling for serve mode.
//!
//! Before a server is registered, Ctrl+C exits the process at once. After
//! [`register_server`], it triggers the shared [`Shutdown`] and unblocks the
//! HTTP server so `Listener::run` can wind down transports and producers.

use std::sync::{Arc, OnceLock};

use tiny_http::Server;

use super::Shutdown;

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Signal shared with push transports and producers
static SHUTDOWN: OnceLock<Shutdown> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if let Some(shutdown) = SHUTDOWN.get() {
            shutdown.trigger();
        }

        // Unblock HTTP server, or exit immediately if not yet serving
        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop.
/// Only the first registration takes effect.
pub fn register_server(server: Arc<Server>, shutdown: Shutdown) {
    let _ = SHUTDOWN.set(shutdown);
    let _ = SERVER.set(server);
}
