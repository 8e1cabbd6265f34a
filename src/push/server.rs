//! WebSocket acceptor for push transports.
//!
//! One listening socket serves every mounted app. The handshake URI
//! `{prefix}/__live?session={id}` picks the app's hub (through a
//! [`HubRouter`]) and the session inside it. Each accepted connection gets
//! its own delivery thread.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::{StatusCode, Uri};

use super::PushSettings;
use super::hub::PushHub;
use super::transport;
use crate::core::Shutdown;
use crate::session::SessionId;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Time allowed for a client to complete the WebSocket handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle sleep between non-blocking accept polls.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Resolves a live endpoint path to the hub that owns it.
pub trait HubRouter: Send + Sync + 'static {
    fn route(&self, path: &str) -> Option<Arc<PushHub>>;
}

/// Running acceptor.
pub struct LiveServer {
    port: u16,
    acceptor: JoinHandle<Vec<JoinHandle<()>>>,
}

impl LiveServer {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the acceptor and all delivery threads, up to `timeout`.
    ///
    /// Call after shutdown has been triggered.
    pub fn wait(self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let Some(handles) = join_until(self.acceptor, deadline) else {
            return;
        };
        for handle in handles {
            if join_until(handle, deadline).is_none() {
                crate::debug!("ws"; "delivery thread still running at shutdown");
            }
        }
    }
}

fn join_until<T>(handle: JoinHandle<T>, deadline: Instant) -> Option<T> {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(20));
    }
    handle.join().ok()
}

/// Bind the push socket, trying the next ports if `base_port` is taken.
pub fn bind(interface: IpAddr, base_port: u16) -> Result<TcpListener> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                if offset > 0 {
                    crate::log!("ws"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok(listener);
            }
            Err(e) => last_error = Some(e),
        }
        // Port 0 asks the OS; retrying it is pointless.
        if base_port == 0 {
            break;
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Start accepting push connections on `listener`.
pub fn start(
    listener: TcpListener,
    router: Arc<dyn HubRouter>,
    settings: PushSettings,
    shutdown: Shutdown,
) -> Result<LiveServer> {
    let port = listener.local_addr()?.port();
    listener
        .set_nonblocking(true)
        .context("failed to make push listener non-blocking")?;

    let acceptor = thread::Builder::new()
        .name("patchwire-ws-accept".into())
        .spawn(move || accept_loop(&listener, &router, settings, &shutdown))
        .context("failed to spawn push acceptor")?;

    Ok(LiveServer { port, acceptor })
}

fn accept_loop(
    listener: &TcpListener,
    router: &Arc<dyn HubRouter>,
    settings: PushSettings,
    shutdown: &Shutdown,
) -> Vec<JoinHandle<()>> {
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    while !shutdown.is_triggered() {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("ws"; "client connected: {}", addr);
                handles.retain(|h| !h.is_finished());

                let router = Arc::clone(router);
                let shutdown = shutdown.clone();
                let spawned = thread::Builder::new()
                    .name("patchwire-ws".into())
                    .spawn(move || serve_connection(stream, router.as_ref(), settings, &shutdown));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => crate::log!("ws"; "failed to spawn delivery thread: {}", e),
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                crate::log!("ws"; "accept error: {}", e);
                thread::sleep(ACCEPT_POLL);
            }
        }
    }

    handles
}

fn serve_connection(
    stream: TcpStream,
    router: &dyn HubRouter,
    settings: PushSettings,
    shutdown: &Shutdown,
) {
    // Blocking for the handshake, bounded by a timeout.
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));

    let mut routed = None;
    let callback = |request: &Request, response: Response| match route_handshake(router, request.uri()) {
        Some(found) => {
            routed = Some(found);
            Ok(response)
        }
        None => Err(reject(StatusCode::NOT_FOUND, "unknown live endpoint")),
    };

    let ws = match tungstenite::accept_hdr(stream, callback) {
        Ok(ws) => ws,
        Err(e) => {
            crate::debug!("ws"; "handshake failed: {}", e);
            return;
        }
    };

    if let Some((hub, session)) = routed {
        transport::run(ws, &hub, &session, settings, shutdown);
    }
}

/// Map `{prefix}/__live?session={id}` to a hub and session id.
fn route_handshake(router: &dyn HubRouter, uri: &Uri) -> Option<(Arc<PushHub>, SessionId)> {
    let hub = router.route(uri.path())?;
    let query = uri.query().unwrap_or_default();
    let session = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "session")
        .and_then(|(_, value)| SessionId::parse(&value))?;
    Some((hub, session))
}

fn reject(status: StatusCode, reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_owned()));
    *response.status_mut() = status;
    response
}
