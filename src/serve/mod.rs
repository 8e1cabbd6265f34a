//! Shared HTTP listener for mounted apps.
//!
//! One [`Listener`] owns the HTTP socket and the push (WebSocket) socket.
//! Apps are mounted under path prefixes; every request goes to the app with
//! the longest matching prefix, and the push acceptor picks the app's hub
//! from the handshake path the same way.
//!
//! ```text
//! browser ──HTTP──► tiny_http ──► rayon pool ──► MountTable ──► App::handle
//!    ▲                                                           │
//!    └──────WS────── LiveServer ◄── HubRouter ◄── MountTable ◄───┘ (PushHub)
//! ```

mod http;
mod lifecycle;
mod mount;
mod response;

pub use http::{HttpRequest, HttpResponse};
pub use mount::{MountError, MountTable, normalize_prefix};

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use tiny_http::{Method, Request, Server};

use crate::{
    app::App,
    config::PatchwireConfig,
    core::{Runtime, Shutdown},
    log,
    push::{self, HubRouter, PushSettings},
};

/// Time allowed for push delivery threads to close after shutdown.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(2);

/// State shared by request workers.
struct Routes {
    mounts: Arc<RwLock<MountTable>>,
    shutdown: Shutdown,
    body_limit: usize,
}

impl Routes {
    fn handle(&self, req: &HttpRequest) -> HttpResponse {
        if self.shutdown.is_triggered() {
            return HttpResponse::unavailable();
        }
        // Lock released before the app runs page or action code.
        let routed = self.mounts.read().route(&req.path);
        match routed {
            Some((app, rest)) => app.handle(req, &rest),
            None => HttpResponse::not_found(),
        }
    }
}

/// Bound HTTP and push sockets, ready to mount apps and run.
pub struct Listener {
    server: Arc<Server>,
    addr: SocketAddr,
    live: Mutex<Option<TcpListener>>,
    ws_port: u16,
    routes: Arc<Routes>,
    settings: PushSettings,
    workers: usize,
}

/// Stops a running [`Listener`] from another thread.
#[derive(Clone)]
pub struct StopHandle {
    server: Arc<Server>,
    shutdown: Shutdown,
}

impl StopHandle {
    pub fn stop(&self) {
        self.shutdown.trigger();
        self.server.unblock();
    }
}

impl Listener {
    /// Bind both sockets from `[serve]`, with port retry.
    pub fn bind(config: &PatchwireConfig, runtime: &Runtime) -> Result<Self> {
        let serve = &config.serve;
        let (server, addr) = lifecycle::bind_with_retry(serve.interface, serve.port)?;
        let live = push::bind_live(serve.interface, serve.ws_port)?;
        let ws_port = live
            .local_addr()
            .context("failed to read push socket address")?
            .port();

        Ok(Self {
            server: Arc::new(server),
            addr,
            live: Mutex::new(Some(live)),
            ws_port,
            routes: Arc::new(Routes {
                mounts: Arc::new(RwLock::new(MountTable::new())),
                shutdown: runtime.shutdown().clone(),
                body_limit: config.dispatch.max_body_bytes,
            }),
            settings: PushSettings::from(&config.push),
            workers: serve.workers.max(1),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ws_port(&self) -> u16 {
        self.ws_port
    }

    /// Attach `app` under `prefix`.
    pub fn mount(&self, prefix: &str, app: App) -> Result<(), MountError> {
        if app.is_mounted() {
            return Err(MountError::AlreadyMounted(app.name().to_string()));
        }

        let prefix = self.routes.mounts.write().insert(prefix, app.clone())?;
        app.attach(&prefix, self.ws_port);
        crate::debug!("serve"; "mounted `{}` at {}", app.name(), mount::display_prefix(&prefix));
        Ok(())
    }

    pub fn stopper(&self) -> StopHandle {
        StopHandle {
            server: Arc::clone(&self.server),
            shutdown: self.routes.shutdown.clone(),
        }
    }

    /// Signal shutdown: unblocks [`run`](Self::run) and closes transports.
    pub fn shutdown(&self) {
        self.stopper().stop();
    }

    /// Route a request without going through the socket.
    pub(crate) fn handle(&self, req: &HttpRequest) -> HttpResponse {
        self.routes.handle(req)
    }

    /// Serve until shutdown (blocking).
    pub fn run(self) -> Result<()> {
        let live = self
            .live
            .lock()
            .take()
            .context("listener is already running")?;
        let router: Arc<dyn HubRouter> = Arc::clone(&self.routes.mounts) as Arc<dyn HubRouter>;
        let live = push::start_live(live, router, self.settings, self.routes.shutdown.clone())?;

        crate::core::register_server(Arc::clone(&self.server), self.routes.shutdown.clone());

        for (prefix, app) in self.routes.mounts.read().iter() {
            log!("serve"; "{} at http://{}{}/", app.name(), self.addr, prefix);
        }
        crate::debug!("ws"; "push transports on port {}", live.port());

        run_request_loop(&self.server, &self.routes, self.workers)?;

        self.routes.shutdown.trigger();
        live.wait(SHUTDOWN_WAIT);
        Ok(())
    }
}

fn run_request_loop(server: &Server, routes: &Arc<Routes>, workers: usize) -> Result<()> {
    // Use thread pool to handle requests concurrently
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("patchwire-http-{i}"))
        .build()
        .context("failed to create request pool")?;

    for request in server.incoming_requests() {
        let routes = Arc::clone(routes);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &routes) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, routes: &Routes) -> Result<()> {
    let head = request.method() == &Method::Head;
    let req = response::read_request(&mut request, routes.body_limit)?;
    let reply = routes.handle(&req);
    crate::debug!("serve"; "{} {} -> {}", req.method, req.path, reply.status);
    response::respond(request, reply, head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Context;
    use crate::config::test_parse_config;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    const LOCAL: &str = "[serve]\nport = 0\nws_port = 0";

    fn bump_page(label: &'static str) -> impl Fn(&Context<'_>) -> String + Send + Sync + 'static {
        move |ctx| {
            let action = ctx.action("bump", &(), move |_: &mut (), _: &Context<'_>| {
                format!("<p>{label}</p>")
            });
            format!("<button {}>bump</button>", action.on_click())
        }
    }

    fn session_cookie(resp: &HttpResponse) -> String {
        let set = resp.header("Set-Cookie").unwrap();
        set.split(';').next().unwrap().to_string()
    }

    #[test]
    fn test_apps_sharing_a_listener_are_isolated() {
        let runtime = Runtime::new(1).unwrap();
        let config = test_parse_config(LOCAL);
        let listener = Listener::bind(&config, &runtime).unwrap();

        let first = App::builder("first").page("/", bump_page("first")).build(&runtime, &config);
        let second = App::builder("second").page("/", bump_page("second")).build(&runtime, &config);
        listener.mount("/", first.clone()).unwrap();
        listener.mount("/second", second.clone()).unwrap();

        // Render both pages: each registers its own `bump`.
        let page = listener.handle(&HttpRequest::new(Method::Get, "/"));
        let first_cookie = session_cookie(&page);
        assert!(page.text().contains("/__action/bump"));
        let page = listener.handle(&HttpRequest::new(Method::Get, "/second/"));
        let second_cookie = session_cookie(&page);
        assert!(page.text().contains("/second/__action/bump"));

        let post = |url: &str, cookie: &str| {
            listener.handle(
                &HttpRequest::new(Method::Post, url)
                    .with_header("Cookie", cookie)
                    .with_body("[]"),
            )
        };
        assert_eq!(post("/__action/bump", &first_cookie).text(), "<p>first</p>");
        assert_eq!(post("/second/__action/bump", &second_cookie).text(), "<p>second</p>");

        // Distinct content roots, hubs and cookie names.
        assert_ne!(first.content_root().id(), second.content_root().id());
        assert!(!Arc::ptr_eq(&first.hub(), &second.hub()));
        assert!(first_cookie.starts_with("pw_sid_first="));
        assert!(second_cookie.starts_with("pw_sid_second="));
        assert_eq!(first.hub().len(), 1);
        assert_eq!(second.hub().len(), 1);

        // Mounting twice is rejected.
        assert_eq!(
            listener.mount("/third", first),
            Err(MountError::AlreadyMounted("first".into()))
        );
        drop(listener);
        runtime.close();
    }

    #[test]
    fn test_unmounted_path_and_shutdown() {
        let runtime = Runtime::new(1).unwrap();
        let config = test_parse_config(LOCAL);
        let listener = Listener::bind(&config, &runtime).unwrap();
        let app = App::builder("only").page("/", |_| "<p>hi</p>".to_string()).build(&runtime, &config);
        listener.mount("/only", app).unwrap();

        assert_eq!(listener.handle(&HttpRequest::new(Method::Get, "/elsewhere")).status, 404);
        assert_eq!(listener.handle(&HttpRequest::new(Method::Get, "/only")).status, 200);

        listener.shutdown();
        assert_eq!(listener.handle(&HttpRequest::new(Method::Get, "/only")).status, 503);
        drop(listener);
        runtime.close();
    }

    #[test]
    fn test_run_serves_over_tcp_until_stopped() {
        let runtime = Runtime::new(1).unwrap();
        let config = test_parse_config(LOCAL);
        let listener = Listener::bind(&config, &runtime).unwrap();
        let app = App::builder("tcp").page("/", |_| "<p>over tcp</p>".to_string()).build(&runtime, &config);
        listener.mount("/", app).unwrap();

        let addr = listener.addr();
        let stopper = listener.stopper();
        let server = std::thread::spawn(move || listener.run());

        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).unwrap();
        assert!(reply.starts_with("HTTP/1.1 200"));
        assert!(reply.contains("<p>over tcp</p>"));
        assert!(reply.contains("Set-Cookie: pw_sid_tcp="));

        stopper.stop();
        server.join().unwrap().unwrap();
        runtime.close();
    }
}
