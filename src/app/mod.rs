//! Apps: isolated instances sharing one listener.
//!
//! An [`App`] owns everything its pages touch: the action registry, the push
//! hub with its sessions, the content root id and the page routes. Two apps
//! mounted on the same [`Listener`](crate::serve::Listener) share nothing but
//! the background runtime.
//!
//! Each app answers, relative to its mount prefix:
//!
//! | Path               | Method    | Response                       |
//! |--------------------|-----------|--------------------------------|
//! | `/__live.js`       | GET, HEAD | client runtime                 |
//! | `/__action/{key}`  | POST      | action fragment                |
//! | page routes        | GET, HEAD | page wrapped in the HTML shell |
//!
//! The app's cookie names the browser; a request without it gets a fresh
//! browser id and a `Set-Cookie`. Every page render opens its own session
//! (one per tab), announced to the client runtime in the shell. Action posts
//! name their session in the `X-Pw-Session` header and are pushed to only if
//! the same browser rendered it.

mod context;
mod producers;

pub use context::Context;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use crate::action::{self, ActionRegistry};
use crate::bind::{BodyItem, ValueKind};
use crate::config::PatchwireConfig;
use crate::core::{Runtime, Shutdown};
use crate::embed::Template;
use crate::embed::client::{LIVE_JS, SHELL_HTML, ShellVars};
use crate::push::PushHub;
use crate::serve::{HttpRequest, HttpResponse};
use crate::session::{self, BrowserId, SESSION_HEADER, SessionId};
use crate::target::{Target, next_id};

/// Page render function.
pub type PageFn = Arc<dyn Fn(&Context<'_>) -> String + Send + Sync>;

/// Upper bound between idle-session sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// Builder
// =============================================================================

pub struct AppBuilder {
    name: String,
    title: Option<String>,
    routes: FxHashMap<String, PageFn>,
}

impl AppBuilder {
    /// Document title; defaults to the app name.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Serve `page` at `path`, relative to the mount prefix.
    pub fn page<F>(mut self, path: &str, page: F) -> Self
    where
        F: Fn(&Context<'_>) -> String + Send + Sync + 'static,
    {
        self.routes.insert(route_path(path), Arc::new(page));
        self
    }

    /// Create the app and start its idle-session sweeper on `runtime`.
    pub fn build(self, runtime: &Runtime, config: &PatchwireConfig) -> App {
        let hub = Arc::new(PushHub::new(config.push.backlog));
        let content_root = Target::with_id(next_id("r"));
        let toasts = Target::with_id(format!("{content_root}-toasts"));
        let idle_ttl = Duration::from_secs(config.session.idle_ttl_secs);

        spawn_sweeper(runtime, Arc::clone(&hub), idle_ttl);

        App {
            inner: Arc::new(AppInner {
                cookie: session::cookie_name(&config.session.cookie, &self.name),
                title: self.title.unwrap_or_else(|| self.name.clone()),
                name: self.name,
                content_root,
                toasts,
                registry: ActionRegistry::new(),
                hub,
                routes: self.routes,
                runtime: runtime.handle().clone(),
                shutdown: runtime.shutdown().clone(),
                body_limit: config.dispatch.max_body_bytes,
                mount: OnceLock::new(),
            }),
        }
    }
}

/// `/about/` and `about` both route as `/about`.
fn route_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

fn spawn_sweeper(runtime: &Runtime, hub: Arc<PushHub>, ttl: Duration) {
    let every = (ttl / 4).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
    let shutdown = runtime.shutdown().clone();

    runtime.handle().spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    hub.prune_idle(ttl);
                }
                _ = shutdown.wait() => break,
            }
        }
    });
}

// =============================================================================
// App
// =============================================================================

struct Mount {
    prefix: String,
    ws_port: u16,
}

struct AppInner {
    name: String,
    title: String,
    cookie: String,
    content_root: Target,
    toasts: Target,
    registry: ActionRegistry,
    hub: Arc<PushHub>,
    routes: FxHashMap<String, PageFn>,
    runtime: Handle,
    shutdown: Shutdown,
    body_limit: usize,
    mount: OnceLock<Mount>,
}

/// One app instance. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    pub fn builder(name: impl Into<String>) -> AppBuilder {
        AppBuilder {
            name: name.into(),
            title: None,
            routes: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    /// Element wrapping every rendered page of this app.
    pub fn content_root(&self) -> &Target {
        &self.inner.content_root
    }

    /// Container toasts are appended to.
    pub fn toasts(&self) -> &Target {
        &self.inner.toasts
    }

    pub fn hub(&self) -> Arc<PushHub> {
        Arc::clone(&self.inner.hub)
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.inner.shutdown
    }

    /// Browser cookie name, `{session.cookie}_{name}`.
    pub fn cookie_name(&self) -> &str {
        &self.inner.cookie
    }

    /// Mount prefix (`""` for the root, or before mounting).
    pub fn prefix(&self) -> &str {
        self.inner.mount.get().map_or("", |m| m.prefix.as_str())
    }

    /// Push socket port announced to clients (0 before mounting).
    pub fn ws_port(&self) -> u16 {
        self.inner.mount.get().map_or(0, |m| m.ws_port)
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mount.get().is_some()
    }

    pub(crate) fn registry(&self) -> &ActionRegistry {
        &self.inner.registry
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    pub(crate) fn body_limit(&self) -> usize {
        self.inner.body_limit
    }

    /// Record where the app is mounted. Returns false if it already was.
    pub(crate) fn attach(&self, prefix: &str, ws_port: u16) -> bool {
        self.inner
            .mount
            .set(Mount {
                prefix: prefix.to_string(),
                ws_port,
            })
            .is_ok()
    }

    /// Answer a request; `rest` is the path below the mount prefix.
    pub fn handle(&self, req: &HttpRequest, rest: &str) -> HttpResponse {
        if rest == "/__live.js" {
            return if req.is_read() {
                HttpResponse::javascript(LIVE_JS)
            } else {
                HttpResponse::method_not_allowed("GET, HEAD")
            };
        }

        if let Some(key) = rest.strip_prefix("/__action/") {
            let (browser, cookie) = self.browser_for(req);
            let session = self.action_session(req, &browser);
            let response = action::dispatch(self, req, key, session);
            return with_cookie(response, cookie);
        }

        let Some(page) = self.inner.routes.get(&route_path(rest)) else {
            return HttpResponse::not_found();
        };
        if !req.is_read() {
            return HttpResponse::method_not_allowed("GET, HEAD");
        }
        self.render_page(req, page)
    }

    fn render_page(&self, req: &HttpRequest, page: &PageFn) -> HttpResponse {
        let (browser, cookie) = self.browser_for(req);
        let session = self.inner.hub.open(&browser);
        let items = req
            .query_pairs()
            .map(|(name, value)| BodyItem::new(name, value, ValueKind::String))
            .collect();

        let body = {
            let ctx = Context::new(self, session.clone(), items, None);
            (**page)(&ctx)
        };

        let shell: Template<ShellVars<'_>> = SHELL_HTML;
        let html = shell.render(&ShellVars {
            title: self.title(),
            prefix: self.prefix(),
            session: session.as_str(),
            ws_port: self.ws_port(),
            root_id: self.content_root().id(),
            toasts_id: self.toasts().id(),
            body: &body,
        });
        with_cookie(HttpResponse::html(200, html), cookie)
    }

    /// Browser named by the request cookie, or a new one plus its cookie.
    fn browser_for(&self, req: &HttpRequest) -> (BrowserId, Option<String>) {
        if let Some(id) = req.cookie(self.cookie_name()).and_then(BrowserId::parse) {
            return (id, None);
        }
        let id = BrowserId::generate();
        let cookie = session::issue_cookie(self.cookie_name(), &id, self.prefix());
        (id, Some(cookie))
    }

    /// Session an action pushes to. Without a live session of this browser,
    /// a detached id: the response still renders, pushes are dropped.
    fn action_session(&self, req: &HttpRequest, browser: &BrowserId) -> SessionId {
        let claimed = req
            .header(SESSION_HEADER)
            .and_then(|raw| self.inner.hub.claim(raw, browser));
        claimed.unwrap_or_else(|| {
            crate::debug!("session"; "action without a live session, pushes dropped");
            SessionId::generate()
        })
    }
}

fn with_cookie(response: HttpResponse, cookie: Option<String>) -> HttpResponse {
    match cookie {
        Some(cookie) => response.with_header("Set-Cookie", cookie),
        None => response,
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Background runtime shared by tests that never trigger shutdown.
#[cfg(test)]
pub(crate) fn test_runtime() -> &'static Runtime {
    static RUNTIME: std::sync::LazyLock<Runtime> =
        std::sync::LazyLock::new(|| Runtime::new(2).unwrap());
    &RUNTIME
}

/// Unmounted app with default configuration on the shared test runtime.
#[cfg(test)]
pub(crate) fn test_app(name: &str) -> App {
    test_app_on(name, test_runtime())
}

#[cfg(test)]
pub(crate) fn test_app_on(name: &str, runtime: &Runtime) -> App {
    App::builder(name).build(runtime, &PatchwireConfig::default())
}

/// A browser with one rendered page: the browser and the page's session.
#[cfg(test)]
pub(crate) fn test_tab(app: &App) -> (BrowserId, SessionId) {
    let browser = BrowserId::generate();
    let session = app.hub().open(&browser);
    (browser, session)
}

/// Action post as the client runtime sends it from `session`'s page.
#[cfg(test)]
pub(crate) fn test_action_post(
    app: &App,
    browser: &BrowserId,
    session: &SessionId,
    url: &str,
    body: &str,
) -> HttpRequest {
    HttpRequest::new(tiny_http::Method::Post, url)
        .with_header("Cookie", format!("{}={}", app.cookie_name(), browser))
        .with_header(SESSION_HEADER, session.as_str())
        .with_body(body)
}
