//! Per-request context handed to pages and action handlers.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::App;
use crate::action::{Action, ActionKey, Entry, Trigger};
use crate::bind::{Bind, BindErrors, BodyItem, bind};
use crate::push::Pusher;
use crate::session::SessionId;
use crate::target::Target;
use crate::utils::html::escape;

/// What a page or handler can do while rendering.
///
/// Registering actions, pushing patches to its session and starting
/// background producers all go through here.
pub struct Context<'a> {
    app: &'a App,
    session: SessionId,
    items: Vec<BodyItem>,
    target: Option<Target>,
    bind_errors: BindErrors,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        app: &'a App,
        session: SessionId,
        items: Vec<BodyItem>,
        target: Option<Target>,
    ) -> Self {
        Self {
            app,
            session,
            items,
            target,
            bind_errors: BindErrors::default(),
        }
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Element wrapping the page body.
    pub fn content_root(&self) -> &Target {
        self.app.content_root()
    }

    /// Where the client will swap the current action's response, if anywhere.
    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Raw request items: the action body, or query parameters for pages.
    pub fn items(&self) -> &[BodyItem] {
        &self.items
    }

    /// Bind the request items onto `dest`.
    pub fn body<T: Bind>(&self, dest: &mut T) -> Result<(), BindErrors> {
        bind(&self.items, dest)
    }

    /// Failures from binding the action's own state.
    pub fn bind_errors(&self) -> &BindErrors {
        &self.bind_errors
    }

    pub(crate) fn record_bind_errors(&mut self, errors: BindErrors) {
        self.bind_errors.extend(errors);
    }

    // =========================================================================
    // actions
    // =========================================================================

    /// Register `handler` with a snapshot of `state` under a key derived
    /// from the handler's type. Renders as an `onclick` attribute.
    pub fn call<S, F>(&self, state: &S, handler: F) -> Action
    where
        S: Bind + Clone + Send + Sync + 'static,
        F: Fn(&mut S, &Context<'_>) -> String + Send + Sync + 'static,
    {
        self.register(ActionKey::of::<F>(), state, handler, Trigger::Click)
    }

    /// Like [`call`](Self::call), rendered as an `onsubmit` attribute that
    /// posts the form's fields merged over the snapshot.
    pub fn submit<S, F>(&self, state: &S, handler: F) -> Action
    where
        S: Bind + Clone + Send + Sync + 'static,
        F: Fn(&mut S, &Context<'_>) -> String + Send + Sync + 'static,
    {
        self.register(ActionKey::of::<F>(), state, handler, Trigger::Submit)
    }

    /// Register under an explicit, readable key.
    pub fn action<S, F>(&self, name: &str, state: &S, handler: F) -> Action
    where
        S: Bind + Clone + Send + Sync + 'static,
        F: Fn(&mut S, &Context<'_>) -> String + Send + Sync + 'static,
    {
        self.register(ActionKey::named(name), state, handler, Trigger::Click)
    }

    fn register<S, F>(&self, key: ActionKey, state: &S, handler: F, trigger: Trigger) -> Action
    where
        S: Bind + Clone + Send + Sync + 'static,
        F: Fn(&mut S, &Context<'_>) -> String + Send + Sync + 'static,
    {
        let action = Action::new(
            self.app.prefix(),
            &key,
            self.content_root().clone(),
            state.to_items(),
            trigger,
        );
        self.app
            .registry()
            .register(key, Arc::new(Entry::new(state.clone(), handler)));
        action
    }

    // =========================================================================
    // push
    // =========================================================================

    /// Handle for patching this session from background work.
    pub fn pusher(&self) -> Pusher {
        Pusher::new(self.app.hub(), self.session.clone())
    }

    pub fn patch(&self, target: &Target, html: impl Into<String>) -> bool {
        self.app.hub().patch(&self.session, target, html)
    }

    /// Patch, and run `on_invalid` once if the client reports the target gone.
    pub fn patch_with<F>(&self, target: &Target, html: impl Into<String>, on_invalid: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.app.hub().patch_with(&self.session, target, html, on_invalid)
    }

    pub fn success(&self, message: &str) -> bool {
        self.toast("success", message)
    }

    pub fn error(&self, message: &str) -> bool {
        self.toast("error", message)
    }

    pub fn info(&self, message: &str) -> bool {
        self.toast("info", message)
    }

    fn toast(&self, kind: &str, message: &str) -> bool {
        let html = format!(
            r#"<div class="pw-toast pw-toast-{kind}" role="status">{}</div>"#,
            escape(message)
        );
        self.patch(&self.app.toasts().append(), html)
    }

    pub fn reload(&self) -> bool {
        self.app.hub().reload(&self.session)
    }

    pub fn redirect(&self, url: impl Into<String>) -> bool {
        self.app.hub().redirect(&self.session, url)
    }

    /// Run `future` on the app's background runtime.
    pub fn spawn<Fut>(&self, future: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.app.runtime().spawn(future)
    }
}
