use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use super::channel::{InvalidCallback, SessionChannel};
use super::message::PushMessage;
use crate::session::{BrowserId, SessionId};
use crate::target::Target;

/// All push channels of one app, keyed by session.
pub struct PushHub {
    sessions: DashMap<SessionId, Arc<SessionChannel>>,
    backlog: usize,
}

impl PushHub {
    pub fn new(backlog: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            backlog,
        }
    }

    /// Create a session with a fresh id for a page rendered by `owner`.
    pub fn open(&self, owner: &BrowserId) -> SessionId {
        let id = SessionId::generate();
        let channel = SessionChannel::new(id.clone(), owner.clone(), self.backlog);
        self.sessions.insert(id.clone(), Arc::new(channel));
        crate::debug!("session"; "opened {} ({} live)", id, self.sessions.len());
        id
    }

    /// The live session named by `raw`, if `owner` rendered it.
    pub fn claim(&self, raw: &str, owner: &BrowserId) -> Option<SessionId> {
        let id = SessionId::parse(raw)?;
        let channel = self.channel(&id)?;
        (channel.owner() == owner).then_some(id)
    }

    pub fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn channel(&self, session: &SessionId) -> Option<Arc<SessionChannel>> {
        self.sessions.get(session).map(|entry| Arc::clone(entry.value()))
    }

    /// Queue a patch for `session`. Returns whether it was queued.
    pub fn patch(&self, session: &SessionId, target: &Target, html: impl Into<String>) -> bool {
        self.send(session, PushMessage::patch(target, html))
    }

    /// Queue a patch and register `on_invalid` against the target id.
    pub fn patch_with<F>(
        &self,
        session: &SessionId,
        target: &Target,
        html: impl Into<String>,
        on_invalid: F,
    ) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(channel) = self.channel(session) else {
            crate::debug!("push"; "no session {}, patch for {} dropped", session, target);
            return false;
        };
        channel.on_invalid(target.id(), Box::new(on_invalid) as InvalidCallback);
        channel.push(PushMessage::patch(target, html))
    }

    /// Client reported `target_id` missing from its DOM.
    pub fn report_invalid(&self, session: &SessionId, target_id: &str) {
        if let Some(channel) = self.channel(session) {
            let fired = channel.report_invalid(target_id);
            crate::debug!("push"; "{} invalid in {} ({} callbacks)", target_id, session, fired);
        }
    }

    pub fn reload(&self, session: &SessionId) -> bool {
        self.send(session, PushMessage::Reload)
    }

    pub fn redirect(&self, session: &SessionId, url: impl Into<String>) -> bool {
        self.send(session, PushMessage::redirect(url))
    }

    fn send(&self, session: &SessionId, message: PushMessage) -> bool {
        match self.channel(session) {
            Some(channel) => channel.push(message),
            None => {
                crate::debug!("push"; "no session {}, message dropped", session);
                false
            }
        }
    }

    /// Drop sessions detached for longer than `ttl`, with their callbacks.
    pub fn prune_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, channel| channel.idle_for().is_none_or(|idle| idle <= ttl));
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            crate::debug!("session"; "pruned {} idle session(s)", pruned);
        }
        pruned
    }
}

/// Send-able handle for pushing to one session from background work.
#[derive(Clone)]
pub struct Pusher {
    hub: Arc<PushHub>,
    session: SessionId,
}

impl Pusher {
    pub fn new(hub: Arc<PushHub>, session: SessionId) -> Self {
        Self { hub, session }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn patch(&self, target: &Target, html: impl Into<String>) -> bool {
        self.hub.patch(&self.session, target, html)
    }

    pub fn patch_with<F>(&self, target: &Target, html: impl Into<String>, on_invalid: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.hub.patch_with(&self.session, target, html, on_invalid)
    }

    pub fn reload(&self) -> bool {
        self.hub.reload(&self.session)
    }

    pub fn redirect(&self, url: impl Into<String>) -> bool {
        self.hub.redirect(&self.session, url)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn open(hub: &PushHub) -> SessionId {
        hub.open(&BrowserId::generate())
    }

    #[test]
    fn test_patches_stay_in_their_session() {
        let hub = PushHub::new(8);
        let a = open(&hub);
        let b = open(&hub);
        let target = Target::new();

        assert!(hub.patch(&a, &target, "for a"));
        assert_eq!(hub.channel(&a).unwrap().pending(), 1);
        assert_eq!(hub.channel(&b).unwrap().pending(), 0);
    }

    #[test]
    fn test_tabs_of_one_browser_are_separate() {
        let hub = PushHub::new(8);
        let browser = BrowserId::generate();
        let tab_a = hub.open(&browser);
        let tab_b = hub.open(&browser);
        assert_ne!(tab_a, tab_b);

        hub.channel(&tab_a).unwrap().attach();
        assert!(hub.patch(&tab_b, &Target::new(), "for b"));
        assert_eq!(hub.channel(&tab_a).unwrap().pending(), 0);
        assert_eq!(hub.channel(&tab_b).unwrap().pending(), 1);
    }

    #[test]
    fn test_claim_checks_owner() {
        let hub = PushHub::new(8);
        let browser = BrowserId::generate();
        let session = hub.open(&browser);

        assert_eq!(hub.claim(session.as_str(), &browser), Some(session.clone()));
        assert_eq!(hub.claim(session.as_str(), &BrowserId::generate()), None);
        assert_eq!(hub.claim("s-gone", &browser), None);
        assert_eq!(hub.claim("<bad>", &browser), None);
    }

    #[test]
    fn test_unknown_session_drops() {
        let hub = PushHub::new(8);
        let stranger = SessionId::generate();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        assert!(!hub.patch(&stranger, &Target::new(), "x"));
        assert!(!hub.patch_with(&stranger, &Target::new(), "x", move || {
            flag.store(true, Ordering::SeqCst);
        }));
        hub.report_invalid(&stranger, "t");
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_report_invalid_runs_callback() {
        let hub = PushHub::new(8);
        let session = open(&hub);
        let target = Target::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        hub.patch_with(&session, &target, "tick", move || {
            flag.store(true, Ordering::SeqCst);
        });
        hub.report_invalid(&session, "unrelated");
        assert!(!fired.load(Ordering::SeqCst));
        hub.report_invalid(&session, target.id());
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_prune_idle_keeps_attached() {
        let hub = PushHub::new(8);
        let idle = open(&hub);
        let live = open(&hub);
        hub.channel(&live).unwrap().attach();

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(hub.prune_idle(Duration::from_millis(5)), 1);
        assert!(!hub.contains(&idle));
        assert!(hub.contains(&live));
    }

    #[test]
    fn test_pusher_commands() {
        let hub = Arc::new(PushHub::new(8));
        let session = open(&hub);
        let pusher = Pusher::new(Arc::clone(&hub), session.clone());
        pusher.reload();
        pusher.redirect("/next");

        let messages = hub.channel(&session).unwrap().drain();
        assert_eq!(messages, [PushMessage::Reload, PushMessage::redirect("/next")]);
    }
}
