//! Per-session outbound queue and invalid-target bookkeeping.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::message::PushMessage;
use crate::session::{BrowserId, SessionId};

/// Callback fired once when the client reports its target missing.
pub type InvalidCallback = Box<dyn FnOnce() + Send + 'static>;

/// One session's push state: one rendered page, one tab.
///
/// The queue is FIFO and bounded. While no transport is attached, messages
/// wait in the queue; when a transport is lost, the queue is discarded but
/// callbacks and invalid ids survive so the reconnecting tab, with the same
/// DOM, keeps its liveness state.
pub struct SessionChannel {
    id: SessionId,
    owner: BrowserId,
    backlog: usize,
    state: Mutex<ChannelState>,
}

struct ChannelState {
    queue: VecDeque<PushMessage>,
    callbacks: FxHashMap<String, Vec<InvalidCallback>>,
    invalidated: FxHashSet<String>,
    /// Generation of the attached transport.
    transport: Option<u64>,
    next_transport: u64,
    last_seen: Instant,
    dropped: u64,
}

impl ChannelState {
    /// Make room for `incoming`: drop the oldest message for the same target,
    /// or the oldest message overall.
    fn evict_for(&mut self, incoming: &PushMessage) {
        let same_target = incoming
            .target_id()
            .and_then(|id| self.queue.iter().position(|m| m.target_id() == Some(id)));
        match same_target {
            Some(index) => {
                self.queue.remove(index);
            }
            None => {
                self.queue.pop_front();
            }
        }
        self.dropped += 1;
    }
}

impl SessionChannel {
    pub(crate) fn new(id: SessionId, owner: BrowserId, backlog: usize) -> Self {
        Self {
            id,
            owner,
            backlog: backlog.max(1),
            state: Mutex::new(ChannelState {
                queue: VecDeque::new(),
                callbacks: FxHashMap::default(),
                invalidated: FxHashSet::default(),
                transport: None,
                next_transport: 1,
                last_seen: Instant::now(),
                dropped: 0,
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Browser that rendered the page.
    pub fn owner(&self) -> &BrowserId {
        &self.owner
    }

    /// Enqueue a message. Returns `false` if it targets an invalidated id.
    pub(crate) fn push(&self, message: PushMessage) -> bool {
        let mut state = self.state.lock();
        if let Some(id) = message.target_id()
            && state.invalidated.contains(id)
        {
            return false;
        }
        if state.queue.len() >= self.backlog {
            state.evict_for(&message);
        }
        state.queue.push_back(message);
        true
    }

    /// Register a callback for `target_id`.
    ///
    /// If the id was already reported invalid, the callback fires right away.
    pub(crate) fn on_invalid(&self, target_id: &str, callback: InvalidCallback) {
        let mut state = self.state.lock();
        if state.invalidated.contains(target_id) {
            drop(state);
            callback();
            return;
        }
        state
            .callbacks
            .entry(target_id.to_owned())
            .or_default()
            .push(callback);
    }

    /// Mark `target_id` dead: fire and forget its callbacks, discard its
    /// pending patches. Returns the number of callbacks fired.
    pub(crate) fn report_invalid(&self, target_id: &str) -> usize {
        let callbacks = {
            let mut state = self.state.lock();
            state.invalidated.insert(target_id.to_owned());
            state
                .queue
                .retain(|m| m.target_id() != Some(target_id));
            state.callbacks.remove(target_id).unwrap_or_default()
        };
        let fired = callbacks.len();
        for callback in callbacks {
            callback();
        }
        fired
    }

    /// Attach a new transport, superseding any previous one.
    pub(crate) fn attach(&self) -> u64 {
        let mut state = self.state.lock();
        let generation = state.next_transport;
        state.next_transport += 1;
        state.transport = Some(generation);
        state.last_seen = Instant::now();
        generation
    }

    /// Take everything queued, if `generation` is still the attached transport.
    pub(crate) fn take(&self, generation: u64) -> Option<Vec<PushMessage>> {
        let mut state = self.state.lock();
        if state.transport != Some(generation) {
            return None;
        }
        state.last_seen = Instant::now();
        Some(state.queue.drain(..).collect())
    }

    /// Transport `generation` is gone: discard the queue.
    pub(crate) fn detach(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.transport == Some(generation) {
            state.transport = None;
            state.queue.clear();
            state.last_seen = Instant::now();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().transport.is_some()
    }

    /// How long the session has been without a transport.
    pub(crate) fn idle_for(&self) -> Option<Duration> {
        let state = self.state.lock();
        state.transport.is_none().then(|| state.last_seen.elapsed())
    }

    /// Pending message count.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Messages evicted by the backlog bound so far.
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    #[cfg(test)]
    pub(crate) fn drain(&self) -> Vec<PushMessage> {
        self.state.lock().queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::target::Target;

    fn channel(backlog: usize) -> SessionChannel {
        SessionChannel::new(SessionId::generate(), BrowserId::generate(), backlog)
    }

    fn html_of(messages: &[PushMessage]) -> Vec<&str> {
        messages
            .iter()
            .filter_map(|m| match m {
                PushMessage::Patch { html, .. } => Some(html.as_str()),
                _ => None,
            })
            .collect()
    }

    fn counter() -> (Arc<AtomicUsize>, InvalidCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: InvalidCallback = Box::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_fifo_per_target() {
        let ch = channel(16);
        let target = Target::new();
        for i in 0..5 {
            assert!(ch.push(PushMessage::patch(&target, i.to_string())));
        }
        assert_eq!(html_of(&ch.drain()), ["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_replace_and_append_share_anchor() {
        let ch = channel(16);
        let target = Target::new();
        ch.push(PushMessage::patch(&target.replace(), "a"));
        ch.push(PushMessage::patch(&target.append(), "b"));

        let messages = ch.drain();
        assert_eq!(messages[0].target_id(), messages[1].target_id());
        assert!(matches!(
            (&messages[0], &messages[1]),
            (
                PushMessage::Patch { swap: crate::target::SwapMode::Replace, .. },
                PushMessage::Patch { swap: crate::target::SwapMode::Append, .. }
            )
        ));
    }

    #[test]
    fn test_overflow_drops_oldest_for_same_target() {
        let ch = channel(3);
        let a = Target::new();
        let b = Target::new();
        ch.push(PushMessage::patch(&b, "b0"));
        ch.push(PushMessage::patch(&a, "a0"));
        ch.push(PushMessage::patch(&a, "a1"));
        ch.push(PushMessage::patch(&a, "a2"));

        assert_eq!(ch.dropped(), 1);
        assert_eq!(html_of(&ch.drain()), ["b0", "a1", "a2"]);
    }

    #[test]
    fn test_overflow_drops_oldest_overall() {
        let ch = channel(2);
        ch.push(PushMessage::patch(&Target::new(), "x"));
        ch.push(PushMessage::patch(&Target::new(), "y"));
        ch.push(PushMessage::patch(&Target::new(), "z"));
        assert_eq!(html_of(&ch.drain()), ["y", "z"]);
    }

    #[test]
    fn test_callback_fires_once() {
        let ch = channel(8);
        let target = Target::new();
        let (count, callback) = counter();
        ch.on_invalid(target.id(), callback);

        assert_eq!(ch.report_invalid(target.id()), 1);
        assert_eq!(ch.report_invalid(target.id()), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_invalid_is_noop() {
        let ch = channel(8);
        let live = Target::new();
        ch.push(PushMessage::patch(&live, "keep"));
        assert_eq!(ch.report_invalid("never-registered"), 0);
        assert_eq!(html_of(&ch.drain()), ["keep"]);
    }

    #[test]
    fn test_invalidated_target_drops_later_patches() {
        let ch = channel(8);
        let dead = Target::new();
        ch.push(PushMessage::patch(&dead, "pending"));
        ch.report_invalid(dead.id());

        assert_eq!(ch.pending(), 0);
        assert!(!ch.push(PushMessage::patch(&dead, "late")));

        let (count, callback) = counter();
        ch.on_invalid(dead.id(), callback);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transport_lifecycle() {
        let ch = channel(8);
        let target = Target::new();
        ch.push(PushMessage::patch(&target, "buffered"));
        assert!(!ch.is_attached());

        let first = ch.attach();
        assert_eq!(html_of(&ch.take(first).unwrap()), ["buffered"]);

        let second = ch.attach();
        assert!(ch.take(first).is_none(), "superseded transport");

        ch.push(PushMessage::patch(&target, "lost"));
        let (count, callback) = counter();
        ch.on_invalid(target.id(), callback);
        ch.detach(first); // stale generation, ignored
        assert!(ch.is_attached());
        ch.detach(second);

        assert!(!ch.is_attached());
        assert_eq!(ch.pending(), 0);
        assert!(ch.idle_for().is_some());
        // Callbacks outlive the transport.
        ch.report_invalid(target.id());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reconnect_keeps_invalidated_ids() {
        let ch = channel(8);
        let dead = Target::new();
        let first = ch.attach();
        ch.report_invalid(dead.id());
        ch.detach(first);

        let second = ch.attach();
        assert!(!ch.push(PushMessage::patch(&dead, "late")));
        assert_eq!(ch.take(second).unwrap().len(), 0);
    }
}
