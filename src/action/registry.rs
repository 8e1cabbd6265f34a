//! Per-app action registry.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::key::ActionKey;
use crate::app::Context;
use crate::bind::Bind;

/// A registered handler, callable by the dispatch endpoint.
pub trait Invoke: Send + Sync {
    fn invoke(&self, ctx: &mut Context<'_>) -> String;
}

/// Handler paired with the state snapshot it was registered with.
///
/// Each invocation binds the request body onto a clone of the snapshot, so
/// concurrent dispatches never share mutable state.
pub(crate) struct Entry<S, F> {
    state: S,
    handler: F,
}

impl<S, F> Entry<S, F> {
    pub(crate) fn new(state: S, handler: F) -> Self {
        Self { state, handler }
    }
}

impl<S, F> Invoke for Entry<S, F>
where
    S: Bind + Clone + Send + Sync,
    F: Fn(&mut S, &Context<'_>) -> String + Send + Sync,
{
    fn invoke(&self, ctx: &mut Context<'_>) -> String {
        let mut state = self.state.clone();
        if let Err(errors) = ctx.body(&mut state) {
            crate::debug!("action"; "{}", errors);
            ctx.record_bind_errors(errors);
        }
        (self.handler)(&mut state, ctx)
    }
}

/// Actions reachable from one app's pages. Last registration of a key wins.
#[derive(Default)]
pub struct ActionRegistry {
    entries: Mutex<FxHashMap<ActionKey, Arc<dyn Invoke>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: ActionKey, entry: Arc<dyn Invoke>) {
        self.entries.lock().insert(key, entry);
    }

    /// Look up `key`; the lock is released before the entry runs.
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn Invoke>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_app;
    use crate::bind::{BodyItem, ValueKind};
    use crate::session::SessionId;

    #[derive(Debug, Clone, Default)]
    struct Hits {
        count: i64,
    }
    crate::bindable!(Hits { count as "Count" });

    fn entry<F>(state: Hits, handler: F) -> Arc<dyn Invoke>
    where
        F: Fn(&mut Hits, &Context<'_>) -> String + Send + Sync + 'static,
    {
        Arc::new(Entry::new(state, handler))
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ActionRegistry::new();
        let key = ActionKey::named("hit");
        registry.register(key.clone(), entry(Hits::default(), |_, _| "first".into()));
        registry.register(key, entry(Hits::default(), |_, _| "second".into()));

        assert_eq!(registry.len(), 1);
        let app = test_app("registry");
        let mut ctx = Context::new(&app, SessionId::generate(), Vec::new(), None);
        assert_eq!(registry.resolve("hit").unwrap().invoke(&mut ctx), "second");
        assert!(registry.resolve("miss").is_none());
    }

    #[test]
    fn test_entry_binds_onto_a_clone() {
        let app = test_app("entry");
        let snapshot = Hits { count: 1 };
        let entry = entry(snapshot, |hits, _| {
            hits.count += 1;
            hits.count.to_string()
        });

        let items = vec![BodyItem::new("Count", "41", ValueKind::Int)];
        let mut ctx = Context::new(&app, SessionId::generate(), items, None);
        assert_eq!(entry.invoke(&mut ctx), "42");

        // The snapshot itself is untouched.
        let mut ctx = Context::new(&app, SessionId::generate(), Vec::new(), None);
        assert_eq!(entry.invoke(&mut ctx), "2");
    }

    #[test]
    fn test_bind_errors_reach_the_handler() {
        let app = test_app("entry-errors");
        let entry = entry(Hits { count: 7 }, |hits, ctx| {
            format!("{} {}", hits.count, ctx.bind_errors().len())
        });

        let items = vec![BodyItem::new("Count", "many", ValueKind::Int)];
        let mut ctx = Context::new(&app, SessionId::generate(), items, None);
        assert_eq!(entry.invoke(&mut ctx), "7 1");
        assert!(ctx.bind_errors().field("Count").is_some());
    }
}
