//! Background producers: deferred fragments and tickers.
//!
//! A producer outlives the request that started it and reaches the browser
//! only through the session's push channel.
//!
//! ```text
//! Starting ──first patch──► Running ──invalid report / max ticks / shutdown──► Stopped
//! ```

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Context;
use crate::target::{SkeletonKind, Target};

/// Shortest ticker period; shorter requests are raised to it.
const MIN_TICK: Duration = Duration::from_millis(1);

impl Context<'_> {
    /// Return a skeleton now; patch the producer's HTML over it later.
    ///
    /// `producer` runs on the blocking pool. The result replaces the skeleton
    /// element as a whole (`Outline`) in exactly one patch, unless shutdown
    /// was signalled first.
    pub fn defer<P>(&self, kind: SkeletonKind, producer: P) -> String
    where
        P: FnOnce() -> String + Send + 'static,
    {
        let target = Target::new();
        let skeleton = target.skeleton(kind);
        let pusher = self.pusher();
        let shutdown = self.app().shutdown().clone();

        self.app().runtime().spawn_blocking(move || {
            let html = producer();
            if shutdown.is_triggered() {
                crate::debug!("push"; "shutdown, deferred {} dropped", target);
                return;
            }
            pusher.patch(&target.outline(), html);
        });

        skeleton
    }

    /// Patch `target` with `render(tick)` every `every`, starting now.
    ///
    /// Stops when the client reports the target gone, after `max_ticks`
    /// patches, when the session disappears, or on shutdown. A zero `every`
    /// is treated as [`MIN_TICK`].
    pub fn ticker<R>(&self, target: &Target, every: Duration, max_ticks: u32, render: R) -> JoinHandle<()>
    where
        R: Fn(u32) -> String + Send + 'static,
    {
        let pusher = self.pusher();
        let shutdown = self.app().shutdown().clone();
        let target = target.clone();

        self.app().runtime().spawn(async move {
            let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
            let mut stop_tx = Some(stop_tx);
            let mut interval = tokio::time::interval(every.max(MIN_TICK));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for tick in 0..max_ticks {
                tokio::select! {
                    _ = interval.tick() => {}
                    // Fired by the invalid report, or dropped with a pruned session.
                    _ = &mut stop_rx => break,
                    _ = shutdown.wait() => break,
                }

                let html = render(tick);
                let queued = match stop_tx.take() {
                    Some(tx) => pusher.patch_with(&target, html, move || {
                        let _ = tx.send(());
                    }),
                    None => pusher.patch(&target, html),
                };
                if !queued {
                    break;
                }
            }
            crate::debug!("push"; "ticker {} stopped", target);
        })
    }
}
