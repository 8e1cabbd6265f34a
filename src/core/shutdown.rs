//! Process-wide shutdown signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable shutdown flag.
///
/// Readable from plain threads (`is_triggered`) and awaitable from tasks
/// (`wait`). Triggering is idempotent.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            let triggered = *rx.borrow_and_update();
            if triggered || rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_shared_by_clones() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        assert!(!clone.is_triggered());
        shutdown.trigger();
        shutdown.trigger();
        assert!(clone.is_triggered());
    }

    #[test]
    fn test_wait_wakes_tasks() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let shutdown = Shutdown::new();

        rt.block_on(async {
            let waiter = {
                let shutdown = shutdown.clone();
                tokio::spawn(async move { shutdown.wait().await })
            };
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(!waiter.is_finished());

            shutdown.trigger();
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();

            // Already triggered: returns at once.
            shutdown.wait().await;
        });
    }
}
