//! Background runtime for producers (deferred fragments, tickers).

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;

use super::Shutdown;

/// Time given to running producers once the runtime is closed.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Tokio runtime plus the shutdown signal every producer watches.
pub struct Runtime {
    inner: tokio::runtime::Runtime,
    shutdown: Shutdown,
}

impl Runtime {
    pub fn new(workers: usize) -> Result<Self> {
        let inner = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers.max(1))
            .thread_name("patchwire-worker")
            .enable_time()
            .build()
            .context("failed to create producer runtime")?;

        Ok(Self {
            inner,
            shutdown: Shutdown::new(),
        })
    }

    pub fn handle(&self) -> &Handle {
        self.inner.handle()
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Signal shutdown and give producers a moment to finish.
    pub fn close(self) {
        self.shutdown.trigger();
        self.inner.shutdown_timeout(CLOSE_TIMEOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_close_stops_waiting_tasks() {
        let runtime = Runtime::new(1).unwrap();
        let shutdown = runtime.shutdown().clone();
        runtime.handle().spawn(async move {
            shutdown.wait().await;
        });

        let started = Instant::now();
        runtime.close();
        assert!(started.elapsed() < CLOSE_TIMEOUT);
    }
}
