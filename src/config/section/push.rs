//! `[push]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [push]
//! backlog = 256               # Pending messages per session before dropping
//! poll_interval_ms = 25       # Delivery loop read timeout
//! ping_interval_secs = 20     # Keep-alive ping period
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Push channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Bound of each session's outbound queue.
    pub backlog: usize,

    /// How long a delivery thread waits for client frames per turn.
    pub poll_interval_ms: u64,

    pub ping_interval_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            backlog: 256,
            poll_interval_ms: 25,
            ping_interval_secs: 20,
        }
    }
}

impl PushConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.backlog == 0 {
            diag.error("push.backlog", "must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            diag.error_with_hint(
                "push.poll_interval_ms",
                "must be greater than 0",
                "a zero read timeout would block delivery forever",
            );
        }
        if self.ping_interval_secs == 0 {
            diag.error("push.ping_interval_secs", "must be greater than 0");
        }
    }
}
