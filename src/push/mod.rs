//! Push Hub
//!
//! Out-of-band HTML patches from server to browser, and dead-target reports
//! from browser to server.
//!
//! # Architecture
//!
//! ```text
//! producer --patch--> PushHub --> SessionChannel (bounded FIFO)
//!                                       |
//!                            delivery thread (single writer)
//!                                       |
//!                                   WebSocket --> browser
//!                                       ^             |
//!                                       +--invalid----+
//! ```
//!
//! # Module Structure
//!
//! - `message` - JSON frame protocol
//! - `channel` - per-session queue, callbacks, transport attachment
//! - `hub` - sessions of one app, `Pusher` handle for background work
//! - `transport` - delivery loop for one WebSocket
//! - `server` - WebSocket acceptor shared by all mounted apps

mod channel;
mod hub;
mod message;
mod server;
mod transport;

pub use channel::{InvalidCallback, SessionChannel};
pub use hub::{PushHub, Pusher};
pub use message::{ClientMessage, PushMessage};
pub use server::{HubRouter, LiveServer};
pub use transport::CLOSE_SUPERSEDED;

pub(crate) use server::{bind as bind_live, start as start_live};

use std::time::Duration;

use crate::config::PushConfig;

/// Delivery timing for transports.
#[derive(Debug, Clone, Copy)]
pub struct PushSettings {
    /// Socket read timeout; also bounds patch latency.
    pub poll_interval: Duration,
    pub ping_interval: Duration,
}

impl From<&PushConfig> for PushSettings {
    fn from(config: &PushConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            ping_interval: Duration::from_secs(config.ping_interval_secs),
        }
    }
}
