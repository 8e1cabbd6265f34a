//! Push channel message protocol.
//!
//! JSON frames exchanged over the session WebSocket.
//!
//! # Server → client
//!
//! - `patch`: swap HTML into a target element
//! - `reload`: full page reload
//! - `redirect`: navigate to a URL
//! - `connected`: handshake acknowledgement
//! - `ping`: keep-alive
//!
//! # Client → server
//!
//! - `invalid`: a patched target id is not in the DOM
//! - `pong`: keep-alive reply

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::target::{SwapMode, Target};

/// Message sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushMessage {
    Patch {
        #[serde(rename = "targetId")]
        target_id: String,
        swap: SwapMode,
        html: String,
    },

    Reload,

    Redirect { url: String },

    Connected {
        /// Server version for compatibility check
        version: String,
        session: String,
    },

    Ping {
        /// Milliseconds since the Unix epoch
        ts: u64,
    },
}

impl PushMessage {
    pub fn patch(target: &Target, html: impl Into<String>) -> Self {
        Self::Patch {
            target_id: target.id().to_owned(),
            swap: target.mode(),
            html: html.into(),
        }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect { url: url.into() }
    }

    pub fn connected(session: impl Into<String>) -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
            session: session.into(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn ping() -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::Ping { ts }
    }

    /// Target id of a patch message.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::Patch { target_id, .. } => Some(target_id),
            _ => None,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

/// Message received from the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Invalid {
        #[serde(rename = "targetId")]
        target_id: String,
    },

    Pong {
        #[serde(default)]
        ts: u64,
    },
}

impl ClientMessage {
    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_wire_format() {
        let target = Target::with_id("clock").outline();
        let json = PushMessage::patch(&target, "<b>12:00</b>").to_json();
        assert_eq!(
            json,
            r#"{"type":"patch","targetId":"clock","swap":"outline","html":"<b>12:00</b>"}"#
        );
    }

    #[test]
    fn test_command_wire_format() {
        assert_eq!(PushMessage::Reload.to_json(), r#"{"type":"reload"}"#);
        assert_eq!(
            PushMessage::redirect("/done").to_json(),
            r#"{"type":"redirect","url":"/done"}"#
        );
        let connected = PushMessage::connected("s1").to_json();
        assert!(connected.contains(r#""type":"connected""#));
        assert!(connected.contains(r#""session":"s1""#));
        assert!(PushMessage::ping().to_json().starts_with(r#"{"type":"ping","ts":"#));
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"invalid","targetId":"t1"}"#),
            Some(ClientMessage::Invalid {
                target_id: "t1".into()
            })
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"pong"}"#),
            Some(ClientMessage::Pong { ts: 0 })
        );
        assert_eq!(ClientMessage::from_json(r#"{"type":"page","path":"/"}"#), None);
        assert_eq!(ClientMessage::from_json("not json"), None);
    }

    #[test]
    fn test_target_id() {
        let patch = PushMessage::patch(&Target::with_id("a"), "");
        assert_eq!(patch.target_id(), Some("a"));
        assert_eq!(PushMessage::Reload.target_id(), None);
    }
}
