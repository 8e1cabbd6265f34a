//! `[session]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [session]
//! cookie = "pw_sid"           # Cookie base name; the app name is appended
//! idle_ttl_secs = 1800        # Drop sessions detached for this long
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::session::is_token;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie: String,
    pub idle_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie: "pw_sid".into(),
            idle_ttl_secs: 1800,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !is_token(&self.cookie) {
            diag.error_with_hint(
                "session.cookie",
                format!("`{}` is not a valid cookie name", self.cookie),
                "use letters, digits, `_` or `-`",
            );
        }
        if self.idle_ttl_secs == 0 {
            diag.error("session.idle_ttl_secs", "must be greater than 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_session_config() {
        let config = test_parse_config("[session]\ncookie = \"sid\"");
        assert_eq!(config.session.cookie, "sid");
        assert_eq!(config.session.idle_ttl_secs, 1800);
    }

    #[test]
    fn test_session_cookie_must_be_token() {
        let config = test_parse_config("[session]\ncookie = \"my sid\"");
        let mut diag = ConfigDiagnostics::new();
        config.session.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
