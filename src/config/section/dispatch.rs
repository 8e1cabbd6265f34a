//! `[dispatch]` section configuration.
//!
//! ```toml
//! [dispatch]
//! max_body_bytes = 1048576    # Larger action bodies are rejected with 413
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub max_body_bytes: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_body_bytes == 0 {
            diag.error("dispatch.max_body_bytes", "must be greater than 0");
        }
    }
}
