//! Dispatch failures and their error fragments.

use thiserror::Error;

use crate::utils::html::escape;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("action not found: {0}")]
    RegistryMiss(String),

    #[error("malformed action body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("action body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("actions must be POSTed")]
    MethodNotAllowed,

    #[error("action handler failed")]
    HandlerFault,
}

impl DispatchError {
    pub const fn status(&self) -> u16 {
        match self {
            Self::RegistryMiss(_) => 404,
            Self::MalformedBody(_) => 400,
            Self::BodyTooLarge { .. } => 413,
            Self::MethodNotAllowed => 405,
            Self::HandlerFault => 500,
        }
    }

    /// HTML shown in place of the action's result.
    ///
    /// Handler faults stay generic; details go to the log only.
    pub fn fragment(&self) -> String {
        let message = match self {
            Self::RegistryMiss(_) => "action not found".to_string(),
            Self::HandlerFault => "something went wrong".to_string(),
            other => other.to_string(),
        };
        format!(r#"<div class="pw-error" role="alert">{}</div>"#, escape(&message))
    }
}
