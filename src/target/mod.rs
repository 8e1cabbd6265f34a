//! Target Allocator
//!
//! A [`Target`] names a DOM element and the swap verb used when new HTML
//! arrives for it. Targets are plain values: changing the swap mode returns a
//! copy, so several patches can aim at the same element with different verbs.
//!
//! ```ignore
//! let clock = Target::new();
//! let html = format!(r#"<div id="{clock}">...</div>"#);
//! ctx.patch(&clock.outline(), render(now));
//! ```
//!
//! Ids are `t{salt}_{counter}`: the counter is process-wide and monotonic, so
//! an id is never reissued while a background patch may still reference it.

mod skeleton;

pub use skeleton::SkeletonKind;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::utils::hash::process_salt;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh DOM-safe identifier with the given prefix letter.
///
/// Shared by targets, content roots and session ids, so none of them can
/// collide within one process.
pub(crate) fn next_id(prefix: &str) -> String {
    let n = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{}_{n:x}", process_salt())
}

// =============================================================================
// Swap mode
// =============================================================================

/// How patched HTML lands on the target element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapMode {
    /// Replace the element's children (innerHTML).
    #[default]
    Replace,
    /// Append after the last child.
    Append,
    /// Insert before the first child.
    Prepend,
    /// Replace the element itself (outerHTML).
    Outline,
}

impl SwapMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Outline => "outline",
        }
    }
}

impl fmt::Display for SwapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            "outline" => Ok(Self::Outline),
            other => Err(format!("unknown swap mode `{other}`")),
        }
    }
}

// =============================================================================
// Target
// =============================================================================

/// Stable DOM anchor plus swap verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    id: String,
    mode: SwapMode,
}

impl Target {
    /// Fresh unique target with `Replace` mode.
    pub fn new() -> Self {
        Self {
            id: next_id("t"),
            mode: SwapMode::Replace,
        }
    }

    /// Target for an element whose id is chosen by the page author.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mode: SwapMode::Replace,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn mode(&self) -> SwapMode {
        self.mode
    }

    /// Copy with the given swap mode.
    pub fn with_mode(&self, mode: SwapMode) -> Self {
        Self {
            id: self.id.clone(),
            mode,
        }
    }

    pub fn replace(&self) -> Self {
        self.with_mode(SwapMode::Replace)
    }

    pub fn append(&self) -> Self {
        self.with_mode(SwapMode::Append)
    }

    pub fn prepend(&self) -> Self {
        self.with_mode(SwapMode::Prepend)
    }

    pub fn outline(&self) -> Self {
        self.with_mode(SwapMode::Outline)
    }

    /// Placeholder markup carrying this target's id.
    pub fn skeleton(&self, kind: SkeletonKind) -> String {
        kind.render(&self.id)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the bare id, for use in `id="..."` attributes.
impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// DOM-safe token check (`[A-Za-z0-9_-]`, 1..=64 chars).
pub fn is_dom_safe(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
