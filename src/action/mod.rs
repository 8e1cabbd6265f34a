//! Action Registry & Dispatch Endpoint
//!
//! Rendering a page registers its actions: each pairs a handler with a
//! snapshot of the state it closes over, under a stable [`ActionKey`]. The
//! page embeds an [`Action`] binding that posts the snapshot (as body items)
//! back to `{prefix}/__action/{key}`, where [`dispatch`] binds the items onto
//! a fresh clone of the snapshot and runs the handler.
//!
//! ```text
//! render ──► Context::call ──► ActionRegistry::register(key, Entry{state, handler})
//!                                        ▲
//! POST /__action/key ──► dispatch ──► resolve ──► bind(clone) ──► handler ──► fragment
//! ```
//!
//! Every render re-registers, so the newest snapshot wins. Entries are only
//! replaced, never evicted.

mod binding;
mod dispatch;
mod error;
mod key;
mod registry;

pub use binding::{Action, Trigger};
pub use dispatch::dispatch;
pub use error::DispatchError;
pub use key::ActionKey;
pub use registry::{ActionRegistry, Invoke};

pub(crate) use registry::Entry;
