//! Core lifecycle types shared across the codebase.

mod runtime;
mod shutdown;
mod state;

pub use runtime::Runtime;
pub use shutdown::Shutdown;
pub use state::{register_server, setup_shutdown_handler};
