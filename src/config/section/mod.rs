//! Configuration section definitions.

mod dispatch;
mod push;
mod serve;
mod session;

pub use dispatch::DispatchConfig;
pub use push::PushConfig;
pub use serve::ServeConfig;
pub use session::SessionConfig;
