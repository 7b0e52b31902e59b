//! CLI commands
//!
//! Command implementations for the `pubflow` binary.

mod progress;
mod publish;
mod session;
mod style;
mod summary;
mod validate;

pub use publish::run_publish;
pub use session::SessionArgs;
pub use summary::run_summary;
pub use validate::run_validate;
