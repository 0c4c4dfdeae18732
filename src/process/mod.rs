/// Session process management
///
/// The process manager owns one session's shell; spawning is delegated to an
/// injected [`PtyFactory`].
mod detect;
mod error;
mod process_manager;
mod pty_trait;
mod tokio_process_pty_impl;

pub use detect::detect_shell;
pub use error::ProcessError;
pub use process_manager::{ProcessManager, ProcessManagerArgs, ProcessState};
pub use pty_trait::*;
pub use tokio_process_pty_impl::{TokioProcessPty, TokioProcessPtyFactory};
