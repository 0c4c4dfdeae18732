/// Error types for the process manager
use thiserror::Error;

use crate::process::{ProcessState, PtyError};

#[derive(Error, Debug)]
pub enum ProcessError {
    /// `launch` was called on a manager that already has a process
    #[error("Process already launched (state: {0:?})")]
    AlreadyLaunched(ProcessState),

    /// The operation needs a running process
    #[error("No running process (state: {0:?})")]
    NotRunning(ProcessState),

    /// The requested shell has no usable configuration
    #[error("Shell configuration not found for: {0}")]
    ShellNotConfigured(String),

    /// The process-spawning collaborator failed
    #[error("PTY error: {0}")]
    Pty(#[from] PtyError),
}
