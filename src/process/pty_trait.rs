use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

// ================ 配置与错误类型 ================

/// Launch parameters handed to the process-spawning collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct PtyConfig {
    pub command: String,
    pub args: Vec<String>,
    pub cols: u16,
    pub rows: u16,
    pub env: Vec<(String, String)>,
    pub cwd: Option<std::path::PathBuf>,
}

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Process spawn failed: {0}")]
    SpawnFailed(String),
    #[error("PTY not available")]
    NotAvailable,
    #[error("Process already terminated")]
    ProcessTerminated,
    #[error("Resize failed: {0}")]
    ResizeFailed(String),
    #[error("Other error: {0}")]
    Other(String),
}

// ================ 核心Trait定义 ================

/// Asynchronous pseudo terminal owned by one session
#[async_trait]
pub trait AsyncPty: AsyncRead + AsyncWrite + Send + Sync + Unpin {
    async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError>;

    /// Child process id, if the backend exposes one
    fn pid(&self) -> Option<u32>;

    fn is_alive(&self) -> bool;

    /// Non-blocking exit check
    async fn try_wait(&mut self) -> Result<Option<std::process::ExitStatus>, PtyError>;

    async fn kill(&mut self) -> Result<(), PtyError>;
}

/// Process-spawning collaborator injected into the process manager
#[async_trait]
pub trait PtyFactory: Send + Sync {
    async fn create(&self, config: &PtyConfig) -> Result<Box<dyn AsyncPty>, PtyError>;

    /// Factory name, for logs
    fn name(&self) -> &'static str;
}
