use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::{debug, error, info};

use crate::process::{AsyncPty, PtyConfig, PtyError, PtyFactory};

/// Pipe-backed "PTY" built on tokio::process.
/// Portable, but the child sees no terminal and cannot be resized.
pub struct TokioProcessPty {
    child: tokio::process::Child,
    stdin: tokio::process::ChildStdin,
    stdout: tokio::process::ChildStdout,
    stderr: tokio::process::ChildStderr,
    stdout_closed: bool,
    stderr_closed: bool,
    child_exited: bool,
}

impl TokioProcessPty {
    pub fn new(config: &PtyConfig) -> Result<Self, PtyError> {
        info!(
            "TokioProcessPty: Spawning {:?} with args {:?}",
            config.command, config.args
        );

        let mut cmd = tokio::process::Command::new(&config.command);
        cmd.args(&config.args)
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &config.cwd {
            debug!("TokioProcessPty: Setting cwd to: {:?}", cwd);
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            error!("TokioProcessPty: Failed to spawn process: {}", e);
            PtyError::SpawnFailed(e.to_string())
        })?;

        let stdin = child.stdin.take().ok_or(PtyError::NotAvailable)?;
        let stdout = child.stdout.take().ok_or(PtyError::NotAvailable)?;
        let stderr = child.stderr.take().ok_or(PtyError::NotAvailable)?;

        info!("TokioProcessPty: Spawned process {:?}", child.id());

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            stdout_closed: false,
            stderr_closed: false,
            child_exited: false,
        })
    }
}

impl AsyncRead for TokioProcessPty {
    /// Reads stdout first, then stderr. EOF only once both are closed.
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();

        if !this.stdout_closed {
            let before = buf.filled().len();
            match Pin::new(&mut this.stdout).poll_read(cx, buf) {
                Poll::Ready(Ok(())) if buf.filled().len() > before => return Poll::Ready(Ok(())),
                Poll::Ready(Ok(())) => this.stdout_closed = true,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => {}
            }
        }

        if !this.stderr_closed {
            let before = buf.filled().len();
            match Pin::new(&mut this.stderr).poll_read(cx, buf) {
                Poll::Ready(Ok(())) if buf.filled().len() > before => return Poll::Ready(Ok(())),
                Poll::Ready(Ok(())) => this.stderr_closed = true,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => {}
            }
        }

        if this.stdout_closed && this.stderr_closed {
            debug!("TokioProcessPty: Output streams closed");
            Poll::Ready(Ok(()))
        } else {
            Poll::Pending
        }
    }
}

impl AsyncWrite for TokioProcessPty {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().stdin).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().stdin).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().stdin).poll_shutdown(cx)
    }
}

#[async_trait]
impl AsyncPty for TokioProcessPty {
    async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError> {
        debug!(
            "TokioProcessPty: Resize to {}x{} not supported, ignoring",
            cols, rows
        );
        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&self) -> bool {
        !self.child_exited
    }

    async fn try_wait(&mut self) -> Result<Option<std::process::ExitStatus>, PtyError> {
        if self.child_exited {
            return Ok(None);
        }

        match self.child.try_wait()? {
            Some(status) => {
                info!("TokioProcessPty: Child process exited with status: {:?}", status);
                self.child_exited = true;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    async fn kill(&mut self) -> Result<(), PtyError> {
        if self.child_exited {
            return Err(PtyError::ProcessTerminated);
        }

        info!("TokioProcessPty: Killing child process {:?}", self.child.id());
        self.child.kill().await.map_err(|e| {
            error!("TokioProcessPty: Failed to kill child process: {}", e);
            PtyError::Io(e)
        })?;

        self.child_exited = true;
        Ok(())
    }
}

// ================ 工厂实现 ================

/// Factory for [`TokioProcessPty`]
#[derive(Debug, Default)]
pub struct TokioProcessPtyFactory;

#[async_trait]
impl PtyFactory for TokioProcessPtyFactory {
    async fn create(&self, config: &PtyConfig) -> Result<Box<dyn AsyncPty>, PtyError> {
        let pty = TokioProcessPty::new(config)?;
        Ok(Box::new(pty))
    }

    fn name(&self) -> &'static str {
        "tokio-process-pty"
    }
}
