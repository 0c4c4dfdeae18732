/// Per-session process manager
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info};

use crate::config::{TerminalConfig, TerminalSize};
use crate::instantiation::{ConstructionError, Injectable, Resolver};
use crate::process::{AsyncPty, ProcessError, PtyConfig, PtyError, PtyFactory, detect_shell};

/// Lifecycle of a session's process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Not launched yet
    Uninitialized,
    /// Spawn in progress
    Launching,
    Running,
    /// The spawn failed
    KilledDuringLaunch,
    /// Terminated through `kill`
    KilledByUser,
    /// The process exited on its own
    KilledByProcess,
}

/// Call-site arguments for constructing a [`ProcessManager`]
#[derive(Debug, Clone)]
pub struct ProcessManagerArgs {
    pub session_id: String,
    /// Snapshot taken when the session starts; never mutated afterwards
    pub config: Arc<TerminalConfig>,
}

/// Process manager responsible for one session's shell process
pub struct ProcessManager {
    session_id: String,
    config: Arc<TerminalConfig>,
    pty_factory: Arc<dyn PtyFactory>,
    state: ProcessState,
    pty: Option<Box<dyn AsyncPty>>,
    shell_process_id: Option<u32>,
    initial_cwd: Option<PathBuf>,
}

impl Injectable for ProcessManager {
    type Args = ProcessManagerArgs;

    fn construct(resolver: &dyn Resolver, args: ProcessManagerArgs) -> Result<Self, ConstructionError> {
        if args.session_id.is_empty() {
            return Err(ConstructionError::Invalid("empty session id".to_string()));
        }

        let pty_factory = resolver.require::<dyn PtyFactory>("ProcessManager")?;
        info!(
            "Created process manager for session {} (pty factory: {})",
            args.session_id,
            pty_factory.name()
        );

        Ok(Self {
            session_id: args.session_id,
            config: args.config,
            pty_factory,
            state: ProcessState::Uninitialized,
            pty: None,
            shell_process_id: None,
            initial_cwd: None,
        })
    }
}

impl ProcessManager {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Pid of the launched shell, kept after it exits
    pub fn shell_process_id(&self) -> Option<u32> {
        self.shell_process_id
    }

    /// Working directory the shell was launched in
    pub fn initial_cwd(&self) -> Option<&Path> {
        self.initial_cwd.as_deref()
    }

    /// Build the launch configuration for `shell_type` (or the default shell).
    ///
    /// Working directory, size and environment fall back to `shells.default`;
    /// an explicit `size` wins over both.
    pub fn launch_config(
        &self,
        shell_type: Option<&str>,
        size: Option<TerminalSize>,
    ) -> Result<PtyConfig, ProcessError> {
        let shells = &self.config.shells;
        let shell_config = match shell_type {
            Some(name) => Some(
                shells
                    .get(name)
                    .ok_or_else(|| ProcessError::ShellNotConfigured(name.to_string()))?,
            ),
            None => shells
                .get(&self.config.default_shell_type)
                .or_else(|| shells.get("bash")),
        };
        let default_config = shells.get("default");

        let command = shell_config
            .and_then(|c| c.command.clone())
            .or_else(|| default_config.and_then(|c| c.command.clone()))
            .unwrap_or_else(|| vec![detect_shell()]);
        let (program, args) = command.split_first().ok_or_else(|| {
            ProcessError::ShellNotConfigured(
                shell_type.unwrap_or(&self.config.default_shell_type).to_string(),
            )
        })?;

        let working_directory = shell_config
            .and_then(|c| c.working_directory.clone())
            .or_else(|| default_config.and_then(|c| c.working_directory.clone()));

        let size = size
            .or_else(|| shell_config.and_then(|c| c.size.clone()))
            .or_else(|| default_config.and_then(|c| c.size.clone()))
            .unwrap_or_default();

        // Shell-specific variables override shells.default
        let mut environment = BTreeMap::from([
            ("TERM".to_string(), "xterm-256color".to_string()),
            ("COLORTERM".to_string(), "truecolor".to_string()),
        ]);
        for env in [default_config, shell_config]
            .into_iter()
            .flatten()
            .filter_map(|c| c.environment.as_ref())
        {
            environment.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Ok(PtyConfig {
            command: program.clone(),
            args: args.to_vec(),
            cols: size.columns,
            rows: size.rows,
            env: environment.into_iter().collect(),
            cwd: working_directory,
        })
    }

    /// Spawn the session's shell. Returns its pid when the backend exposes one.
    pub async fn launch(
        &mut self,
        shell_type: Option<&str>,
        size: Option<TerminalSize>,
    ) -> Result<Option<u32>, ProcessError> {
        if self.state != ProcessState::Uninitialized {
            return Err(ProcessError::AlreadyLaunched(self.state));
        }

        let pty_config = self.launch_config(shell_type, size)?;
        self.state = ProcessState::Launching;
        self.initial_cwd = pty_config.cwd.clone();
        info!(
            "Launching {} for session {} ({}x{})",
            pty_config.command, self.session_id, pty_config.cols, pty_config.rows
        );

        match self.pty_factory.create(&pty_config).await {
            Ok(pty) => {
                self.shell_process_id = pty.pid();
                self.pty = Some(pty);
                self.state = ProcessState::Running;
                info!(
                    "Session {} running with pid {:?}",
                    self.session_id, self.shell_process_id
                );
                Ok(self.shell_process_id)
            }
            Err(e) => {
                error!("Failed to launch process for session {}: {}", self.session_id, e);
                self.state = ProcessState::KilledDuringLaunch;
                Err(e.into())
            }
        }
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<(), ProcessError> {
        let pty = self.running_pty()?;
        pty.write_all(data).await.map_err(PtyError::from)?;
        pty.flush().await.map_err(PtyError::from)?;
        debug!("Wrote {} bytes to session {}", data.len(), self.session_id);
        Ok(())
    }

    /// Read process output; `Ok(0)` means the output streams closed
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ProcessError> {
        let pty = self.running_pty()?;
        let n = pty.read(buf).await.map_err(PtyError::from)?;
        Ok(n)
    }

    pub async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), ProcessError> {
        let pty = self.running_pty()?;
        pty.resize(cols, rows).await?;
        debug!("Resized session {} to {}x{}", self.session_id, cols, rows);
        Ok(())
    }

    /// Check whether the process exited on its own
    pub async fn poll_exit(&mut self) -> Result<Option<ExitStatus>, ProcessError> {
        let status = self.running_pty()?.try_wait().await?;
        if let Some(status) = status {
            info!("Session {} process exited: {}", self.session_id, status);
            self.state = ProcessState::KilledByProcess;
            self.pty = None;
        }
        Ok(status)
    }

    /// Terminate the process. No-op when nothing is running; on failure the
    /// process stays `Running` and owned by the manager.
    pub async fn kill(&mut self) -> Result<(), ProcessError> {
        let Some(pty) = self.pty.as_mut() else {
            debug!("Kill requested for session {} with no running process", self.session_id);
            return Ok(());
        };

        if let Err(e) = pty.kill().await {
            error!("Failed to kill process for session {}: {}", self.session_id, e);
            return Err(e.into());
        }
        self.pty = None;
        self.state = ProcessState::KilledByUser;
        info!("Killed process for session {}", self.session_id);
        Ok(())
    }

    fn running_pty(&mut self) -> Result<&mut Box<dyn AsyncPty>, ProcessError> {
        match self.pty.as_mut() {
            Some(pty) if self.state == ProcessState::Running => Ok(pty),
            _ => Err(ProcessError::NotRunning(self.state)),
        }
    }
}
