/// Runs one terminal session end to end: engine acquisition, process
/// manager, shell monitor. Stdin is forwarded to the shell, output to stdout.
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use rs_terminal_instance::ServiceCollection;
use rs_terminal_instance::config::{
    ConfigLoader, TerminalConfig, bootstrap_subscriber, init_logging,
};
use rs_terminal_instance::engine::HeadlessModuleLoader;
use rs_terminal_instance::process::{ProcessState, PtyFactory, TokioProcessPtyFactory};
use rs_terminal_instance::service::{
    DefaultTerminalInstanceService, ServiceError, TerminalInstanceService,
};
use rs_terminal_instance::shell_monitor::{ShellObserver, TerminalView, platform_introspector};

/// Logs shell switches the way a session would retitle its tab
struct SessionTitle {
    session_id: String,
}

impl ShellObserver for SessionTitle {
    fn shell_changed(&self, shell_name: &str) {
        info!("Session {} title: {}", self.session_id, shell_name);
    }
}

/// Minimal view: signals a line feed whenever output contains a newline
struct OutputView {
    line_feeds: broadcast::Sender<()>,
}

impl TerminalView for OutputView {
    fn subscribe_line_feeds(&self) -> broadcast::Receiver<()> {
        self.line_feeds.subscribe()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = tracing::subscriber::with_default(bootstrap_subscriber("info"), || {
        ConfigLoader::new().load_config(None)
    })
    .context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.logging)?;
    let config = Arc::new(config);

    let services =
        ServiceCollection::new().with::<dyn PtyFactory>(Arc::new(TokioProcessPtyFactory));
    let service = DefaultTerminalInstanceService::from_config(
        &config,
        Arc::new(HeadlessModuleLoader),
        Arc::new(services),
        platform_introspector(),
        true,
    )?;

    let session_id = Uuid::new_v4().to_string();
    if let Err(e) = run_session(&service, &session_id, config).await {
        error!("Session {} failed to run: {}", session_id, e);
        return Err(e.into());
    }
    Ok(())
}

async fn run_session(
    service: &dyn TerminalInstanceService,
    session_id: &str,
    config: Arc<TerminalConfig>,
) -> Result<(), ServiceError> {
    let engine = service.acquire_engine().await?;
    info!(
        "Engine {} ready with capabilities {:?}",
        engine.module().name(),
        engine.capabilities()
    );

    let mut process = service.create_process_manager(session_id, config)?;
    let pid = process.launch(None, None).await?;

    let (line_feeds, _) = broadcast::channel(64);
    let view = Arc::new(OutputView {
        line_feeds: line_feeds.clone(),
    });
    let observer = Arc::new(SessionTitle {
        session_id: session_id.to_string(),
    });
    let mut monitor = pid.and_then(|pid| service.create_shell_monitor(pid, observer, view));
    match monitor.as_mut() {
        Some(monitor) => monitor.start(),
        None => warn!("Shell monitoring disabled for session {}", session_id),
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut buffer = [0u8; 4096];

    loop {
        tokio::select! {
            line = stdin.next_line() => match line? {
                Some(line) => process.write(format!("{line}\n").as_bytes()).await?,
                None => break,
            },
            read = process.read(&mut buffer) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                stdout.write_all(&buffer[..n]).await?;
                stdout.flush().await?;
                if buffer[..n].contains(&b'\n') {
                    let _ = line_feeds.send(());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, terminating session {}", session_id);
                break;
            },
        }
    }

    drop(monitor);
    if process.state() == ProcessState::Running {
        if let Some(status) = process.poll_exit().await? {
            info!("Session {} exited with {}", session_id, status);
        } else {
            process.kill().await?;
        }
    }

    info!("Terminal session {} closed", session_id);
    Ok(())
}
