/// Factory for session-scoped collaborators
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::TerminalConfig;
use crate::instantiation::{ConstructionError, Resolver};
use crate::process::{ProcessManager, ProcessManagerArgs};
use crate::shell_monitor::{ProcessIntrospector, ShellMonitor, ShellObserver, TerminalView};

/// Creates shell monitors and process managers for sessions.
/// Holds no per-session state; every call builds a new object.
pub struct SessionCollaboratorFactory {
    resolver: Arc<dyn Resolver>,
    introspector: Arc<dyn ProcessIntrospector>,
    monitor_debounce: Duration,
}

impl SessionCollaboratorFactory {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        introspector: Arc<dyn ProcessIntrospector>,
        monitor_debounce: Duration,
    ) -> Self {
        Self {
            resolver,
            introspector,
            monitor_debounce,
        }
    }

    /// `None` when the platform cannot inspect process trees
    pub fn create_shell_monitor(
        &self,
        shell_process_id: u32,
        session: Arc<dyn ShellObserver>,
        view: Arc<dyn TerminalView>,
    ) -> Option<ShellMonitor> {
        if !self.introspector.is_supported() {
            info!(
                "Process-tree introspection unavailable, no shell monitor for {}",
                shell_process_id
            );
            return None;
        }

        Some(ShellMonitor::new(
            shell_process_id,
            session,
            view,
            self.introspector.clone(),
            self.monitor_debounce,
        ))
    }

    pub fn create_process_manager(
        &self,
        session_id: &str,
        config: Arc<TerminalConfig>,
    ) -> Result<ProcessManager, ConstructionError> {
        self.resolver.create_instance::<ProcessManager>(ProcessManagerArgs {
            session_id: session_id.to_string(),
            config,
        })
    }
}
