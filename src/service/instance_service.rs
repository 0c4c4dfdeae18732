/// Terminal instance service: the one dependency the session layer takes on
/// engine and platform machinery.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{ConfigError, TerminalConfig};
use crate::engine::{EngineHandle, EngineLoadError, EngineLoader, EngineOptions, ModuleLoader};
use crate::instantiation::{ConstructionError, Resolver};
use crate::localization::{LocalizationCatalog, MemoryCatalog};
use crate::process::ProcessManager;
use crate::service::SessionCollaboratorFactory;
use crate::shell_monitor::{ProcessIntrospector, ShellMonitor, ShellObserver, TerminalView};

#[async_trait]
pub trait TerminalInstanceService: Send + Sync {
    /// The shared engine, loaded on first use
    async fn acquire_engine(&self) -> Result<EngineHandle, EngineLoadError>;

    /// Shell monitor for a running child, or `None` on platforms without
    /// process-tree introspection
    fn create_shell_monitor(
        &self,
        shell_process_id: u32,
        session: Arc<dyn ShellObserver>,
        view: Arc<dyn TerminalView>,
    ) -> Option<ShellMonitor>;

    /// New process manager bound to `session_id` and a config snapshot
    fn create_process_manager(
        &self,
        session_id: &str,
        config: Arc<TerminalConfig>,
    ) -> Result<ProcessManager, ConstructionError>;
}

/// Default implementation over an [`EngineLoader`] and a
/// [`SessionCollaboratorFactory`]
pub struct DefaultTerminalInstanceService {
    loader: EngineLoader,
    factory: SessionCollaboratorFactory,
}

impl DefaultTerminalInstanceService {
    pub fn new(loader: EngineLoader, factory: SessionCollaboratorFactory) -> Self {
        Self { loader, factory }
    }

    /// Wire the service from configuration.
    ///
    /// With `process_wide` the engine loader is the process-global one, so
    /// every service built this way shares a single engine.
    pub fn from_config(
        config: &TerminalConfig,
        module_loader: Arc<dyn ModuleLoader>,
        resolver: Arc<dyn Resolver>,
        introspector: Arc<dyn ProcessIntrospector>,
        process_wide: bool,
    ) -> Result<Self, ConfigError> {
        let catalog: Arc<dyn LocalizationCatalog> = match &config.catalog_path {
            Some(path) => Arc::new(MemoryCatalog::from_toml_file(path)?),
            None => Arc::new(MemoryCatalog::new()),
        };

        let options = EngineOptions::from_config(config);
        let build = || EngineLoader::new(module_loader, catalog, options);
        let loader = if process_wide {
            EngineLoader::global_or_init(build)
        } else {
            build()
        };

        let factory = SessionCollaboratorFactory::new(
            resolver,
            introspector,
            Duration::from_millis(config.shell_monitor.debounce_ms),
        );

        info!(
            "Terminal instance service ready (engine module: {}, locale: {})",
            config.engine_module, config.locale
        );
        Ok(Self::new(loader, factory))
    }

    pub fn engine_loader(&self) -> &EngineLoader {
        &self.loader
    }
}

#[async_trait]
impl TerminalInstanceService for DefaultTerminalInstanceService {
    async fn acquire_engine(&self) -> Result<EngineHandle, EngineLoadError> {
        self.loader.acquire().await
    }

    fn create_shell_monitor(
        &self,
        shell_process_id: u32,
        session: Arc<dyn ShellObserver>,
        view: Arc<dyn TerminalView>,
    ) -> Option<ShellMonitor> {
        self.factory
            .create_shell_monitor(shell_process_id, session, view)
    }

    fn create_process_manager(
        &self,
        session_id: &str,
        config: Arc<TerminalConfig>,
    ) -> Result<ProcessManager, ConstructionError> {
        self.factory.create_process_manager(session_id, config)
    }
}
