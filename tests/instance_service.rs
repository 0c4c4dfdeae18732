/// Service boundary behaviour as seen by the session layer.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Barrier, broadcast};

use rs_terminal_instance::config::{ShellConfig, TerminalConfig};
use rs_terminal_instance::engine::{
    CAPABILITIES, EngineLoadError, EngineLoader, EngineModule, EngineOptions,
    HeadlessModuleLoader, ModuleError, ModuleLoader,
};
use rs_terminal_instance::localization::MemoryCatalog;
use rs_terminal_instance::process::{ProcessState, PtyFactory, TokioProcessPtyFactory};
use rs_terminal_instance::service::{
    DefaultTerminalInstanceService, SessionCollaboratorFactory, TerminalInstanceService,
};
use rs_terminal_instance::shell_monitor::{
    IntrospectionError, ProcessIntrospector, ShellObserver, TerminalView, UnsupportedIntrospector,
};
use rs_terminal_instance::{ConstructionError, ServiceCollection};

/// Counts loads; fails the first `failures` of them. Each load sleeps briefly
/// so concurrent callers pile up on the in-flight attempt.
struct CountingLoader {
    calls: AtomicUsize,
    failures: usize,
}

impl CountingLoader {
    fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failures,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleLoader for CountingLoader {
    async fn load(&self, name: &str) -> Result<Box<dyn EngineModule>, ModuleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(20)).await;
        if call <= self.failures {
            return Err(ModuleError::Failed("module bundle missing".to_string()));
        }
        HeadlessModuleLoader.load(name).await
    }
}

struct SupportedIntrospector;

#[async_trait]
impl ProcessIntrospector for SupportedIntrospector {
    fn is_supported(&self) -> bool {
        true
    }

    async fn foreground_process_name(&self, _pid: u32) -> Result<Option<String>, IntrospectionError> {
        Ok(Some("bash".to_string()))
    }
}

struct NullSession;

impl ShellObserver for NullSession {
    fn shell_changed(&self, _shell_name: &str) {}
}

struct NullView(broadcast::Sender<()>);

impl TerminalView for NullView {
    fn subscribe_line_feeds(&self) -> broadcast::Receiver<()> {
        self.0.subscribe()
    }
}

fn view() -> Arc<dyn TerminalView> {
    Arc::new(NullView(broadcast::channel(4).0))
}

fn service_with(
    module_loader: Arc<dyn ModuleLoader>,
    catalog: MemoryCatalog,
    locale: &str,
    services: ServiceCollection,
    introspector: Arc<dyn ProcessIntrospector>,
) -> Arc<DefaultTerminalInstanceService> {
    let loader = EngineLoader::new(
        module_loader,
        Arc::new(catalog),
        EngineOptions {
            module_name: "headless".to_string(),
            locale: locale.to_string(),
        },
    );
    let factory =
        SessionCollaboratorFactory::new(Arc::new(services), introspector, Duration::from_millis(1));
    Arc::new(DefaultTerminalInstanceService::new(loader, factory))
}

fn pty_services() -> ServiceCollection {
    ServiceCollection::new().with::<dyn PtyFactory>(Arc::new(TokioProcessPtyFactory))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_concurrent_acquisitions_load_once() {
    let loader = CountingLoader::new(0);
    let service = service_with(
        loader.clone(),
        MemoryCatalog::new(),
        "en",
        pty_services(),
        Arc::new(UnsupportedIntrospector),
    );

    let barrier = Arc::new(Barrier::new(3));
    let callers: Vec<_> = (0..3)
        .map(|_| {
            let service = service.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                service.acquire_engine().await
            })
        })
        .collect();

    let mut handles = Vec::new();
    for caller in callers {
        handles.push(caller.await.unwrap().unwrap());
    }

    assert_eq!(loader.calls(), 1);
    for handle in &handles {
        assert!(handle.ptr_eq(&handles[0]));
        assert_eq!(handle.capabilities(), &CAPABILITIES);
    }
}

#[tokio::test]
async fn failed_load_is_retried_on_next_acquire() {
    let loader = CountingLoader::new(1);
    let service = service_with(
        loader.clone(),
        MemoryCatalog::new(),
        "en",
        pty_services(),
        Arc::new(UnsupportedIntrospector),
    );

    let err = service.acquire_engine().await.unwrap_err();
    assert!(matches!(err, EngineLoadError::Module { .. }));

    let engine = service.acquire_engine().await.unwrap();
    assert_eq!(engine.capabilities(), &CAPABILITIES);
    assert_eq!(loader.calls(), 2);

    service.acquire_engine().await.unwrap();
    assert_eq!(loader.calls(), 2);
}

#[tokio::test]
async fn missing_prompt_label_falls_back_to_default() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert("de", "terminal.integrated.a11yBlankLine", "Leerzeile");
    let service = service_with(
        CountingLoader::new(0),
        catalog,
        "de",
        pty_services(),
        Arc::new(UnsupportedIntrospector),
    );

    let engine = service.acquire_engine().await.unwrap();
    assert_eq!(engine.strings().blank_line, "Leerzeile");
    assert_eq!(engine.strings().prompt_label, "Terminal input");
    assert_eq!(
        engine.strings().too_much_output,
        "Too much output to announce, navigate to rows manually to read"
    );
}

#[tokio::test]
async fn process_managers_are_distinct_per_session() {
    let service = service_with(
        CountingLoader::new(0),
        MemoryCatalog::new(),
        "en",
        pty_services(),
        Arc::new(UnsupportedIntrospector),
    );
    let mut shells = HashMap::new();
    shells.insert(
        "default".to_string(),
        ShellConfig {
            command: Some(vec!["/nonexistent/rs_terminal_instance_shell".to_string()]),
            ..ShellConfig::default()
        },
    );
    let config = Arc::new(TerminalConfig {
        shells,
        ..TerminalConfig::default()
    });

    let mut first = service.create_process_manager("s1", config.clone()).unwrap();
    let second = service.create_process_manager("s2", config.clone()).unwrap();
    assert_eq!(first.session_id(), "s1");
    assert_eq!(second.session_id(), "s2");

    assert!(first.launch(None, None).await.is_err());
    assert_eq!(first.state(), ProcessState::KilledDuringLaunch);
    assert_eq!(second.state(), ProcessState::Uninitialized);
    assert!(second.shell_process_id().is_none());

    drop(first);
    assert_eq!(second.session_id(), "s2");
    assert!(std::ptr::eq(second.config(), config.as_ref()));
}

#[tokio::test]
async fn construction_error_leaves_engine_untouched() {
    let loader = CountingLoader::new(0);
    let service = service_with(
        loader.clone(),
        MemoryCatalog::new(),
        "en",
        ServiceCollection::new(),
        Arc::new(UnsupportedIntrospector),
    );
    let engine = service.acquire_engine().await.unwrap();

    let result = service.create_process_manager("s1", Arc::new(TerminalConfig::default()));
    assert!(matches!(result, Err(ConstructionError::MissingService { .. })));

    let again = service.acquire_engine().await.unwrap();
    assert!(again.ptr_eq(&engine));
    assert_eq!(loader.calls(), 1);
}

#[tokio::test]
async fn shell_monitor_absent_without_introspection() {
    let service = service_with(
        CountingLoader::new(0),
        MemoryCatalog::new(),
        "en",
        pty_services(),
        Arc::new(UnsupportedIntrospector),
    );

    assert!(service.create_shell_monitor(100, Arc::new(NullSession), view()).is_none());
    assert!(service.create_shell_monitor(100, Arc::new(NullSession), view()).is_none());
    assert!(service.create_process_manager("s1", Arc::new(TerminalConfig::default())).is_ok());
}

#[tokio::test]
async fn shell_monitor_is_independent_of_engine_load() {
    let loader = CountingLoader::new(0);
    let service = service_with(
        loader.clone(),
        MemoryCatalog::new(),
        "en",
        pty_services(),
        Arc::new(SupportedIntrospector),
    );

    let monitor = service
        .create_shell_monitor(100, Arc::new(NullSession), view())
        .unwrap();
    assert_eq!(monitor.shell_process_id(), 100);
    assert_eq!(monitor.check_shell().await.unwrap().as_deref(), Some("bash"));
    assert_eq!(loader.calls(), 0);
}
