/// Shell identity monitor for one terminal session
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::shell_monitor::{IntrospectionError, ProcessIntrospector};

/// Receives shell identity changes; implemented by the owning session
pub trait ShellObserver: Send + Sync {
    fn shell_changed(&self, shell_name: &str);
}

/// The terminal view the monitor listens to
pub trait TerminalView: Send + Sync {
    /// Fires whenever the view processes a line feed
    fn subscribe_line_feeds(&self) -> broadcast::Receiver<()>;
}

struct MonitorInner {
    shell_process_id: u32,
    observer: Arc<dyn ShellObserver>,
    introspector: Arc<dyn ProcessIntrospector>,
    current: Mutex<Option<String>>,
}

/// Watches a shell process for command-interpreter switches.
///
/// Owned by its session. Dropping the monitor stops any running watch.
pub struct ShellMonitor {
    inner: Arc<MonitorInner>,
    view: Arc<dyn TerminalView>,
    debounce: Duration,
    watch: Option<JoinHandle<()>>,
}

impl ShellMonitor {
    pub fn new(
        shell_process_id: u32,
        observer: Arc<dyn ShellObserver>,
        view: Arc<dyn TerminalView>,
        introspector: Arc<dyn ProcessIntrospector>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                shell_process_id,
                observer,
                introspector,
                current: Mutex::new(None),
            }),
            view,
            debounce,
            watch: None,
        }
    }

    pub fn shell_process_id(&self) -> u32 {
        self.inner.shell_process_id
    }

    /// Last reported shell name
    pub fn shell_name(&self) -> Option<String> {
        self.inner.current_name()
    }

    /// Inspect the process tree now, notifying the observer on change
    pub async fn check_shell(&self) -> Result<Option<String>, IntrospectionError> {
        self.inner.check_shell().await
    }

    pub fn is_watching(&self) -> bool {
        self.watch.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Re-check after every burst of line feeds. Runs until the view closes
    /// its channel or the monitor is dropped. Must be called within a tokio
    /// runtime.
    pub fn start(&mut self) {
        if self.is_watching() {
            return;
        }

        let inner = self.inner.clone();
        let mut line_feeds = self.view.subscribe_line_feeds();
        let debounce = self.debounce;

        info!("Watching shell process {}", inner.shell_process_id);
        self.watch = Some(tokio::spawn(async move {
            if let Err(e) = inner.check_shell().await {
                warn!("Shell check for {} failed: {}", inner.shell_process_id, e);
            }

            loop {
                match line_feeds.recv().await {
                    Ok(()) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }

                tokio::time::sleep(debounce).await;
                loop {
                    match line_feeds.try_recv() {
                        Ok(()) | Err(TryRecvError::Lagged(_)) => continue,
                        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                    }
                }

                if let Err(e) = inner.check_shell().await {
                    warn!("Shell check for {} failed: {}", inner.shell_process_id, e);
                }
            }

            debug!("Line feed channel closed for shell {}", inner.shell_process_id);
        }));
    }

    /// Stop watching; the monitor stays usable for `check_shell`
    pub fn stop(&mut self) {
        if let Some(task) = self.watch.take() {
            task.abort();
        }
    }
}

impl Drop for ShellMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MonitorInner {
    fn current_name(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn check_shell(&self) -> Result<Option<String>, IntrospectionError> {
        let Some(name) = self
            .introspector
            .foreground_process_name(self.shell_process_id)
            .await?
        else {
            return Ok(self.current_name());
        };

        let changed = {
            let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if current.as_deref() == Some(name.as_str()) {
                false
            } else {
                *current = Some(name.clone());
                true
            }
        };

        if changed {
            info!("Shell {} is now {}", self.shell_process_id, name);
            self.observer.shell_changed(&name);
        }
        Ok(Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        names: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn names(&self) -> Vec<String> {
            self.names.lock().unwrap().clone()
        }
    }

    impl ShellObserver for Recorder {
        fn shell_changed(&self, shell_name: &str) {
            self.names.lock().unwrap().push(shell_name.to_string());
        }
    }

    struct View {
        line_feeds: broadcast::Sender<()>,
    }

    impl TerminalView for View {
        fn subscribe_line_feeds(&self) -> broadcast::Receiver<()> {
            self.line_feeds.subscribe()
        }
    }

    #[derive(Default)]
    struct ScriptedIntrospector {
        name: Mutex<Option<String>>,
        checks: AtomicUsize,
    }

    impl ScriptedIntrospector {
        fn set(&self, name: &str) {
            *self.name.lock().unwrap() = Some(name.to_string());
        }

        fn checks(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProcessIntrospector for ScriptedIntrospector {
        fn is_supported(&self) -> bool {
            true
        }

        async fn foreground_process_name(&self, _pid: u32) -> Result<Option<String>, IntrospectionError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            Ok(self.name.lock().unwrap().clone())
        }
    }

    fn monitor(
        recorder: Arc<Recorder>,
        introspector: Arc<ScriptedIntrospector>,
    ) -> (ShellMonitor, broadcast::Sender<()>) {
        monitor_with_debounce(recorder, introspector, Duration::from_millis(1))
    }

    fn monitor_with_debounce(
        recorder: Arc<Recorder>,
        introspector: Arc<ScriptedIntrospector>,
        debounce: Duration,
    ) -> (ShellMonitor, broadcast::Sender<()>) {
        let (line_feeds, _) = broadcast::channel(16);
        let view = Arc::new(View {
            line_feeds: line_feeds.clone(),
        });
        let monitor = ShellMonitor::new(7, recorder, view, introspector, debounce);
        (monitor, line_feeds)
    }

    #[tokio::test]
    async fn reports_only_changes() {
        let recorder = Arc::new(Recorder::default());
        let introspector = Arc::new(ScriptedIntrospector::default());
        let (monitor, _line_feeds) = monitor(recorder.clone(), introspector.clone());

        assert_eq!(monitor.check_shell().await.unwrap(), None);

        introspector.set("bash");
        monitor.check_shell().await.unwrap();
        monitor.check_shell().await.unwrap();
        introspector.set("python3");
        assert_eq!(monitor.check_shell().await.unwrap().as_deref(), Some("python3"));

        assert_eq!(recorder.names(), vec!["bash", "python3"]);
        assert_eq!(monitor.shell_name().as_deref(), Some("python3"));
    }

    #[tokio::test]
    async fn line_feed_triggers_recheck() {
        let recorder = Arc::new(Recorder::default());
        let introspector = Arc::new(ScriptedIntrospector::default());
        introspector.set("bash");
        let (mut monitor, line_feeds) = monitor(recorder.clone(), introspector.clone());

        monitor.start();
        assert!(monitor.is_watching());

        tokio::time::timeout(Duration::from_secs(5), async {
            while recorder.names().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        introspector.set("fish");
        line_feeds.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while recorder.names().len() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(recorder.names(), vec!["bash", "fish"]);
        drop(monitor);
        tokio::time::timeout(Duration::from_secs(5), async {
            while line_feeds.receiver_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_line_feeds_is_checked_once_after_debounce() {
        let recorder = Arc::new(Recorder::default());
        let introspector = Arc::new(ScriptedIntrospector::default());
        introspector.set("bash");
        let (mut monitor, line_feeds) = monitor_with_debounce(
            recorder.clone(),
            introspector.clone(),
            Duration::from_millis(100),
        );

        monitor.start();
        while introspector.checks() < 1 {
            tokio::task::yield_now().await;
        }

        for _ in 0..3 {
            line_feeds.send(()).unwrap();
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(introspector.checks(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(introspector.checks(), 2);
        assert_eq!(recorder.names(), vec!["bash"]);
    }
}
