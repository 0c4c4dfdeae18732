/// Lazy, single-flight loader for the shared terminal engine
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, error, info, warn};

use crate::config::TerminalConfig;
use crate::engine::{Engine, EngineHandle, EngineLoadError, ModuleLoader};
use crate::localization::LocalizationCatalog;

type LoadResult = Result<EngineHandle, EngineLoadError>;
type LoadFuture = Shared<BoxFuture<'static, LoadResult>>;

static GLOBAL_LOADER: OnceLock<EngineLoader> = OnceLock::new();

/// What to load and how to localize it
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub module_name: String,
    pub locale: String,
}

impl EngineOptions {
    pub fn from_config(config: &TerminalConfig) -> Self {
        Self {
            module_name: config.engine_module.clone(),
            locale: config.locale.clone(),
        }
    }
}

enum LoadState {
    Empty,
    Loading { attempt: u64, future: LoadFuture },
    Ready(EngineHandle),
}

struct Inner {
    state: Mutex<LoadState>,
    next_attempt: AtomicU64,
    module_loader: Arc<dyn ModuleLoader>,
    catalog: Arc<dyn LocalizationCatalog>,
    options: EngineOptions,
}

/// Engine loader.
///
/// The first `acquire` spawns the load; callers arriving while it runs await
/// the same shared result. Success is cached for the loader's lifetime.
/// Failure reaches every attached caller and leaves the loader empty, so the
/// next `acquire` starts over.
#[derive(Clone)]
pub struct EngineLoader {
    inner: Arc<Inner>,
}

impl EngineLoader {
    pub fn new(
        module_loader: Arc<dyn ModuleLoader>,
        catalog: Arc<dyn LocalizationCatalog>,
        options: EngineOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LoadState::Empty),
                next_attempt: AtomicU64::new(0),
                module_loader,
                catalog,
                options,
            }),
        }
    }

    /// Process-wide loader; `init` runs only for the first caller
    pub fn global_or_init(init: impl FnOnce() -> EngineLoader) -> EngineLoader {
        GLOBAL_LOADER.get_or_init(init).clone()
    }

    /// Get the prepared engine, loading it on first use
    pub async fn acquire(&self) -> LoadResult {
        let future = {
            let mut state = self.inner.lock_state();
            match &*state {
                LoadState::Ready(handle) => return Ok(handle.clone()),
                LoadState::Loading { attempt, future } => {
                    debug!("Attaching to in-flight engine load #{}", attempt);
                    future.clone()
                }
                LoadState::Empty => {
                    let attempt = self.inner.take_attempt();
                    let future = Inner::start_load(&self.inner, attempt);
                    *state = LoadState::Loading {
                        attempt,
                        future: future.clone(),
                    };
                    future
                }
            }
        };

        future.await
    }

    /// The cached engine, if a load has completed
    pub fn get(&self) -> Option<EngineHandle> {
        match &*self.inner.lock_state() {
            LoadState::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Whether a load is currently in flight
    pub fn is_loading(&self) -> bool {
        matches!(&*self.inner.lock_state(), LoadState::Loading { .. })
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attempt ids start at 1 and are never reused
    fn take_attempt(&self) -> u64 {
        self.next_attempt.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Spawn the load so it runs to completion even if every caller stops
    /// awaiting. Must be called with the state lock held: the task cannot
    /// publish its result before the `Loading` state is stored.
    fn start_load(inner: &Arc<Inner>, attempt: u64) -> LoadFuture {
        info!("Starting engine load #{}", attempt);

        let task_inner = inner.clone();
        let task = tokio::spawn(async move {
            let result = task_inner.load_engine().await;
            task_inner.finish(attempt, &result);
            result
        });

        let join_inner = inner.clone();
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Engine load #{} task failed: {}", attempt, e);
                    let result = Err(EngineLoadError::TaskFailed(e.to_string()));
                    join_inner.finish(attempt, &result);
                    result
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn load_engine(&self) -> LoadResult {
        let name = &self.options.module_name;
        let module = self
            .module_loader
            .load(name)
            .await
            .map_err(|source| EngineLoadError::Module {
                module: name.clone(),
                source,
            })?;

        let engine = Engine::prepare(module, self.catalog.as_ref(), &self.options.locale)?;
        Ok(EngineHandle::new(engine))
    }

    /// Publish the outcome of `attempt`, unless a newer state replaced it
    fn finish(&self, attempt: u64, result: &LoadResult) {
        let mut state = self.lock_state();
        let current = matches!(&*state, LoadState::Loading { attempt: a, .. } if *a == attempt);
        if !current {
            return;
        }

        match result {
            Ok(handle) => {
                info!("Engine load #{} complete", attempt);
                *state = LoadState::Ready(handle.clone());
            }
            Err(e) => {
                warn!("Engine load #{} failed, will retry on next acquire: {}", attempt, e);
                *state = LoadState::Empty;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        AccessibilityStrings, CAPABILITIES, Capability, EngineModule, HeadlessModuleLoader,
        ModuleError,
    };
    use crate::localization::MemoryCatalog;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn options() -> EngineOptions {
        EngineOptions {
            module_name: "headless".to_string(),
            locale: "en".to_string(),
        }
    }

    /// Loader that blocks until released and fails on the listed attempts
    struct GatedLoader {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
        gate: Notify,
    }

    impl GatedLoader {
        fn new(fail_on: Vec<usize>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_on,
                gate: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl ModuleLoader for GatedLoader {
        async fn load(&self, name: &str) -> Result<Box<dyn EngineModule>, ModuleError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.gate.notified().await;
            if self.fail_on.contains(&call) {
                return Err(ModuleError::Failed(format!("attempt {}", call)));
            }
            HeadlessModuleLoader.load(name).await
        }
    }

    fn loader_with(module_loader: Arc<dyn ModuleLoader>) -> EngineLoader {
        EngineLoader::new(module_loader, Arc::new(MemoryCatalog::new()), options())
    }

    async fn wait_until_loading(loader: &EngineLoader, calls: &AtomicUsize, expected: usize) {
        while calls.load(Ordering::SeqCst) < expected || !loader.is_loading() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn concurrent_acquires_share_one_load() {
        let gated = GatedLoader::new(vec![]);
        let loader = loader_with(gated.clone());

        let callers: Vec<_> = (0..3)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.acquire().await })
            })
            .collect();

        wait_until_loading(&loader, &gated.calls, 1).await;
        gated.gate.notify_one();

        let mut handles = Vec::new();
        for caller in callers {
            handles.push(caller.await.unwrap().unwrap());
        }

        assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| h.ptr_eq(&handles[0])));
        assert_eq!(handles[0].capabilities(), &CAPABILITIES);
    }

    #[tokio::test]
    async fn cached_handle_is_returned_without_reloading() {
        let gated = GatedLoader::new(vec![]);
        let loader = loader_with(gated.clone());
        assert!(loader.get().is_none());

        let first = tokio::spawn({
            let loader = loader.clone();
            async move { loader.acquire().await }
        });
        wait_until_loading(&loader, &gated.calls, 1).await;
        gated.gate.notify_one();
        let first = first.await.unwrap().unwrap();

        let second = loader.acquire().await.unwrap();
        assert!(first.ptr_eq(&second));
        assert!(loader.get().unwrap().ptr_eq(&first));
        assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_reaches_all_callers_and_is_retried() {
        let gated = GatedLoader::new(vec![1]);
        let loader = loader_with(gated.clone());

        let callers: Vec<_> = (0..2)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.acquire().await })
            })
            .collect();
        wait_until_loading(&loader, &gated.calls, 1).await;
        gated.gate.notify_one();

        for caller in callers {
            let err = caller.await.unwrap().unwrap_err();
            assert!(matches!(err, EngineLoadError::Module { .. }));
        }
        assert!(loader.get().is_none());
        assert!(!loader.is_loading());

        let retry = tokio::spawn({
            let loader = loader.clone();
            async move { loader.acquire().await }
        });
        wait_until_loading(&loader, &gated.calls, 2).await;
        gated.gate.notify_one();

        assert!(retry.await.unwrap().is_ok());
        assert_eq!(gated.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_completes_when_callers_stop_waiting() {
        let gated = GatedLoader::new(vec![]);
        let loader = loader_with(gated.clone());

        let abandoned = tokio::spawn({
            let loader = loader.clone();
            async move { loader.acquire().await }
        });
        wait_until_loading(&loader, &gated.calls, 1).await;
        abandoned.abort();
        let _ = abandoned.await;

        gated.gate.notify_one();
        while loader.get().is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn attempt_ids_increase() {
        let loader = loader_with(Arc::new(HeadlessModuleLoader));
        let ids: Vec<_> = (0..3).map(|_| loader.inner.take_attempt()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[derive(Debug, Default)]
    struct BrokenLinksModule;

    impl EngineModule for BrokenLinksModule {
        fn name(&self) -> &str {
            "broken"
        }

        fn apply_capability(&mut self, capability: Capability) -> Result<(), ModuleError> {
            match capability {
                Capability::WebLinks => Err(ModuleError::Failed("no link matcher".to_string())),
                _ => Ok(()),
            }
        }

        fn set_accessibility_strings(&mut self, _strings: &AccessibilityStrings) {}
    }

    struct BrokenLinksLoader;

    #[async_trait]
    impl ModuleLoader for BrokenLinksLoader {
        async fn load(&self, _name: &str) -> Result<Box<dyn EngineModule>, ModuleError> {
            Ok(Box::new(BrokenLinksModule))
        }
    }

    #[tokio::test]
    async fn capability_failure_is_a_load_error() {
        let loader = loader_with(Arc::new(BrokenLinksLoader));
        let err = loader.acquire().await.unwrap_err();
        assert!(matches!(
            err,
            EngineLoadError::Capability {
                capability: Capability::WebLinks,
                ..
            }
        ));
        assert!(loader.get().is_none());
    }
}
