use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::engine::{AccessibilityStrings, CAPABILITIES, Capability, EngineLoadError, ModuleError};
use crate::localization::LocalizationCatalog;

// ================ 外部协作者接口 ================

/// A loaded terminal-emulation engine module.
///
/// Rendering and parsing live behind this trait; this crate only prepares it.
pub trait EngineModule: Send + Sync + Debug {
    /// Module name, as passed to the loader
    fn name(&self) -> &str;

    /// Enable one addon
    fn apply_capability(&mut self, capability: Capability) -> Result<(), ModuleError>;

    /// Attach the localized accessibility strings
    fn set_accessibility_strings(&mut self, strings: &AccessibilityStrings);
}

/// Asynchronous engine module loader
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, name: &str) -> Result<Box<dyn EngineModule>, ModuleError>;
}

// ================ 引擎 ================

/// Fully prepared engine: every capability applied, strings attached
#[derive(Debug)]
pub struct Engine {
    module: Box<dyn EngineModule>,
    capabilities: Vec<Capability>,
    strings: AccessibilityStrings,
}

impl Engine {
    /// Apply the capability catalog in order, then the localized strings.
    /// Nothing escapes on failure, so a partially prepared module is dropped.
    pub(crate) fn prepare(
        mut module: Box<dyn EngineModule>,
        catalog: &dyn LocalizationCatalog,
        locale: &str,
    ) -> Result<Self, EngineLoadError> {
        let mut capabilities = Vec::with_capacity(CAPABILITIES.len());
        for capability in CAPABILITIES {
            module
                .apply_capability(capability)
                .map_err(|source| EngineLoadError::Capability { capability, source })?;
            debug!("Applied capability {} to engine {}", capability, module.name());
            capabilities.push(capability);
        }

        let strings = AccessibilityStrings::resolve(catalog, locale);
        module.set_accessibility_strings(&strings);
        info!(
            "Engine {} prepared with {} capabilities (locale: {})",
            module.name(),
            capabilities.len(),
            locale
        );

        Ok(Self {
            module,
            capabilities,
            strings,
        })
    }

    pub fn module(&self) -> &dyn EngineModule {
        self.module.as_ref()
    }

    /// Applied capabilities, in application order
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn strings(&self) -> &AccessibilityStrings {
        &self.strings
    }
}

/// Shared handle to the process-wide engine
#[derive(Debug, Clone)]
pub struct EngineHandle(Arc<Engine>);

impl EngineHandle {
    pub(crate) fn new(engine: Engine) -> Self {
        Self(Arc::new(engine))
    }

    /// Whether both handles point at the same engine
    pub fn ptr_eq(&self, other: &EngineHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for EngineHandle {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.0
    }
}
