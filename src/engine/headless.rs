/// Headless engine module used when no renderer is attached.
/// It records what was applied so the prepared state can be inspected.
use async_trait::async_trait;
use tracing::info;

use crate::engine::{AccessibilityStrings, Capability, EngineModule, ModuleError, ModuleLoader};

pub const HEADLESS_MODULE: &str = "headless";

#[derive(Debug, Default)]
pub struct HeadlessModule {
    addons: Vec<Capability>,
    strings: Option<AccessibilityStrings>,
}

impl HeadlessModule {
    pub fn addons(&self) -> &[Capability] {
        &self.addons
    }

    pub fn strings(&self) -> Option<&AccessibilityStrings> {
        self.strings.as_ref()
    }
}

impl EngineModule for HeadlessModule {
    fn name(&self) -> &str {
        HEADLESS_MODULE
    }

    fn apply_capability(&mut self, capability: Capability) -> Result<(), ModuleError> {
        if self.addons.contains(&capability) {
            return Err(ModuleError::Failed(format!(
                "addon {} already applied",
                capability
            )));
        }
        self.addons.push(capability);
        Ok(())
    }

    fn set_accessibility_strings(&mut self, strings: &AccessibilityStrings) {
        self.strings = Some(strings.clone());
    }
}

/// Loader that only knows the headless module
#[derive(Debug, Default)]
pub struct HeadlessModuleLoader;

#[async_trait]
impl ModuleLoader for HeadlessModuleLoader {
    async fn load(&self, name: &str) -> Result<Box<dyn EngineModule>, ModuleError> {
        if name != HEADLESS_MODULE {
            return Err(ModuleError::NotFound(name.to_string()));
        }
        info!("HeadlessModuleLoader: Loading {}", name);
        Ok(Box::new(HeadlessModule::default()))
    }
}
