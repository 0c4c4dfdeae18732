/// Terminal-emulation engine acquisition
///
/// The shared engine is loaded once per process, extended with the
/// capability catalog and localized before any caller can see it.
mod capability;
mod engine;
mod error;
mod headless;
mod loader;

pub use capability::{AccessibilityStrings, CAPABILITIES, Capability, StringKey};
pub use engine::{Engine, EngineHandle, EngineModule, ModuleLoader};
pub use error::{EngineLoadError, ModuleError};
pub use headless::{HEADLESS_MODULE, HeadlessModule, HeadlessModuleLoader};
pub use loader::{EngineLoader, EngineOptions};
