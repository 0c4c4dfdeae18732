/// Error types for the engine module
use thiserror::Error;

use crate::engine::Capability;

/// Error reported by an engine module or its loader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// No module is known under the requested name
    #[error("Module not found: {0}")]
    NotFound(String),

    /// The module exists but could not be initialized
    #[error("Module failed: {0}")]
    Failed(String),
}

/// Engine acquisition error.
///
/// Cloned to every caller attached to the failed attempt.
#[derive(Error, Debug, Clone)]
pub enum EngineLoadError {
    /// The module loader could not produce the engine module
    #[error("Failed to load engine module {module}: {source}")]
    Module { module: String, source: ModuleError },

    /// A capability extension could not be applied
    #[error("Failed to apply capability {capability}: {source}")]
    Capability {
        capability: Capability,
        source: ModuleError,
    },

    /// The background load task panicked or was aborted
    #[error("Engine load task failed: {0}")]
    TaskFailed(String),
}
