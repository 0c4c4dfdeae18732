/// Error types for the service layer
use thiserror::Error;

/// Service layer error type, for callers that drive a whole session
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Engine could not be acquired
    #[error("Engine error: {0}")]
    Engine(#[from] crate::engine::EngineLoadError),

    /// Session collaborator could not be constructed
    #[error("Construction error: {0}")]
    Construction(#[from] crate::instantiation::ConstructionError),

    /// Process management error
    #[error("Process error: {0}")]
    Process(#[from] crate::process::ProcessError),

    /// Shell introspection error
    #[error("Introspection error: {0}")]
    Introspection(#[from] crate::shell_monitor::IntrospectionError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
