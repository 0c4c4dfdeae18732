use std::io::Error as IoError;
use std::path::PathBuf;
/// Error types for configuration module
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a file referenced by the configuration
    #[error("Failed to open configuration file: {0}")]
    FileOpenError(#[from] IoError),

    /// Failed to read environment overrides
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] ::config::ConfigError),

    /// Failed to parse a TOML document
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to read the localization catalog file
    #[error("Failed to read localization catalog {path:?}: {source}")]
    CatalogRead { path: PathBuf, source: IoError },

    /// Failed to parse a localization catalog document
    #[error("Failed to parse localization catalog: {0}")]
    CatalogParse(toml::de::Error),

    /// Current directory could not be determined for the default path
    #[error("Default configuration path not available")]
    NoDefaultPath,

    /// Logging could not be installed
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
