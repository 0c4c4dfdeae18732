/// Configuration file loader for rs_terminal_instance
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ::config::{Config, Environment};
use tracing::info;

use crate::config::{ConfigError, TerminalConfig};

/// Prefix for environment overrides, e.g. `TERMINAL_LOCALE=de` or
/// `TERMINAL_SHELL_MONITOR__DEBOUNCE_MS=250`
const ENV_PREFIX: &str = "TERMINAL";

/// Configuration loader responsible for loading and parsing configuration files
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file, then apply environment overrides.
    /// A missing file is not an error; every field has a default.
    pub fn load_config(&self, config_path: Option<&Path>) -> Result<TerminalConfig, ConfigError> {
        let config_file_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_path()?;
                info!("Using default configuration file path: {:?}", path);
                path
            }
        };

        let mut config = self.load_config_from_file(&config_file_path)?;
        self.apply_overrides(&mut config, default_environment())?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    fn load_config_from_file(&self, path: &Path) -> Result<TerminalConfig, ConfigError> {
        info!("Loading configuration from file: {:?}", path);

        match std::fs::read_to_string(path) {
            Ok(contents) => self.parse_config(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Configuration file not found, using defaults");
                Ok(TerminalConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse configuration from string content
    pub fn parse_config(&self, content: &str) -> Result<TerminalConfig, ConfigError> {
        let config = toml::from_str::<TerminalConfig>(content)?;
        info!("Configuration parsed successfully");
        Ok(config)
    }

    /// Apply scalar overrides from `environment` on top of `config`.
    /// Shell tables are file-only.
    pub fn apply_overrides(
        &self,
        config: &mut TerminalConfig,
        environment: Environment,
    ) -> Result<(), ConfigError> {
        let overrides = Config::builder().add_source(environment).build()?;

        if let Ok(value) = overrides.get_string("default_shell_type") {
            config.default_shell_type = value;
        }
        if let Ok(value) = overrides.get_string("locale") {
            config.locale = value;
        }
        if let Ok(value) = overrides.get_string("catalog_path") {
            config.catalog_path = Some(PathBuf::from(value));
        }
        if let Ok(value) = overrides.get_string("engine_module") {
            config.engine_module = value;
        }
        if let Ok(value) = overrides.get::<u64>("shell_monitor.debounce_ms") {
            config.shell_monitor.debounce_ms = value;
        }
        if let Ok(value) = overrides.get_string("logging.level") {
            config.logging.level = value;
        }
        if let Ok(value) = overrides.get_bool("logging.json") {
            config.logging.json = value;
        }
        if let Ok(value) = overrides.get_string("logging.directory") {
            config.logging.directory = Some(PathBuf::from(value));
        }

        Ok(())
    }
}

fn default_environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Default configuration path: `config.toml` in the working directory
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    std::env::current_dir()
        .map(|dir| dir.join("config.toml"))
        .map_err(|_| ConfigError::NoDefaultPath)
}
