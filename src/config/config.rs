/// Configuration data structures for rs_terminal_instance
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Terminal configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TerminalConfig {
    /// Default shell type, used when a session does not name one
    #[serde(default = "default_shell_type")]
    pub default_shell_type: String,

    /// Shell configurations including `default`
    #[serde(default)]
    pub shells: HashMap<String, ShellConfig>,

    /// Locale used to resolve accessibility strings (e.g. "en", "de")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Optional TOML message catalog
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Name of the emulation engine module handed to the module loader
    #[serde(default = "default_engine_module")]
    pub engine_module: String,

    /// Shell identity monitoring
    #[serde(default)]
    pub shell_monitor: ShellMonitorConfig,

    /// Logging output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Terminal size configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TerminalSize {
    /// Number of columns
    pub columns: u16,

    /// Number of rows
    pub rows: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { columns: 80, rows: 24 }
    }
}

/// Shell configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ShellConfig {
    /// Command to execute (optional, defaults to shells.default.command)
    pub command: Option<Vec<String>>,

    /// Working directory (optional, defaults to shells.default.working_directory)
    pub working_directory: Option<PathBuf>,

    /// Terminal size (optional, defaults to shells.default.size)
    pub size: Option<TerminalSize>,

    /// Environment variables (optional, merged over shells.default.environment)
    pub environment: Option<HashMap<String, String>>,
}

/// Shell monitor settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShellMonitorConfig {
    /// Quiet period after a line feed before the process tree is inspected
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ShellMonitorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Directory for daily rolling log files; stdout only when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            default_shell_type: default_shell_type(),
            shells: HashMap::new(),
            locale: default_locale(),
            catalog_path: None,
            engine_module: default_engine_module(),
            shell_monitor: ShellMonitorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_shell_type() -> String {
    "bash".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_engine_module() -> String {
    "headless".to_string()
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}
