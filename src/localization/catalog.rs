use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::config::ConfigError;

/// Locale-keyed message lookup
pub trait LocalizationCatalog: Send + Sync {
    /// Look up `key` for exactly `locale`
    fn lookup(&self, locale: &str, key: &str) -> Option<String>;
}

/// Resolve `key` for `locale`, trying the base language of a regional
/// locale ("de-CH" → "de") before falling back to `default`.
/// Empty entries count as missing.
pub fn localize(catalog: &dyn LocalizationCatalog, locale: &str, key: &str, default: &str) -> String {
    let locale = locale.to_ascii_lowercase();
    let base = locale.split(['-', '_']).next().unwrap_or(&locale);

    let found = catalog
        .lookup(&locale, key)
        .filter(|text| !text.is_empty())
        .or_else(|| {
            if base == locale {
                None
            } else {
                catalog.lookup(base, key).filter(|text| !text.is_empty())
            }
        });

    match found {
        Some(text) => text,
        None => {
            debug!("No '{}' entry for key {}, using default", locale, key);
            default.to_string()
        }
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    messages: HashMap<String, HashMap<String, String>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: &str, key: &str, text: &str) {
        self.messages
            .entry(locale.to_ascii_lowercase())
            .or_default()
            .insert(key.to_string(), text.to_string());
    }

    /// Parse a TOML catalog: one table per locale, message keys quoted.
    ///
    /// ```toml
    /// [de]
    /// "terminal.integrated.a11yBlankLine" = "Leerzeile"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let tables: HashMap<String, HashMap<String, String>> =
            toml::from_str(content).map_err(ConfigError::CatalogParse)?;
        let messages = tables
            .into_iter()
            .map(|(locale, entries)| (locale.to_ascii_lowercase(), entries))
            .collect();
        Ok(Self { messages })
    }

    /// Load a TOML catalog from disk
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading localization catalog from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

impl LocalizationCatalog for MemoryCatalog {
    fn lookup(&self, locale: &str, key: &str) -> Option<String> {
        self.messages.get(locale)?.get(key).cloned()
    }
}
