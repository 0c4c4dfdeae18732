/// Capability catalog: the engine extensions and accessibility strings
/// applied once when the shared engine is prepared.
use std::fmt;

use crate::localization::{LocalizationCatalog, localize};

/// Engine-augmenting extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Buffer search
    Search,
    /// Hyperlink detection
    WebLinks,
    /// Line-ending / compatibility normalization for winpty-backed shells
    WinptyCompat,
}

/// Application order. Every prepared engine carries exactly this sequence.
pub const CAPABILITIES: [Capability; 3] = [
    Capability::Search,
    Capability::WebLinks,
    Capability::WinptyCompat,
];

impl Capability {
    /// Name of the addon inside the engine module
    pub fn addon_name(self) -> &'static str {
        match self {
            Capability::Search => "search",
            Capability::WebLinks => "webLinks",
            Capability::WinptyCompat => "winptyCompat",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.addon_name())
    }
}

/// Keys of the localized accessibility strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKey {
    BlankLine,
    PromptLabel,
    TooMuchOutput,
}

impl StringKey {
    pub const ALL: [StringKey; 3] = [
        StringKey::BlankLine,
        StringKey::PromptLabel,
        StringKey::TooMuchOutput,
    ];

    /// Message key looked up in the localization catalog
    pub fn message_key(self) -> &'static str {
        match self {
            StringKey::BlankLine => "terminal.integrated.a11yBlankLine",
            StringKey::PromptLabel => "terminal.integrated.a11yPromptLabel",
            StringKey::TooMuchOutput => "terminal.integrated.a11yTooMuchOutput",
        }
    }

    /// Source-language text used when the catalog has no entry
    pub fn default_text(self) -> &'static str {
        match self {
            StringKey::BlankLine => "Blank line",
            StringKey::PromptLabel => "Terminal input",
            StringKey::TooMuchOutput => {
                "Too much output to announce, navigate to rows manually to read"
            }
        }
    }
}

/// Accessibility strings attached to the engine. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibilityStrings {
    pub blank_line: String,
    pub prompt_label: String,
    pub too_much_output: String,
}

impl Default for AccessibilityStrings {
    fn default() -> Self {
        Self {
            blank_line: StringKey::BlankLine.default_text().to_string(),
            prompt_label: StringKey::PromptLabel.default_text().to_string(),
            too_much_output: StringKey::TooMuchOutput.default_text().to_string(),
        }
    }
}

impl AccessibilityStrings {
    /// Resolve all three strings for `locale`
    pub fn resolve(catalog: &dyn LocalizationCatalog, locale: &str) -> Self {
        let text = |key: StringKey| localize(catalog, locale, key.message_key(), key.default_text());
        Self {
            blank_line: text(StringKey::BlankLine),
            prompt_label: text(StringKey::PromptLabel),
            too_much_output: text(StringKey::TooMuchOutput),
        }
    }

    pub fn get(&self, key: StringKey) -> &str {
        match key {
            StringKey::BlankLine => &self.blank_line,
            StringKey::PromptLabel => &self.prompt_label,
            StringKey::TooMuchOutput => &self.too_much_output,
        }
    }
}
