/// Localization catalog lookup for engine accessibility strings
mod catalog;

pub use catalog::{LocalizationCatalog, MemoryCatalog, localize};
