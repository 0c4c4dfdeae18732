/// Terminal instance service
///
/// Lazily prepares the shared terminal-emulation engine and builds the
/// per-session shell monitor and process manager, so the session layer never
/// constructs platform objects itself.
pub mod config;
pub mod engine;
pub mod instantiation;
pub mod localization;
pub mod process;
pub mod service;
pub mod shell_monitor;

pub use engine::{EngineHandle, EngineLoadError, EngineLoader};
pub use instantiation::{ConstructionError, Resolver, ServiceCollection};
pub use service::{DefaultTerminalInstanceService, TerminalInstanceService};
