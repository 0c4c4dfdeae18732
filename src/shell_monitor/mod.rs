/// Shell identity monitoring for terminal sessions
mod introspection;
mod monitor;

#[cfg(target_os = "linux")]
pub use introspection::ProcfsIntrospector;
pub use introspection::{
    IntrospectionError, ProcessIntrospector, UnsupportedIntrospector, platform_introspector,
};
pub use monitor::{ShellMonitor, ShellObserver, TerminalView};
