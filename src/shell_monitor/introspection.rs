use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed process table entry: {0}")]
    Malformed(String),
}

/// Platform process-tree introspection
#[async_trait]
pub trait ProcessIntrospector: Send + Sync {
    /// Probe whether this platform can inspect process trees
    fn is_supported(&self) -> bool;

    /// Name of the most recently spawned descendant of `pid`, or `pid`
    /// itself when it has no children. `None` when `pid` no longer exists.
    async fn foreground_process_name(&self, pid: u32) -> Result<Option<String>, IntrospectionError>;
}

/// Introspector for platforms without process-tree support
#[derive(Debug, Default)]
pub struct UnsupportedIntrospector;

#[async_trait]
impl ProcessIntrospector for UnsupportedIntrospector {
    fn is_supported(&self) -> bool {
        false
    }

    async fn foreground_process_name(&self, _pid: u32) -> Result<Option<String>, IntrospectionError> {
        Ok(None)
    }
}

/// The introspector for the current platform
pub fn platform_introspector() -> Arc<dyn ProcessIntrospector> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(procfs::ProcfsIntrospector::default())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(UnsupportedIntrospector)
    }
}

#[cfg(target_os = "linux")]
pub use procfs::ProcfsIntrospector;

#[cfg(target_os = "linux")]
mod procfs {
    use std::io::ErrorKind;
    use std::path::Path;

    use async_trait::async_trait;
    use tracing::debug;

    use super::{IntrospectionError, ProcessIntrospector};

    /// Bound on the descendant walk
    const MAX_DEPTH: usize = 32;

    /// `/proc`-based introspector.
    /// Needs `/proc/<pid>/task/<tid>/children` (CONFIG_PROC_CHILDREN).
    #[derive(Debug, Default)]
    pub struct ProcfsIntrospector;

    async fn read_optional(path: &str) -> Result<Option<String>, IntrospectionError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn last_child(pid: u32) -> Result<Option<u32>, IntrospectionError> {
        let Some(children) = read_optional(&format!("/proc/{pid}/task/{pid}/children")).await? else {
            return Ok(None);
        };
        match children.split_whitespace().last() {
            Some(child) => child
                .parse()
                .map(Some)
                .map_err(|_| IntrospectionError::Malformed(child.to_string())),
            None => Ok(None),
        }
    }

    #[async_trait]
    impl ProcessIntrospector for ProcfsIntrospector {
        fn is_supported(&self) -> bool {
            let pid = std::process::id();
            Path::new(&format!("/proc/{pid}/task/{pid}/children")).exists()
        }

        async fn foreground_process_name(&self, pid: u32) -> Result<Option<String>, IntrospectionError> {
            let mut current = pid;
            for _ in 0..MAX_DEPTH {
                match last_child(current).await? {
                    Some(child) => current = child,
                    None => break,
                }
            }

            let name = read_optional(&format!("/proc/{current}/comm"))
                .await?
                .map(|comm| comm.trim_end().to_string());
            debug!("Foreground process of {} is {} ({:?})", pid, current, name);
            Ok(name)
        }
    }
}
