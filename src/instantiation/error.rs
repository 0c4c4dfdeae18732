/// Error types for dependency resolution
use thiserror::Error;

/// Construction error returned when an instance cannot be built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// A declared dependency is not registered with the resolver
    #[error("{for_type} depends on {service}, which is not registered")]
    MissingService {
        service: &'static str,
        for_type: &'static str,
    },

    /// The construction arguments were rejected
    #[error("Invalid construction arguments: {0}")]
    Invalid(String),
}
