/// Dependency resolution for session collaborators
mod error;
mod resolver;

pub use error::ConstructionError;
pub use resolver::{Injectable, Resolver, ServiceCollection};
