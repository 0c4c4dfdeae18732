/// Service boundary between the session layer and the engine/platform layer.
/// Sessions depend on [`TerminalInstanceService`] only.
mod collaborator_factory;
mod error;
mod instance_service;

pub use collaborator_factory::SessionCollaboratorFactory;
pub use error::ServiceError;
pub use instance_service::{DefaultTerminalInstanceService, TerminalInstanceService};
