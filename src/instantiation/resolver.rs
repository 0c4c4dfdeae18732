use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use crate::instantiation::ConstructionError;

/// Dependency-resolution facility.
///
/// Services are registered and looked up by their service type `S`, which is
/// usually a trait object (`dyn PtyFactory`). The erased value is an `Arc<S>`.
pub trait Resolver: Send + Sync {
    fn resolve_erased(&self, service: TypeId) -> Option<&(dyn Any + Send + Sync)>;
}

/// A type the resolver can build: it receives call-site arguments and pulls
/// its remaining collaborators from the resolver.
pub trait Injectable: Sized {
    type Args;

    fn construct(resolver: &dyn Resolver, args: Self::Args) -> Result<Self, ConstructionError>;
}

impl<'a> dyn Resolver + 'a {
    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        self.resolve_erased(TypeId::of::<S>())?
            .downcast_ref::<Arc<S>>()
            .cloned()
    }

    /// Resolve a dependency declared by `for_type`
    pub fn require<S: ?Sized + Send + Sync + 'static>(
        &self,
        for_type: &'static str,
    ) -> Result<Arc<S>, ConstructionError> {
        self.resolve::<S>().ok_or_else(|| {
            error!("Cannot construct {}: missing {}", for_type, type_name::<S>());
            ConstructionError::MissingService {
                service: type_name::<S>(),
                for_type,
            }
        })
    }

    /// Construct a new `T`. Nothing is cached; each call builds a fresh instance.
    pub fn create_instance<T: Injectable>(&self, args: T::Args) -> Result<T, ConstructionError> {
        debug!("Creating instance of {}", type_name::<T>());
        T::construct(self, args)
    }
}

/// Registry-backed resolver
#[derive(Default)]
pub struct ServiceCollection {
    services: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service` as the implementation of `S`, replacing any previous one
    pub fn register<S: ?Sized + Send + Sync + 'static>(&mut self, service: Arc<S>) -> &mut Self {
        debug!("Registering service {}", type_name::<S>());
        self.services.insert(TypeId::of::<S>(), Box::new(service));
        self
    }

    pub fn with<S: ?Sized + Send + Sync + 'static>(mut self, service: Arc<S>) -> Self {
        self.register(service);
        self
    }

    pub fn contains<S: ?Sized + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<S>())
    }
}

impl Resolver for ServiceCollection {
    fn resolve_erased(&self, service: TypeId) -> Option<&(dyn Any + Send + Sync)> {
        self.services.get(&service).map(|boxed| boxed.as_ref())
    }
}
