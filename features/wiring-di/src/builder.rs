use std::time::Duration;

use crate::{
    container::DiContainer,
    errors::InitError,
    factories::{DynFactory, InstanceFactory},
    initiator::DiInitiator,
    types::{Injectable, Instance, TypeInfo},
};

//////////////////////////////////////////////////////////////////////
///
/// Wiring consists of three parts.
/// 1. The DiBuilder where one registers all named factories and instances
/// 2. The DiInitiator which validates the graph and constructs every entry in dependency order
/// 3. The DiContainer holding the wired entries until it is closed
pub struct DiBuilder {
    /// Registered entries in registration order
    pub(crate) registered: Vec<RegisteredEntry>,
}
impl Default for DiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct RegisteredEntry {
    pub name: String,
    pub dependencies: Vec<String>,
    pub factory: EntrySource,
}

/// Where the instance of an entry comes from
pub(crate) enum EntrySource {
    Factory(Box<dyn DynFactory>),
    /// Already created, nothing to construct or tear down
    Provided(Instance),
}
impl EntrySource {
    pub fn supplies(&self) -> TypeInfo {
        match self {
            EntrySource::Factory(factory) => factory.supplies(),
            EntrySource::Provided(instance) => instance.info,
        }
    }
}

impl DiBuilder {
    pub fn new() -> Self {
        DiBuilder {
            registered: Vec::new(),
        }
    }
}
impl DiBuilder {
    /// Registers an already created instance under `name`
    pub fn add_instance<T: Injectable>(mut self, name: impl Into<String>, instance: T) -> Self {
        self.registered.push(RegisteredEntry {
            name: name.into(),
            dependencies: Vec::new(),
            factory: EntrySource::Provided(Instance::new(instance)),
        });
        self
    }

    /// Registers a factory under `name`, constructed after all `dependencies`
    pub fn add_factory<Factory: InstanceFactory + 'static>(
        self,
        name: impl Into<String>,
        dependencies: &[&str],
        factory: Factory,
    ) -> Self {
        let dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self.add_boxed_factory(name, dependencies, Box::new(factory))
    }

    /// Registers an already type erased factory
    pub fn add_boxed_factory(
        mut self,
        name: impl Into<String>,
        dependencies: Vec<String>,
        factory: Box<dyn DynFactory>,
    ) -> Self {
        self.registered.push(RegisteredEntry {
            name: name.into(),
            dependencies,
            factory: EntrySource::Factory(factory),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub async fn build(self) -> Result<DiContainer, InitError> {
        DiInitiator::new().initiate(self, None).await
    }

    pub async fn build_timeout(self, timeout: Duration) -> Result<DiContainer, InitError> {
        DiInitiator::new().initiate(self, Some(timeout)).await
    }
}
