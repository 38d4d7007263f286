use std::{any::type_name, future::Future};

use crate::{
    initiator::DiHandle,
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// A Factory providing instances of a given type
///
/// The factory stays owned by the registry after construction, so it can tear its instance down on close.
pub trait InstanceFactory: Send + Sync {
    type Provides: Injectable;

    /// Returns the typeinfo about the factory's provided type
    fn supplies() -> TypeInfo {
        TypeInfo::of::<Self::Provides>()
    }

    /// Constructs a new instance of the factory's provided type
    ///
    /// All declared dependencies are already wired and reachable through `di`.
    /// Returns the constructed instance, or an error if the Instantiation failed
    fn construct(
        &mut self,
        di: DiHandle,
    ) -> impl Future<Output = Result<Self::Provides, DynError>> + Send + '_;

    /// Cleans up the instance when the registry is closed
    fn teardown(&mut self, instance: &Self::Provides) -> Result<(), DynError> {
        let _ = instance;
        Ok(())
    }
}

/// Wrapper Trait for factories, providing instances of Any
pub trait DynFactory: Send {
    fn supplies(&self) -> TypeInfo;

    /// Constructs a new instance of the factory's provided type
    fn construct(
        &mut self,
        di: DiHandle,
    ) -> Box<dyn Future<Output = Result<Instance, DynError>> + Send + '_>;

    /// Runs the teardown hook for an instance this factory constructed
    fn teardown(&mut self, instance: &Instance) -> Result<(), DynError>;
}
// Impl DynFactory for any InstanceFactory
impl<T: Injectable, SpecificFactory: InstanceFactory<Provides = T>> DynFactory for SpecificFactory {
    fn supplies(&self) -> TypeInfo {
        <SpecificFactory as InstanceFactory>::supplies()
    }

    fn construct(
        &mut self,
        di: DiHandle,
    ) -> Box<dyn Future<Output = Result<Instance, DynError>> + Send + '_> {
        let construction_fut = async {
            // Forward the call to the specific implementation
            <SpecificFactory as InstanceFactory>::construct(self, di)
                .await
                .map(Instance::new)
        };

        Box::new(construction_fut)
    }

    fn teardown(&mut self, instance: &Instance) -> Result<(), DynError> {
        let instance = instance.downcast::<T>().map_err(|actual_type| {
            format!(
                "teardown expected '{}' but got '{actual_type}'",
                type_name::<T>()
            )
        })?;
        <SpecificFactory as InstanceFactory>::teardown(self, &instance)
    }
}

/// Factory built from closures
///
/// Handy when an entry needs no state of its own.
pub struct FnFactory<T, F> {
    construct: F,
    teardown: Option<Box<dyn FnMut(&T) -> Result<(), DynError> + Send + Sync>>,
}

/// Creates a factory from a construction closure
pub fn from_fn<T, F>(construct: F) -> FnFactory<T, F>
where
    T: Injectable,
    F: FnMut(&DiHandle) -> Result<T, DynError> + Send + Sync,
{
    FnFactory {
        construct,
        teardown: None,
    }
}

impl<T, F> FnFactory<T, F> {
    /// Adds a teardown hook, run once when the registry closes
    pub fn with_teardown(
        mut self,
        teardown: impl FnMut(&T) -> Result<(), DynError> + Send + Sync + 'static,
    ) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }
}

impl<T, F> InstanceFactory for FnFactory<T, F>
where
    T: Injectable,
    F: FnMut(&DiHandle) -> Result<T, DynError> + Send + Sync,
{
    type Provides = T;

    fn construct(
        &mut self,
        di: DiHandle,
    ) -> impl Future<Output = Result<Self::Provides, DynError>> + Send + '_ {
        let result = (self.construct)(&di);
        async move { result }
    }

    fn teardown(&mut self, instance: &Self::Provides) -> Result<(), DynError> {
        match self.teardown.as_mut() {
            Some(hook) => hook(instance),
            None => Ok(()),
        }
    }
}
