use std::{collections::HashMap, pin::pin, sync::Arc, time::Duration};

use futures::FutureExt;

use crate::{
    builder::{DiBuilder, EntrySource, RegisteredEntry},
    container::{teardown_entries, DiContainer, WiredEntry},
    dependency_graph::DependencyGraph,
    errors::{InitError, InjectError, RequireError},
    timer::deadline,
    types::{Injectable, Instance},
};

/// Wires the DiContainer
pub(crate) struct DiInitiator {
    /// Entries constructed so far, in wiring order
    wired: Vec<WiredEntry>,
    /// Position of each wired entry in `wired`
    positions: HashMap<String, usize>,
}
impl DiInitiator {
    pub(crate) fn new() -> DiInitiator {
        DiInitiator {
            wired: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub async fn initiate(
        mut self,
        blueprint: DiBuilder,
        timeout: Option<Duration>,
    ) -> Result<DiContainer, InitError> {
        // Build and check Graph - nothing is constructed if it is broken
        let graph = DependencyGraph::new(&blueprint)?;

        let DiBuilder { registered } = blueprint;
        tracing::debug!("Wiring {} entries", registered.len());

        // Arena indices of the graph match registration order
        let mut pending: Vec<Option<RegisteredEntry>> = registered.into_iter().map(Some).collect();

        let result = match timeout {
            None => self.try_initiate(&mut pending, graph.order_indices()).await,
            Some(timeout) => {
                let mut timeout = deadline(timeout);
                let wiring = self.try_initiate(&mut pending, graph.order_indices()).fuse();
                let mut wiring = pin!(wiring);

                futures::select! {
                    result = wiring => result,
                    _ = timeout => Err(InitError::Timeout),
                }
            }
        };

        if let Err(e) = result {
            // Undo what has been wired so far, newest first
            tracing::warn!(
                "Wiring failed, tearing down {} wired entries: {e}",
                self.wired.len()
            );
            let report = teardown_entries(self.wired);
            for failure in &report.failures {
                tracing::warn!("Rollback of '{}' failed: {}", failure.name, failure.error);
            }
            return Err(e);
        }

        tracing::debug!("All {} entries wired", self.wired.len());
        Ok(DiContainer::new(self.wired, graph))
    }

    /// Constructs all pending entries in the given order
    async fn try_initiate(
        &mut self,
        pending: &mut [Option<RegisteredEntry>],
        order: &[usize],
    ) -> Result<(), InitError> {
        let entry_count = order.len();

        for index in order {
            let Some(RegisteredEntry {
                name,
                dependencies,
                factory,
            }) = pending[*index].take()
            else {
                continue;
            };

            let handle = self.get_handle(&name, &dependencies);
            let (instance, factory) = match factory {
                EntrySource::Provided(instance) => (instance, None),
                EntrySource::Factory(mut factory) => {
                    let constructed = Box::into_pin(factory.construct(handle)).await;
                    match constructed {
                        Ok(instance) => (instance, Some(factory)),
                        Err(error) => {
                            // If one factory fails - abort wiring
                            return Err(InitError::FactoryFailed {
                                entry: name,
                                error: Arc::new(error),
                            });
                        }
                    }
                }
            };

            tracing::debug!(
                "Wired '{name}' as {} [{} of {entry_count}]",
                instance.info.type_name,
                self.wired.len() + 1
            );
            self.positions.insert(name.clone(), self.wired.len());
            self.wired.push(WiredEntry {
                name,
                instance,
                factory,
            });
        }

        Ok(())
    }

    /// Get a handle exposing the already wired dependencies of `requester`
    fn get_handle(&self, requester: &str, dependencies: &[String]) -> DiHandle {
        let dependencies = dependencies
            .iter()
            .filter_map(|name| {
                let position = self.positions.get(name)?;
                Some((name.clone(), self.wired[*position].instance.clone()))
            })
            .collect();

        DiHandle {
            requester: requester.to_string(),
            dependencies: Arc::new(dependencies),
        }
    }
}

/// DI Handle for getting the declared dependencies of an entry while it is constructed.
/// The DI Handle only sees what the entry declared.
/// Afterwards the DI Container can be used directly for resolution.
#[derive(Clone, Debug)]
pub struct DiHandle {
    requester: String,
    /// Declared dependencies in declaration order
    dependencies: Arc<Vec<(String, Instance)>>,
}
impl DiHandle {
    /// Name of the entry being constructed
    pub fn requester(&self) -> &str {
        &self.requester
    }

    /// Type erased dependency
    pub fn instance(&self, name: &str) -> Result<Instance, InjectError> {
        self.dependencies
            .iter()
            .find(|(dependency, _)| dependency == name)
            .map(|(_, instance)| instance.clone())
            .ok_or_else(|| InjectError::Undeclared {
                requester: self.requester.clone(),
                requested: name.to_string(),
            })
    }

    /// Typed dependency
    pub fn require<T: Injectable>(&self, name: &str) -> Result<Arc<T>, InjectError> {
        let instance = self.instance(name)?;
        let downcasted = instance
            .downcast::<T>()
            .map_err(|actual_type| RequireError::DowncastFailed {
                name: name.to_string(),
                required_type: std::any::type_name::<T>(),
                actual_type,
            })?;

        Ok(downcasted)
    }

    /// All declared dependencies in declaration order
    pub fn dependencies(&self) -> impl Iterator<Item = (&str, &Instance)> + '_ {
        self.dependencies
            .iter()
            .map(|(name, instance)| (name.as_str(), instance))
    }
}
