use std::{
    any::type_name,
    collections::HashMap,
    fmt::Debug,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    dependency_graph::DependencyGraph,
    errors::{CloseError, RequireError},
    factories::DynFactory,
    latch::OneShotLatch,
    types::{DynError, Injectable, Instance},
};

/// Container holding all wired entries
///
/// Cheap to clone - all clones share the same entries and the same closed state.
#[derive(Clone)]
pub struct DiContainer(Arc<DiContainerInner>);
struct DiContainerInner {
    state: Mutex<RegistryState>,
    graph: DependencyGraph,
    /// Latched by whichever close performed the teardown
    torn_down: OneShotLatch<TeardownReport>,
}

enum RegistryState {
    Active {
        /// Wiring order
        entries: Vec<WiredEntry>,
        positions: HashMap<String, usize>,
    },
    /// Teardown hooks are running
    Closing,
    Closed,
}

/// A constructed entry and the factory which tears it down
pub(crate) struct WiredEntry {
    pub name: String,
    pub instance: Instance,
    /// None for instances which were registered already built
    pub factory: Option<Box<dyn DynFactory>>,
}

impl Debug for DiContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        let mut map = f.debug_struct("DiContainer");
        match &*state {
            RegistryState::Active { entries, .. } => {
                for entry in entries {
                    map.field(&entry.name, &entry.instance.info.type_name);
                }
            }
            RegistryState::Closing => {
                map.field("state", &"closing");
            }
            RegistryState::Closed => {
                map.field("state", &"closed");
            }
        }
        map.finish()
    }
}

impl DiContainer {
    pub(crate) fn new(entries: Vec<WiredEntry>, graph: DependencyGraph) -> Self {
        let positions = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.name.clone(), position))
            .collect();

        Self(Arc::new(DiContainerInner {
            state: Mutex::new(RegistryState::Active { entries, positions }),
            graph,
            torn_down: OneShotLatch::new(),
        }))
    }

    /// Looks up a wired entry by name
    pub fn resolve(&self, name: &str) -> Result<Instance, RequireError> {
        match &*self.lock_state() {
            RegistryState::Active { entries, positions } => positions
                .get(name)
                .map(|position| entries[*position].instance.clone())
                .ok_or_else(|| RequireError::NotFound(name.to_string())),
            RegistryState::Closing | RegistryState::Closed => {
                Err(RequireError::Closed(name.to_string()))
            }
        }
    }

    /// Attempts to get the named entry as the requested type
    pub fn require<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        self.resolve(name)?
            .downcast()
            .map_err(|actual_type| RequireError::DowncastFailed {
                name: name.to_string(),
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// False as soon as closing has begun
    pub fn is_active(&self) -> bool {
        matches!(&*self.lock_state(), RegistryState::Active { .. })
    }

    /// Names of all entries in wiring order
    pub fn names(&self) -> Vec<String> {
        self.0.graph.order().map(str::to_string).collect()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.0.graph
    }

    /// Runs every teardown hook in reverse wiring order and marks the registry closed
    ///
    /// A failing hook does not stop the remaining ones, failures are collected in the report.
    /// Only the first call tears down, every later call gets [CloseError::AlreadyClosed].
    /// Use [DiContainer::await_teardown] to wait for the first call to finish.
    pub fn close(&self) -> Result<TeardownReport, CloseError> {
        let entries = {
            let mut state = self.lock_state();
            match std::mem::replace(&mut *state, RegistryState::Closing) {
                RegistryState::Active { entries, .. } => entries,
                previous => {
                    *state = previous;
                    return Err(CloseError::AlreadyClosed);
                }
            }
        };

        // Hooks run without holding the lock - resolution fails with Closed meanwhile
        tracing::debug!("Closing registry with {} entries", entries.len());
        let report = teardown_entries(entries);
        for failure in &report.failures {
            tracing::warn!("Teardown of '{}' failed: {}", failure.name, failure.error);
        }

        *self.lock_state() = RegistryState::Closed;
        self.0.torn_down.signal(report.clone());
        tracing::debug!("Registry closed");
        Ok(report)
    }

    /// Blocks until the registry has been torn down and returns the report of that teardown
    ///
    /// Returns immediately if the teardown already finished.
    pub fn await_teardown(&self) -> TeardownReport {
        // The sender is owned by this container, so the wait can't be canceled
        self.0.torn_down.wait_blocking().unwrap_or_default()
    }

    /// True once a close has finished tearing the registry down
    pub fn is_torn_down(&self) -> bool {
        self.0.torn_down.is_signaled()
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.0.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tears entries down newest first
pub(crate) fn teardown_entries(entries: Vec<WiredEntry>) -> TeardownReport {
    let mut report = TeardownReport::default();

    for entry in entries.into_iter().rev() {
        let WiredEntry {
            name,
            instance,
            factory,
        } = entry;

        // A panicking hook counts as a failed teardown
        let result = match factory {
            Some(mut factory) => catch_unwind(AssertUnwindSafe(|| factory.teardown(&instance)))
                .unwrap_or_else(|_| Err(format!("teardown of '{name}' panicked").into())),
            None => Ok(()),
        };

        match result {
            Ok(()) => {
                tracing::debug!("Tore down '{name}'");
                report.torn_down.push(name);
            }
            Err(error) => report.failures.push(TeardownFailure {
                name,
                error: Arc::new(error),
            }),
        }
    }

    report
}

/// Outcome of tearing the registry down
#[derive(Debug, Clone, Default)]
pub struct TeardownReport {
    /// Entries whose hook succeeded, in teardown order
    pub torn_down: Vec<String>,
    pub failures: Vec<TeardownFailure>,
}
impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TeardownFailure {
    pub name: String,
    pub error: Arc<DynError>,
}
