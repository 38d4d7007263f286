use std::sync::Arc;

use thiserror::Error;

use crate::{dependency_graph::DependencyGraphErrors, types::DynError};

#[derive(Error, Debug)]
pub enum InjectError {
    /// Could not require the entry
    #[error(transparent)]
    RequireError(#[from] RequireError),
    /// The entry was not listed as a dependency of the requester
    #[error("'{requester}' did not declare a dependency on '{requested}'")]
    Undeclared { requester: String, requested: String },
    /// Generic error during Injection
    #[error("Error during injection: {0}")]
    Other(DynError),
}

/// Errors when trying to require a certain entry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequireError {
    /// No entry with that name is registered
    #[error("No entry named '{0}' is registered.")]
    NotFound(String),
    /// The registry has been torn down
    #[error("The registry is closed, '{0}' can no longer be resolved.")]
    Closed(String),

    #[error("Failed to downcast '{name}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        name: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors while wiring the registry
#[derive(thiserror::Error, Debug, Clone)]
pub enum InitError {
    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraphError(#[from] DependencyGraphErrors),

    /// A Factory failed to build
    #[error("Factory for '{entry}' failed - error: {error}")]
    FactoryFailed { entry: String, error: Arc<DynError> },
    /// Wiring timed out
    #[error("Wiring timed out")]
    Timeout,
}

/// Errors when closing the registry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CloseError {
    #[error("The registry has already been closed")]
    AlreadyClosed,
}
