use std::path::PathBuf;

use wiring_di::DynError;

/// Errors when loading a container description or turning it into a builder
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse container description: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid container description: {}", display_list(.0))]
    Validation(Vec<ValidationError>),
    /// No factory is registered for the kind
    #[error("Entry '{entry}' has the unknown kind '{kind}'")]
    UnknownKind { entry: String, kind: String },
    /// The catalog could not create a factory from the entry
    #[error("Could not create the factory for '{entry}': {error}")]
    Factory { entry: String, error: DynError },
}

/// Problems found in an otherwise well formed description
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("entry #{0} has an empty name")]
    EmptyName(usize),
    #[error("entry '{0}' has an empty kind")]
    EmptyKind(String),
    #[error("entry '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("entry '{0}' lists an empty dependency name")]
    EmptyDependency(String),
}

/// Errors when trying to register a kind
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterKindError {
    /// The kind is already registered
    #[error("The kind '{0}' is already registered")]
    AlreadyRegistered(String),
}

fn display_list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
