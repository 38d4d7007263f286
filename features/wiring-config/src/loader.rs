//! Loading container descriptions from disk.

use std::{collections::HashSet, fs, path::Path, str::FromStr};

use crate::{
    errors::{ConfigError, ValidationError},
    schema::ContainerConfig,
};

/// Load and validate a container description from a TOML file.
pub fn load_config(path: &Path) -> Result<ContainerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = content.parse::<ContainerConfig>()?;

    tracing::debug!(
        "Loaded {} entries from '{}'",
        config.entries.len(),
        path.display()
    );
    Ok(config)
}

impl FromStr for ContainerConfig {
    type Err = ConfigError;

    /// Parses and validates a description
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: ContainerConfig = toml::from_str(content)?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Checks what the TOML schema alone can't express
///
/// Returns every problem found, not just the first one.
pub fn validate_config(config: &ContainerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (position, entry) in config.entries.iter().enumerate() {
        if entry.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(position));
            continue;
        }
        if !seen.insert(entry.name.as_str()) {
            errors.push(ValidationError::DuplicateName(entry.name.clone()));
        }
        if entry.kind.trim().is_empty() {
            errors.push(ValidationError::EmptyKind(entry.name.clone()));
        }
        if entry.dependencies.iter().any(|d| d.trim().is_empty()) {
            errors.push(ValidationError::EmptyDependency(entry.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
