use std::{collections::BTreeMap, time::Duration};

use serde::Deserialize;

/// Description of a container: its settings and every entry to wire
///
/// ```toml
/// [container]
/// wire_timeout_ms = 5000
///
/// [[entry]]
/// name = "clock"
/// kind = "clock"
///
/// [[entry]]
/// name = "scheduler"
/// kind = "scheduler"
/// dependencies = ["clock"]
/// properties = { interval = "5s" }
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    #[serde(default)]
    pub container: ContainerSettings,
    #[serde(default, rename = "entry")]
    pub entries: Vec<EntryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerSettings {
    /// Upper bound for wiring all entries
    pub wire_timeout_ms: Option<u64>,
}

/// One named entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    pub name: String,
    /// Selects the factory in the catalog
    pub kind: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Free form settings handed to the factory
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ContainerConfig {
    pub fn wire_timeout(&self) -> Option<Duration> {
        self.container.wire_timeout_ms.map(Duration::from_millis)
    }

    pub fn entry(&self, name: &str) -> Option<&EntryConfig> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

impl EntryConfig {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
