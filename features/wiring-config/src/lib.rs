//! Wiring Config turns a TOML container description into a builder ready to be wired.
//!
//! Wiring Config is split into two major parts:
//! 1. ContainerConfig: The description of every named entry, loaded and validated from TOML
//! 2. FactoryCatalog: The kinds known in code, mapping each entry to a factory
//!
//! # Examples
//!
//! ```rust
//! use wiring_config::{catalog::FactoryCatalog, schema::{ContainerConfig, EntryConfig}};
//! use wiring_di::from_fn;
//!
//! #[derive(Debug)]
//! struct Port(u16);
//!
//! let config: ContainerConfig = r#"
//!     [[entry]]
//!     name = "http"
//!     kind = "port"
//!     properties = { number = "8080" }
//! "#
//! .parse()
//! .unwrap();
//!
//! let mut catalog = FactoryCatalog::new();
//! catalog
//!     .add_kind("port", |entry: &EntryConfig| {
//!         let number: u16 = entry.property("number").unwrap_or("80").parse()?;
//!         Ok(from_fn(move |_| Ok(Port(number))))
//!     })
//!     .unwrap();
//!
//! let builder = catalog.builder_for(&config).unwrap();
//! let container = futures::executor::block_on(builder.build()).unwrap();
//! assert_eq!(container.require::<Port>("http").unwrap().0, 8080);
//! ```
//!
//! Wiring Config consists of the following components:
//!
//! 1. Schema - the shape of a container description
//! 2. Loader - reading and validating descriptions
//! 3. Catalog - registering kinds and creating builders
//! 4. Errors - for config errors

pub mod catalog;
pub mod errors;
pub mod loader;
pub mod schema;

pub use catalog::FactoryCatalog;
pub use errors::{ConfigError, RegisterKindError, ValidationError};
pub use loader::{load_config, validate_config};
pub use schema::{ContainerConfig, ContainerSettings, EntryConfig};
