use std::collections::BTreeMap;

use wiring_di::{DiBuilder, DynError, DynFactory, InstanceFactory};

use crate::{
    errors::{ConfigError, RegisterKindError},
    schema::{ContainerConfig, EntryConfig},
};

type MakeFactory =
    Box<dyn Fn(&EntryConfig) -> Result<Box<dyn DynFactory>, DynError> + Send + Sync + 'static>;

/// A catalog of every kind a container description may use.
///
/// Kinds are registered in code, each with a function creating the factory for an entry of that kind.
#[derive(Default)]
pub struct FactoryCatalog {
    kinds: BTreeMap<String, MakeFactory>,
}

impl std::fmt::Debug for FactoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.kinds.keys()).finish()
    }
}

impl FactoryCatalog {
    /// Initializes an empty catalog
    pub fn new() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Add a kind to the catalog.
    ///
    /// If the kind is already registered, it will return a [`RegisterKindError`]
    pub fn add_kind<Factory, Make>(
        &mut self,
        kind: impl Into<String>,
        make: Make,
    ) -> Result<&mut Self, RegisterKindError>
    where
        Factory: InstanceFactory + 'static,
        Make: Fn(&EntryConfig) -> Result<Factory, DynError> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.kinds.contains_key(&kind) {
            return Err(RegisterKindError::AlreadyRegistered(kind));
        }

        self.kinds.insert(
            kind,
            Box::new(move |entry| {
                make(entry).map(|factory| Box::new(factory) as Box<dyn DynFactory>)
            }),
        );
        Ok(self)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.kinds.keys().map(String::as_str)
    }

    /// Creates the factory for a single entry
    pub fn make(&self, entry: &EntryConfig) -> Result<Box<dyn DynFactory>, ConfigError> {
        let make = self
            .kinds
            .get(&entry.kind)
            .ok_or_else(|| ConfigError::UnknownKind {
                entry: entry.name.clone(),
                kind: entry.kind.clone(),
            })?;

        make(entry).map_err(|error| ConfigError::Factory {
            entry: entry.name.clone(),
            error,
        })
    }

    /// Registers every entry of the description on a new builder, in declaration order
    pub fn builder_for(&self, config: &ContainerConfig) -> Result<DiBuilder, ConfigError> {
        let mut builder = DiBuilder::new();
        for entry in &config.entries {
            let factory = self.make(entry)?;
            tracing::debug!("Registering '{}' of kind '{}'", entry.name, entry.kind);
            builder = builder.add_boxed_factory(&entry.name, entry.dependencies.clone(), factory);
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use wiring_di::DiHandle;

    use super::*;

    #[derive(Debug)]
    struct Label(String);

    struct LabelFactory(String);
    impl InstanceFactory for LabelFactory {
        type Provides = Label;

        async fn construct(&mut self, _di: DiHandle) -> Result<Label, DynError> {
            Ok(Label(self.0.clone()))
        }
    }

    fn catalog() -> FactoryCatalog {
        let mut catalog = FactoryCatalog::new();
        catalog
            .add_kind("label", |entry: &EntryConfig| {
                let text = entry.property("text").unwrap_or("unnamed");
                Ok(LabelFactory(text.to_string()))
            })
            .unwrap()
            .add_kind("picky", |_: &EntryConfig| {
                Err::<LabelFactory, DynError>("picky never agrees".into())
            })
            .unwrap();
        catalog
    }

    #[test]
    fn kinds_register_once() {
        let mut catalog = catalog();
        assert!(catalog.contains("label"));
        assert_eq!(catalog.kinds().collect::<Vec<_>>(), vec!["label", "picky"]);

        let err = catalog
            .add_kind("label", |_: &EntryConfig| Ok(LabelFactory(String::new())))
            .unwrap_err();
        assert_eq!(err, RegisterKindError::AlreadyRegistered("label".into()));
    }

    #[test]
    fn builds_a_container_from_a_description() {
        let config: ContainerConfig = r#"
            [[entry]]
            name = "second"
            kind = "label"
            dependencies = ["first"]
            properties = { text = "two" }

            [[entry]]
            name = "first"
            kind = "label"
        "#
        .parse()
        .unwrap();

        let builder = catalog().builder_for(&config).unwrap();
        assert_eq!(builder.len(), 2);

        let container = block_on(builder.build()).unwrap();
        assert_eq!(container.names(), vec!["first", "second"]);
        assert_eq!(container.require::<Label>("second").unwrap().0, "two");
        assert_eq!(container.require::<Label>("first").unwrap().0, "unnamed");
    }

    #[test]
    fn unknown_kind_is_reported() {
        let config: ContainerConfig = r#"
            [[entry]]
            name = "x"
            kind = "mystery"
        "#
        .parse()
        .unwrap();

        let err = catalog().builder_for(&config).err().unwrap();
        assert_eq!(err.to_string(), "Entry 'x' has the unknown kind 'mystery'");
    }

    #[test]
    fn factory_creation_errors_name_the_entry() {
        let config: ContainerConfig = r#"
            [[entry]]
            name = "y"
            kind = "picky"
        "#
        .parse()
        .unwrap();

        let err = catalog().builder_for(&config).err().unwrap();
        assert!(matches!(err, ConfigError::Factory { ref entry, .. } if entry == "y"));
        assert!(err.to_string().ends_with("picky never agrees"));
    }
}
