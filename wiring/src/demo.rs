//! Kinds available to container descriptions run by the driver.

use std::sync::Arc;

use wiring_config::{EntryConfig, FactoryCatalog, RegisterKindError};
use wiring_di::{DiHandle, DynError, InstanceFactory};

/// Stateless helper other entries can be wired with
#[derive(Debug, Default)]
pub struct Collaborator;

/// Service optionally delegating to another service
#[derive(Debug)]
pub struct BusinessService {
    pub label: String,
    pub other: Option<Arc<BusinessService>>,
    pub collaborator: Option<Arc<Collaborator>>,
}

impl BusinessService {
    pub fn some_method(&self, arg: &str) -> String {
        let msg = format!("Calling some_method({arg}) on {}", self.label);
        tracing::info!("{msg}");
        msg
    }
}

/// Wires a [BusinessService] with whatever its declared dependencies provide
///
/// Every dependency must be either a [BusinessService] or a [Collaborator].
pub struct BusinessFactory {
    label: String,
}

impl BusinessFactory {
    pub fn from_entry(entry: &EntryConfig) -> Self {
        BusinessFactory {
            label: entry.property("label").unwrap_or(&entry.name).to_string(),
        }
    }
}

impl InstanceFactory for BusinessFactory {
    type Provides = BusinessService;

    async fn construct(&mut self, di: DiHandle) -> Result<BusinessService, DynError> {
        let mut other = None;
        let mut collaborator = None;

        for (name, instance) in di.dependencies() {
            if let Ok(service) = instance.downcast::<BusinessService>() {
                // The injected service is used right away
                service.some_method("foo");
                other = Some(service);
            } else if let Ok(helper) = instance.downcast::<Collaborator>() {
                collaborator = Some(helper);
            } else {
                return Err(format!(
                    "'{}' can't use '{name}' of type {}",
                    di.requester(),
                    instance.info
                )
                .into());
            }
        }

        Ok(BusinessService {
            label: self.label.clone(),
            other,
            collaborator,
        })
    }

    fn teardown(&mut self, service: &BusinessService) -> Result<(), DynError> {
        tracing::info!("Releasing business service '{}'", service.label);
        Ok(())
    }
}

pub struct CollaboratorFactory;

impl InstanceFactory for CollaboratorFactory {
    type Provides = Collaborator;

    async fn construct(&mut self, _di: DiHandle) -> Result<Collaborator, DynError> {
        Ok(Collaborator)
    }
}

/// All kinds the driver understands
pub fn catalog() -> Result<FactoryCatalog, RegisterKindError> {
    let mut catalog = FactoryCatalog::new();
    catalog
        .add_kind("collaborator", |_: &EntryConfig| Ok(CollaboratorFactory))?
        .add_kind("business", |entry: &EntryConfig| {
            Ok(BusinessFactory::from_entry(entry))
        })?;
    Ok(catalog)
}
