use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

/// All errors must be shareable between threads
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Instances are shared between the main flow, shutdown triggers and waiters,
/// so anything injectable needs to be Send + Sync + 'static.
///
/// Debug is required so resolved instances can be reported without knowing their type.
pub trait Injectable: Send + Sync + Debug + 'static {}
impl<T: Send + Sync + Debug + 'static> Injectable for T {}

/// A wired object, type erased
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
    render: fn(&(dyn Any + Send + Sync)) -> String,
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    pub fn from_arc<ExistingInstance: Injectable>(instance: Arc<ExistingInstance>) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance,
            render: render_as::<ExistingInstance>,
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// Textual representation of the wrapped value
    pub fn describe(&self) -> String {
        (self.render)(self.instance.as_ref())
    }
}

fn render_as<T: Injectable>(value: &(dyn Any + Send + Sync)) -> String {
    match value.downcast_ref::<T>() {
        Some(value) => format!("{value:?}"),
        None => String::from("<unrenderable>"),
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Widget {
        size: u8,
    }

    #[test]
    fn describe_uses_debug_of_wrapped_value() {
        let instance = Instance::new(Widget { size: 3 });
        assert_eq!(instance.describe(), "Widget { size: 3 }");
        assert_eq!(instance.info, TypeInfo::of::<Widget>());
    }

    #[test]
    fn downcast_to_wrong_type_reports_actual_type() {
        let instance = Instance::new(String::from("x"));
        let err = instance.downcast::<Widget>().unwrap_err();
        assert_eq!(err, std::any::type_name::<String>());
        assert_eq!(*instance.downcast::<String>().unwrap(), "x");
    }
}
