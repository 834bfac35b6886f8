//! Type-erased built objects.

use crate::{handler::DynHandler, listener::DynListener};
use std::{any::Any, fmt, sync::Arc};

/// A built object as stored by the container and the object builder.
///
/// Cloning is cheap and shares the underlying object, so a cached instance
/// handed out twice is the *same* object ([`Instance::ptr_eq`]).
///
/// Handler and listener capabilities are attached when the type is
/// registered, because the concrete type is only known at that point.
#[derive(Clone)]
pub struct Instance {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
    handler: Option<Arc<dyn DynHandler>>,
    listener: Option<Arc<dyn DynListener>>,
}

impl Instance {
    /// Wrap a value, recording its Rust type name.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(std::any::type_name::<T>(), Arc::new(value))
    }

    /// Wrap a value under an explicit type name.
    pub fn named<T: Any + Send + Sync>(type_name: &'static str, value: T) -> Self {
        Self::from_arc(type_name, Arc::new(value))
    }

    /// Wrap an already shared value.
    pub fn from_arc<T: Any + Send + Sync>(type_name: &'static str, value: Arc<T>) -> Self {
        Self {
            type_name,
            value,
            handler: None,
            listener: None,
        }
    }

    /// Wrap a handler, keeping its [`DynHandler`] view.
    pub fn handler<T: DynHandler>(type_name: &'static str, value: T) -> Self {
        let value = Arc::new(value);
        let mut instance = Self::from_arc(type_name, value.clone());
        instance.handler = Some(value);
        instance
    }

    /// Wrap a listener, keeping its [`DynListener`] view.
    pub fn listener<T: DynListener>(type_name: &'static str, value: T) -> Self {
        let value = Arc::new(value);
        let mut instance = Self::from_arc(type_name, value.clone());
        instance.listener = Some(value);
        instance
    }

    /// The type name this instance was registered or built under.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Typed access to the shared object.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// Whether the object is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// The handler view, if the type was registered as a handler.
    pub fn as_handler(&self) -> Option<Arc<dyn DynHandler>> {
        self.handler.clone()
    }

    /// The listener view, if the type was registered as a listener.
    pub fn as_listener(&self) -> Option<Arc<dyn DynListener>> {
        self.listener.clone()
    }

    /// Whether both instances share the same object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("handler", &self.handler.is_some())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_object() {
        let a = Instance::new(String::from("x"));
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Instance::new(String::from("x"))));
        assert_eq!(a.downcast::<String>().as_deref().map(String::as_str), Some("x"));
        assert!(a.downcast::<u32>().is_none());
        assert!(a.is::<String>());
    }

    #[test]
    fn test_plain_values_have_no_capabilities() {
        let a = Instance::named("Widget", 5_u8);
        assert_eq!(a.type_name(), "Widget");
        assert!(a.as_handler().is_none());
        assert!(a.as_listener().is_none());
    }
}
