use crate::reflect::Resource;
use crate::value::{Object, TypeName, Value};
use std::collections::HashMap;

/// Lookup of shared services by type name.
///
/// Storage and wiring belong to the application; the dispatch core only reads.
pub trait ServiceContainer: Send + Sync {
    fn has(&self, type_name: &str) -> bool;

    fn get(&self, type_name: &str) -> Option<Value>;
}

/// In-memory [`ServiceContainer`] keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct Container {
    services: HashMap<TypeName, Value>,
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `type_name`, replacing any previous entry.
    pub fn insert(&mut self, type_name: impl Into<TypeName>, value: Value) -> &mut Self {
        self.services.insert(type_name.into(), value);
        self
    }

    /// Store a resource instance under its registry name.
    pub fn insert_resource<T: Resource>(&mut self, service: T) -> &mut Self {
        self.insert(T::NAME, Value::Object(Object::of(service)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceContainer for Container {
    fn has(&self, type_name: &str) -> bool {
        self.services.contains_key(type_name)
    }

    fn get(&self, type_name: &str) -> Option<Value> {
        self.services.get(type_name).cloned()
    }
}
