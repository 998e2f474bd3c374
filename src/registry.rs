//! Operation registries.
//!
//! A [`Registry`] accumulates one [`OperationRegistration`] per compiled route plus any
//! named component schemas declared up front. It is a cheap, cloneable handle: clones
//! share the same storage, so a route's metadata can point at a registry and a
//! document route's handler can read it back after compilation.
//!
//! Registries are written during the compile pass and read when a document is
//! rendered; compilation is expected to finish before any document is served.

use crate::error::{Error, Result};
use crate::response::ResponseDescriptor;
use crate::route::HttpMethod;
use crate::schema::Schema;
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Request part of a registered operation
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRegistration {
    /// Object schema whose properties become `in: path` parameters
    pub params: Schema,
    /// Object schema whose properties become `in: query` parameters
    pub query: Schema,
    /// JSON request body schema; `None` when the route takes no body
    pub body: Option<Schema>,
}

/// One operation, as registered by the route map compiler
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRegistration {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub request: RequestRegistration,
    /// Response table keyed by status code
    pub responses: BTreeMap<u16, ResponseDescriptor>,
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
}

#[derive(Default)]
struct RegistryState {
    operations: Vec<OperationRegistration>,
    components: IndexMap<String, Schema>,
}

/// Shared, mutable accumulator of operation registrations
#[derive(Clone)]
pub struct Registry {
    name: Arc<str>,
    state: Arc<RwLock<RegistryState>>,
}

impl Registry {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        debug!("Creating registry: {}", name);
        Self {
            name: Arc::from(name),
            state: Arc::new(RwLock::new(RegistryState::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an operation. Registrations are never deduplicated.
    pub fn register_path(&self, operation: OperationRegistration) {
        debug!(
            "Registry {}: registering {} {} as {}",
            self.name,
            operation.method,
            operation.path,
            operation.operation_id
        );
        self.write().operations.push(operation);
    }

    /// Declare a named schema that operations may refer to with `Schema::reference`.
    ///
    /// Declaring the same name twice is allowed only with an identical schema.
    pub fn register_component(&self, name: impl Into<String>, schema: Schema) -> Result<()> {
        let name = name.into();
        let mut state = self.write();
        if let Some(existing) = state.components.get(&name) {
            if *existing != schema {
                return Err(Error::Compilation(format!(
                    "Registry {}: component '{}' is already registered with a different schema",
                    self.name, name
                )));
            }
            return Ok(());
        }
        debug!("Registry {}: registering component {}", self.name, name);
        state.components.insert(name, schema);
        Ok(())
    }

    /// Snapshot of the registered operations, in registration order
    pub fn operations(&self) -> Vec<OperationRegistration> {
        self.read().operations.clone()
    }

    /// Snapshot of the declared components, in declaration order
    pub fn components(&self) -> IndexMap<String, Schema> {
        self.read().components.clone()
    }

    pub fn len(&self) -> usize {
        self.read().operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles point at the same storage
    pub fn same_as(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new("default")
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("operations", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn operation(id: &str) -> OperationRegistration {
        OperationRegistration {
            operation_id: id.to_string(),
            method: HttpMethod::Get,
            path: "/health".to_string(),
            request: RequestRegistration {
                params: Schema::empty_object(),
                query: Schema::empty_object(),
                body: None,
            },
            responses: BTreeMap::new(),
            tags: None,
            summary: None,
            description: None,
            deprecated: false,
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = Registry::new("internal");
        assert_eq!(registry.name(), "internal");
        assert!(registry.is_empty());
        assert!(registry.components().is_empty());
        assert_eq!(Registry::default().name(), "default");
    }

    #[test]
    fn test_clones_share_storage() {
        let registry = Registry::default();
        let handle = registry.clone();

        handle.register_path(operation("Health"));

        assert_eq!(registry.len(), 1);
        assert!(registry.same_as(&handle));
        assert!(!registry.same_as(&Registry::default()));
    }

    #[test]
    fn test_duplicate_registrations_are_kept() {
        let registry = Registry::default();
        registry.register_path(operation("Health"));
        registry.register_path(operation("Health"));

        let ids: Vec<_> = registry
            .operations()
            .into_iter()
            .map(|op| op.operation_id)
            .collect();
        assert_eq!(ids, vec!["Health", "Health"]);
    }

    #[test]
    fn test_component_conflicts() {
        let registry = Registry::default();
        registry.register_component("Who", Schema::string()).unwrap();
        registry.register_component("Who", Schema::string()).unwrap();

        let err = registry.register_component("Who", Schema::integer()).unwrap_err();
        assert!(matches!(err, Error::Compilation(_)));
        assert_eq!(registry.components().len(), 1);
    }
}
