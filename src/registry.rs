//! Service registry: values and factories addressed by type or by string id.
//!
//! Type keys are [`TypeId`]s of the registered service type; the string-keyed
//! table is a separate escape hatch. Each key may be bound once.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::ErrorKind;

/// Errors returned by [`ServiceRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The key already has a service bound to it.
    #[error("service {key} is already registered")]
    DuplicateRegistration { key: String },
    /// Nothing is bound to the key.
    #[error("service {key} is not registered")]
    UnregisteredKey { key: String },
    /// The bound value is not of the requested type.
    #[error("service {key} cannot be resolved as {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

impl RegistryError {
    /// Where this error sits in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::DuplicateRegistration { .. } => ErrorKind::Configuration,
            RegistryError::UnregisteredKey { .. } => ErrorKind::Lookup,
            RegistryError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }
}

enum Entry {
    Instance(Rc<dyn Any>),
    Factory(Box<dyn Fn() -> Rc<dyn Any>>),
}

impl Entry {
    fn produce(&self) -> Rc<dyn Any> {
        match self {
            Entry::Instance(value) => Rc::clone(value),
            Entry::Factory(factory) => factory(),
        }
    }
}

/// Registry of shared services.
///
/// Instances are shared (`Rc`) between all resolvers. Factories run on every
/// resolve and hand out a new value each time.
#[derive(Default)]
pub struct ServiceRegistry {
    by_type: HashMap<TypeId, Entry>,
    by_id: HashMap<String, Entry>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `instance` under `id`, or under its type when `id` is `None`/empty.
    pub fn register<S: 'static>(&mut self, instance: S, id: Option<&str>) -> Result<(), RegistryError> {
        self.register_shared(Rc::new(instance), id)
    }

    /// Bind an already shared instance.
    pub fn register_shared<S: 'static>(
        &mut self,
        instance: Rc<S>,
        id: Option<&str>,
    ) -> Result<(), RegistryError> {
        self.insert::<S>(Entry::Instance(instance), id)
    }

    /// Bind a factory that builds a new `S` on every resolve.
    pub fn register_factory<S, F>(&mut self, factory: F, id: Option<&str>) -> Result<(), RegistryError>
    where
        S: 'static,
        F: Fn() -> S + 'static,
    {
        let entry = Entry::Factory(Box::new(move || Rc::new(factory()) as Rc<dyn Any>));
        self.insert::<S>(entry, id)
    }

    /// Resolve a service. Fails if nothing is bound or the value is not an `S`.
    pub fn resolve<S: 'static>(&self, id: Option<&str>) -> Result<Rc<S>, RegistryError> {
        let (entry, key) = self.lookup::<S>(id);
        let entry = entry.ok_or_else(|| RegistryError::UnregisteredKey { key: key.clone() })?;
        entry
            .produce()
            .downcast::<S>()
            .map_err(|_| RegistryError::TypeMismatch {
                key,
                expected: type_name::<S>(),
            })
    }

    /// Resolve a service, or `None` if it is missing or of another type.
    pub fn try_resolve<S: 'static>(&self, id: Option<&str>) -> Option<Rc<S>> {
        self.resolve(id).ok()
    }

    /// Whether anything is bound under the key `resolve::<S>(id)` would use.
    pub fn contains<S: 'static>(&self, id: Option<&str>) -> bool {
        self.lookup::<S>(id).0.is_some()
    }

    /// Number of bindings (type and id keyed).
    pub fn len(&self) -> usize {
        self.by_type.len() + self.by_id.len()
    }

    /// Whether the registry has no bindings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<S: 'static>(&self, id: Option<&str>) -> (Option<&Entry>, String) {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => (self.by_id.get(id), format!("with id '{id}'")),
            None => (
                self.by_type.get(&TypeId::of::<S>()),
                format!("of type '{}'", type_name::<S>()),
            ),
        }
    }

    fn insert<S: 'static>(&mut self, entry: Entry, id: Option<&str>) -> Result<(), RegistryError> {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => {
                if self.by_id.contains_key(id) {
                    return Err(RegistryError::DuplicateRegistration {
                        key: format!("with id '{id}'"),
                    });
                }
                debug!(service_id = id, ty = type_name::<S>(), "registered service");
                self.by_id.insert(id.to_owned(), entry);
            }
            None => {
                let type_id = TypeId::of::<S>();
                if self.by_type.contains_key(&type_id) {
                    return Err(RegistryError::DuplicateRegistration {
                        key: format!("of type '{}'", type_name::<S>()),
                    });
                }
                debug!(ty = type_name::<S>(), "registered service");
                self.by_type.insert(type_id, entry);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.by_id.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ServiceRegistry")
            .field("typed", &self.by_type.len())
            .field("ids", &ids)
            .finish()
    }
}
