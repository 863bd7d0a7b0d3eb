//! Keyed resource pool: registration, lending, and reclaiming of instances.
//!
//! Bindings are addressed either by a type key or by an explicit string id.
//! A type-key registration is stored under a freshly generated id and recorded
//! in a type → id map, so both addressing modes end up in the same id space.
//! Idle instances wait on a per-id holding stack; the pool never shrinks.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use super::instance::{InstanceId, Poolable};
use super::stage::{ContainerId, MountHost, Stage};
use crate::error::ErrorKind;

// ---------------------------------------------------------------------------
// PoolError
// ---------------------------------------------------------------------------

/// Errors returned by [`ResourcePool`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The key already has a binding. Raised at setup time.
    #[error("{key} is already registered")]
    DuplicateRegistration { key: String },
    /// No binding exists for the key.
    #[error("no prototype or factory registered for {key}")]
    UnregisteredKey { key: String },
    /// The binding's prototype or factory produced nothing.
    #[error("binding '{id}' produced no instance")]
    InstanceUnavailable { id: String },
    /// The binding produced an instance of a different type than requested.
    #[error("instance from binding '{id}' is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },
}

impl PoolError {
    /// Where this error sits in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::DuplicateRegistration { .. } => ErrorKind::Configuration,
            PoolError::UnregisteredKey { .. } | PoolError::InstanceUnavailable { .. } => {
                ErrorKind::Lookup
            }
            PoolError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// How a binding produces new instances.
pub enum Source<T> {
    /// Duplicate this template via [`Poolable::instantiate`].
    Prototype(T),
    /// Call this zero-argument factory.
    Factory(Box<dyn Fn() -> Option<T>>),
}

impl<T> Source<T> {
    /// Wrap a factory closure.
    pub fn factory(f: impl Fn() -> Option<T> + 'static) -> Self {
        Source::Factory(Box::new(f))
    }
}

impl<T: Poolable> Source<T> {
    fn produce(&self) -> Option<T> {
        match self {
            Source::Prototype(prototype) => prototype.instantiate(),
            Source::Factory(factory) => factory(),
        }
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Prototype(_) => f.write_str("Source::Prototype"),
            Source::Factory(_) => f.write_str("Source::Factory"),
        }
    }
}

// ---------------------------------------------------------------------------
// ResourcePool
// ---------------------------------------------------------------------------

/// Generic keyed pool of `T` instances.
///
/// Lent-out instances are tracked until released. Acquire mounts instances
/// under a live container; release moves them to the pool's own holding area.
/// Every failed call leaves the bookkeeping exactly as it was.
pub struct ResourcePool<T: Poolable, M: MountHost = Stage> {
    sources: HashMap<String, Source<T>>,
    type_ids: HashMap<TypeId, String>,
    idle: HashMap<String, Vec<T>>,
    tracked: HashMap<InstanceId, String>,
    mount: M,
    live_area: ContainerId,
    holding_area: ContainerId,
}

impl<T: Poolable> ResourcePool<T, Stage> {
    /// A pool on a fresh [`Stage`] with a `live` and a `holding` container.
    pub fn new() -> Self {
        let mut stage = Stage::new();
        let live = stage.create_container("live");
        Self::with_mount(stage, live, "holding")
    }
}

impl<T: Poolable> Default for ResourcePool<T, Stage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable, M: MountHost> ResourcePool<T, M> {
    /// A pool on an existing mount host.
    ///
    /// `live_area` is the default mount point for acquired instances. The pool
    /// creates its own holding container named `holding_name`.
    pub fn with_mount(mut mount: M, live_area: ContainerId, holding_name: &str) -> Self {
        let holding_area = mount.create_container(holding_name);
        Self {
            sources: HashMap::new(),
            type_ids: HashMap::new(),
            idle: HashMap::new(),
            tracked: HashMap::new(),
            mount,
            live_area,
            holding_area,
        }
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Bind `source` under the explicit `id`, or under the type key `D` when
    /// `id` is `None` or empty.
    ///
    /// Returns the id the binding was stored under. Fails with
    /// [`PoolError::DuplicateRegistration`] if the key is already bound.
    pub fn register<D: 'static>(
        &mut self,
        id: Option<&str>,
        source: Source<T>,
    ) -> Result<String, PoolError> {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => {
                if self.sources.contains_key(id) {
                    return Err(PoolError::DuplicateRegistration {
                        key: format!("id '{id}'"),
                    });
                }
                debug!(pool_id = id, ?source, "registered binding by id");
                self.sources.insert(id.to_owned(), source);
                Ok(id.to_owned())
            }
            None => {
                let type_id = TypeId::of::<D>();
                if self.type_ids.contains_key(&type_id) {
                    return Err(PoolError::DuplicateRegistration {
                        key: format!("type '{}'", type_name::<D>()),
                    });
                }
                let id = uuid::Uuid::new_v4().to_string();
                debug!(pool_id = %id, ty = type_name::<D>(), ?source, "registered binding by type");
                self.type_ids.insert(type_id, id.clone());
                self.sources.insert(id.clone(), source);
                Ok(id)
            }
        }
    }

    /// Resolve the binding id for an acquire. An explicit id wins over the type.
    pub fn resolve_id<D: 'static>(&self, id: Option<&str>) -> Option<String> {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => self.sources.contains_key(id).then(|| id.to_owned()),
            None => self.type_ids.get(&TypeId::of::<D>()).cloned(),
        }
    }

    // ── Lending ──────────────────────────────────────────────────────

    /// Lend out an instance of `D`, mounted under the pool's live area.
    pub fn acquire<D: 'static>(&mut self, id: Option<&str>) -> Result<T, PoolError> {
        let live = self.live_area;
        self.acquire_into::<D>(id, live)
    }

    /// Lend out an instance of `D`, mounted under `container`.
    ///
    /// Reuses the most recently released instance when one is idle, otherwise
    /// builds a new one. If the instance's runtime type is not `D`, a reused
    /// instance goes back on its stack, a new one is dropped, and the call
    /// fails with [`PoolError::TypeMismatch`].
    pub fn acquire_into<D: 'static>(
        &mut self,
        id: Option<&str>,
        container: ContainerId,
    ) -> Result<T, PoolError> {
        let id = self
            .resolve_id::<D>(id)
            .ok_or_else(|| PoolError::UnregisteredKey {
                key: match id.filter(|id| !id.is_empty()) {
                    Some(id) => format!("id '{id}'"),
                    None => format!("type '{}'", type_name::<D>()),
                },
            })?;

        let (instance, reused) = match self.idle.get_mut(&id).and_then(Vec::pop) {
            Some(instance) => (instance, true),
            None => {
                let instance = self
                    .sources
                    .get(&id)
                    .and_then(Source::produce)
                    .ok_or_else(|| PoolError::InstanceUnavailable { id: id.clone() })?;
                (instance, false)
            }
        };

        if instance.runtime_type() != TypeId::of::<D>() {
            if reused {
                self.idle.entry(id.clone()).or_default().push(instance);
            }
            return Err(PoolError::TypeMismatch {
                id,
                expected: type_name::<D>(),
            });
        }

        let instance_id = instance.instance_id();
        self.mount.attach(instance_id, container);
        debug!(pool_id = %id, instance = %instance_id, reused, "acquired instance");
        self.tracked.insert(instance_id, id);
        Ok(instance)
    }

    /// Like [`acquire`](Self::acquire), but reports failure as `None`.
    pub fn try_acquire<D: 'static>(&mut self, id: Option<&str>) -> Option<T> {
        self.acquire::<D>(id).ok()
    }

    /// Take `instance` back into its holding stack.
    ///
    /// Returns `false` without side effects if the instance is not currently
    /// lent out (never acquired, already released, or from another pool).
    pub fn release(&mut self, instance: &T) -> bool {
        let instance_id = instance.instance_id();
        let Some(id) = self.tracked.remove(&instance_id) else {
            trace!(instance = %instance_id, "ignored release of untracked instance");
            return false;
        };
        self.mount.detach(instance_id);
        self.mount.attach(instance_id, self.holding_area);
        debug!(pool_id = %id, instance = %instance_id, "released instance");
        self.idle.entry(id).or_default().push(instance.clone());
        true
    }

    // ── Introspection ────────────────────────────────────────────────

    /// Whether a binding exists under the explicit `id`.
    pub fn is_registered(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    /// Whether `instance` is currently lent out by this pool.
    pub fn is_tracked(&self, instance: &T) -> bool {
        self.tracked.contains_key(&instance.instance_id())
    }

    /// Number of idle instances waiting under `id`.
    pub fn idle_count(&self, id: &str) -> usize {
        self.idle.get(id).map_or(0, Vec::len)
    }

    /// Number of instances currently lent out.
    pub fn lent_count(&self) -> usize {
        self.tracked.len()
    }

    /// The default mount point for acquired instances.
    pub fn live_area(&self) -> ContainerId {
        self.live_area
    }

    /// The pool-owned holding container for idle instances.
    pub fn holding_area(&self) -> ContainerId {
        self.holding_area
    }

    /// The mount host.
    pub fn mount(&self) -> &M {
        &self.mount
    }

    /// Mutable access to the mount host (e.g. to create more mount points).
    pub fn mount_mut(&mut self) -> &mut M {
        &mut self.mount
    }
}

impl<T: Poolable, M: MountHost> fmt::Debug for ResourcePool<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("bindings", &self.sources.len())
            .field("typed", &self.type_ids.len())
            .field("lent", &self.tracked.len())
            .field("idle", &self.idle.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
