//! Mount points: where lent-out and idle instances are attached.
//!
//! The pool's only coupling to a rendering host is the [`MountHost`] trait:
//! create a container, attach an instance under it, detach it again. [`Stage`]
//! is the in-memory implementation used by default; a real scene host would
//! implement the trait on top of its own node tree.

use std::collections::HashMap;

use slotmap::{new_key_type, SecondaryMap, SlotMap};

use super::instance::InstanceId;

new_key_type! {
    /// Identifies a container (mount point or holding area) on a mount host.
    pub struct ContainerId;
}

/// Empty slice constant for containers without contents.
const EMPTY_CONTENTS: &[InstanceId] = &[];

/// Attachment contract between the pool and whatever hosts the instances.
pub trait MountHost {
    /// Create a new, empty container.
    fn create_container(&mut self, name: &str) -> ContainerId;

    /// Attach `instance` under `container`, detaching it from any previous one.
    fn attach(&mut self, instance: InstanceId, container: ContainerId);

    /// Detach `instance` from wherever it is attached. No-op if unattached.
    fn detach(&mut self, instance: InstanceId);
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Slotmap-backed set of named containers and the instances placed in them.
///
/// Each instance is attached to at most one container at a time. Contents keep
/// attachment order.
#[derive(Debug)]
pub struct Stage {
    containers: SlotMap<ContainerId, String>,
    contents: SecondaryMap<ContainerId, Vec<InstanceId>>,
    placement: HashMap<InstanceId, ContainerId>,
}

impl Stage {
    /// Create an empty stage.
    pub fn new() -> Self {
        Self {
            containers: SlotMap::with_key(),
            contents: SecondaryMap::new(),
            placement: HashMap::new(),
        }
    }

    /// The container `instance` is attached to, if any.
    pub fn container_of(&self, instance: InstanceId) -> Option<ContainerId> {
        self.placement.get(&instance).copied()
    }

    /// Instances attached under `container`. Empty if unknown.
    pub fn contents(&self, container: ContainerId) -> &[InstanceId] {
        self.contents
            .get(container)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CONTENTS)
    }

    /// The name a container was created with.
    pub fn name(&self, container: ContainerId) -> Option<&str> {
        self.containers.get(container).map(String::as_str)
    }

    /// Whether `container` exists on this stage.
    pub fn has_container(&self, container: ContainerId) -> bool {
        self.containers.contains_key(container)
    }

    /// Whether `instance` is attached anywhere.
    pub fn is_attached(&self, instance: InstanceId) -> bool {
        self.placement.contains_key(&instance)
    }

    /// Number of containers.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether the stage has no containers.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl MountHost for Stage {
    fn create_container(&mut self, name: &str) -> ContainerId {
        let id = self.containers.insert(name.to_owned());
        self.contents.insert(id, Vec::new());
        id
    }

    fn attach(&mut self, instance: InstanceId, container: ContainerId) {
        debug_assert!(
            self.containers.contains_key(container),
            "container does not exist"
        );
        self.detach(instance);
        if let Some(list) = self.contents.get_mut(container) {
            list.push(instance);
            self.placement.insert(instance, container);
        }
    }

    fn detach(&mut self, instance: InstanceId) {
        if let Some(old) = self.placement.remove(&instance) {
            if let Some(list) = self.contents.get_mut(old) {
                list.retain(|&i| i != instance);
            }
        }
    }
}
