//! Instance identity and the `Poolable` contract.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique runtime identity of a pooled instance. Copy, lightweight (u64).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocate a fresh id. Ids are never reused within a process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a [`ResourcePool`](super::ResourcePool) can lend out and take back.
///
/// Handles are cheap to clone; clones refer to the same instance and report the
/// same [`InstanceId`].
pub trait Poolable: Clone + 'static {
    /// Identity used to track the instance while it is lent out.
    fn instance_id(&self) -> InstanceId;

    /// Concrete runtime type, checked against the type requested on acquire.
    fn runtime_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Build a fresh, independent instance using `self` as the template.
    ///
    /// Returns `None` when the template cannot be duplicated.
    fn instantiate(&self) -> Option<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn display_is_hash_prefixed() {
        let id = InstanceId::next();
        assert_eq!(id.to_string(), format!("#{}", id.as_u64()));
    }

    #[test]
    fn instance_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<InstanceId>();
    }
}
