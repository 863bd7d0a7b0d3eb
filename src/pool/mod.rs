//! Instance pooling: keyed registration, lending, and a pool-owned holding area.

pub mod instance;
pub mod resource_pool;
pub mod stage;

pub use instance::{InstanceId, Poolable};
pub use resource_pool::{PoolError, ResourcePool, Source};
pub use stage::{ContainerId, MountHost, Stage};
