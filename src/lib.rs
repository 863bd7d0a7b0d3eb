//! # reui
//!
//! A lifecycle framework for pooled UI widgets: screens and panels that are
//! lent out of a keyed pool, opened and closed through coordinated groups of
//! hooks, child transitions and category-tagged effects, then returned to the
//! pool for reuse.
//!
//! Everything runs on a single cooperative execution context. Transitions are
//! futures joined with `futures::future::join_all`; the [`host`] drives them
//! in the background with `tokio::task::spawn_local`, so hosts live inside a
//! `tokio::task::LocalSet`.
//!
//! ## Core Systems
//!
//! - **[`effect`]**: effect categories, the `Effect` trait, the per-widget effects index
//! - **[`pool`]**: keyed resource pool with reuse, tracking and a holding area on a stage
//! - **[`registry`]**: service registry keyed by type or string id
//! - **[`widget`]**: widget trait, nodes, lifecycle states, open/close orchestration,
//!   close requests
//! - **[`host`]**: the façade that owns pool, registry and lifecycle tracking
//! - **[`error`]**: crate-wide error classification
//! - **[`testing`]**: gates, scripted effects, probe widgets, snapshot helpers
//!
//! ## Example
//!
//! ```ignore
//! use reui::host::{HostConfig, WidgetHost};
//!
//! let host = WidgetHost::new(HostConfig::new());
//! host.register_widget(Screen::default(), None)?;
//! let screen = host.open::<Screen>(None)?;
//! // ... later
//! host.close(&screen)?;
//! ```

// Foundation
pub mod error;

// Core systems
pub mod effect;
pub mod pool;
pub mod registry;

// Widget system
pub mod widget;

// Application
pub mod host;

// Test support
pub mod testing;

pub use effect::{Completion, Effect, EffectRef};
pub use error::ErrorKind;
pub use host::{HostConfig, HostError, WidgetHost};
pub use pool::{InstanceId, PoolError, ResourcePool};
pub use registry::{RegistryError, ServiceRegistry};
pub use widget::{LifecycleState, Widget, WidgetContext, WidgetHandle, WidgetRef};
