//! Widget system: trait, nodes, lifecycle, orchestration, close requests.

pub mod context;
pub mod lifecycle;
pub mod node;
pub mod orchestrator;
pub mod subscription;
pub mod traits;

pub use context::WidgetContext;
pub use lifecycle::{
    LifecycleError, LifecycleEvent, LifecycleState, LifecycleTracker, ReleaseFailure,
};
pub use node::{ReleaseError, WidgetHandle, WidgetRef};
pub use orchestrator::when_all;
pub use subscription::{CloseHandler, CloseRequester, CloseSubscription};
pub use traits::{Widget, WidgetExt};
