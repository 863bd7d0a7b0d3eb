//! Widget lifecycle: states, errors, and the host-side event tracker.
//!
//! A widget instance moves through
//! `Pooled → Initialized → Opening → Open → Closing → DeInitialized → Pooled`.
//! The [`LifecycleTracker`] records which instances a host currently has live
//! and accumulates lifecycle events (`Acquired`, `Opened`, `Closed`,
//! `Released`) that can be drained and inspected.

use std::collections::HashSet;
use std::fmt;

use crate::error::ErrorKind;
use crate::pool::InstanceId;

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// Where a widget instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Idle: freshly built or waiting in a pool's holding stack.
    Pooled,
    /// Effects index built and initialize hooks run.
    Initialized,
    /// Open group started, not yet joined.
    Opening,
    /// Open group joined; the widget is live and visible.
    Open,
    /// Close group started; stays here until deinitialized.
    Closing,
    /// Teardown hooks run and scoped resources released.
    DeInitialized,
}

impl LifecycleState {
    /// Whether the widget has been initialized and not yet torn down.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LifecycleState::Initialized
                | LifecycleState::Opening
                | LifecycleState::Open
                | LifecycleState::Closing
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Pooled => "pooled",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Opening => "opening",
            LifecycleState::Open => "open",
            LifecycleState::Closing => "closing",
            LifecycleState::DeInitialized => "deinitialized",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A scoped resource whose release action failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFailure {
    /// Widget that registered the resource.
    pub widget: InstanceId,
    /// Label given when the resource was registered.
    pub label: String,
    /// Rendered error from the release action.
    pub message: String,
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.widget, self.label, self.message)
    }
}

/// Errors raised by widget lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The operation needs an initialized widget.
    #[error("widget {widget} is not initialized")]
    NotInitialized { widget: InstanceId },
    /// A requested effect category is not part of the widget's category set.
    #[error("effect category '{category}' is not defined on widget {widget}")]
    UnknownEffectCategory { widget: InstanceId, category: String },
    /// The operation is not allowed in the widget's current state.
    #[error("cannot {operation} widget {widget} while it is {state}")]
    InvalidTransition {
        widget: InstanceId,
        operation: &'static str,
        state: LifecycleState,
    },
    /// Release actions failed during deinitialize. The sweep still ran to the end.
    #[error("{} scoped resource(s) failed to release", .failures.len())]
    ResourceRelease { failures: Vec<ReleaseFailure> },
}

impl LifecycleError {
    /// Where this error sits in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::NotInitialized { .. } | LifecycleError::InvalidTransition { .. } => {
                ErrorKind::InvalidState
            }
            LifecycleError::UnknownEffectCategory { .. } => ErrorKind::Lookup,
            LifecycleError::ResourceRelease { .. } => ErrorKind::ResourceRelease,
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Events recorded by a host while driving widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// An instance was taken out of the pool.
    Acquired { widget: InstanceId },
    /// The instance's open group joined.
    Opened { widget: InstanceId },
    /// The instance's close group joined.
    Closed { widget: InstanceId },
    /// The instance was returned to the pool.
    Released { widget: InstanceId },
}

impl LifecycleEvent {
    /// The instance the event refers to.
    pub fn widget(&self) -> InstanceId {
        match self {
            LifecycleEvent::Acquired { widget }
            | LifecycleEvent::Opened { widget }
            | LifecycleEvent::Closed { widget }
            | LifecycleEvent::Released { widget } => *widget,
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleTracker
// ---------------------------------------------------------------------------

/// Tracks which instances are currently live and accumulates lifecycle events.
///
/// An instance is live from acquisition until release. `Opened`/`Closed`
/// events are only recorded for live instances.
#[derive(Debug)]
pub struct LifecycleTracker {
    /// Set of currently live instances.
    live: HashSet<InstanceId>,
    /// Pending lifecycle events, in order of occurrence.
    pending: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    /// Create a new, empty tracker.
    pub fn new() -> Self {
        Self {
            live: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Record that an instance left the pool.
    ///
    /// If the instance is already live, this is a no-op (no duplicate event).
    pub fn on_acquire(&mut self, id: InstanceId) {
        if self.live.insert(id) {
            self.pending.push(LifecycleEvent::Acquired { widget: id });
        }
    }

    /// Record that a live instance finished opening.
    pub fn on_open(&mut self, id: InstanceId) {
        if self.live.contains(&id) {
            self.pending.push(LifecycleEvent::Opened { widget: id });
        }
    }

    /// Record that a live instance finished closing.
    pub fn on_close(&mut self, id: InstanceId) {
        if self.live.contains(&id) {
            self.pending.push(LifecycleEvent::Closed { widget: id });
        }
    }

    /// Record that an instance went back to the pool.
    ///
    /// If the instance was not live, this is a no-op (no spurious event).
    pub fn on_release(&mut self, id: InstanceId) {
        if self.live.remove(&id) {
            self.pending.push(LifecycleEvent::Released { widget: id });
        }
    }

    /// Whether an instance is currently live.
    pub fn is_live(&self, id: InstanceId) -> bool {
        self.live.contains(&id)
    }

    /// All currently live instances, in ascending id order.
    pub fn live_widgets(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.live.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The number of currently live instances.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Drain and return all pending events.
    pub fn pending_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Whether there are any pending events.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Clear all state (live instances and pending events).
    pub fn clear(&mut self) {
        self.live.clear();
        self.pending.clear();
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
