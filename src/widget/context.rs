//! Hook context: what a widget can reach while one of its hooks runs.
//!
//! A [`WidgetContext`] is handed to every [`Widget`](super::Widget) hook. It
//! exposes the widget's own handle plus the framework operations a widget
//! performs on itself: managing children, registering scoped resources,
//! requesting its own close, and resolving services from the host.

use std::rc::Rc;

use super::lifecycle::LifecycleState;
use super::node::{ReleaseError, WidgetHandle, WidgetRef};
use super::subscription::CloseRequester;
use super::traits::Widget;
use crate::host::{HostError, WidgetHost};
use crate::pool::{ContainerId, InstanceId};

/// Framework access for the widget whose hook is running.
pub struct WidgetContext<'a> {
    widget: &'a WidgetRef,
}

impl<'a> WidgetContext<'a> {
    pub(crate) fn new(widget: &'a WidgetRef) -> Self {
        Self { widget }
    }

    /// Handle to the widget running the hook.
    pub fn widget(&self) -> &WidgetRef {
        self.widget
    }

    /// The widget's instance id.
    pub fn id(&self) -> InstanceId {
        self.widget.id()
    }

    /// The widget's current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.widget.state()
    }

    /// Snapshot of the widget's children.
    pub fn children(&self) -> Vec<WidgetRef> {
        self.widget.children()
    }

    /// Register a release action to run on the next deinitialize.
    pub fn add_resource<F>(&self, label: impl Into<String>, release: F)
    where
        F: FnOnce() -> Result<(), ReleaseError> + 'static,
    {
        self.widget.add_resource(label, release);
    }

    /// A cloneable handle for requesting this widget's close later.
    pub fn close_requester(&self) -> CloseRequester {
        self.widget.close_requester()
    }

    /// Ask the owner to close this widget on the next turn.
    pub fn request_close(&self, animated: bool) -> bool {
        self.widget.request_close(animated)
    }

    /// The host that lent this widget out.
    pub fn host(&self) -> Result<WidgetHost, HostError> {
        self.widget.host().ok_or(HostError::Detached {
            widget: self.widget.id(),
        })
    }

    // ── Children ─────────────────────────────────────────────────────

    /// Acquire a `W` and adopt it as a child without opening it.
    pub fn create_child<W: Widget>(&self, id: Option<&str>) -> Result<WidgetHandle<W>, HostError> {
        self.host()?.create_child::<W>(self.widget, id)
    }

    /// Acquire a `W`, adopt it, and start opening it with the host's
    /// animation default.
    pub fn open_child<W: Widget>(&self, id: Option<&str>) -> Result<WidgetHandle<W>, HostError> {
        self.host()?.open_child::<W>(self.widget, id)
    }

    /// Acquire a `W`, adopt it, and start opening it.
    pub fn open_child_with<W: Widget>(
        &self,
        id: Option<&str>,
        animated: bool,
    ) -> Result<WidgetHandle<W>, HostError> {
        self.host()?.open_child_with::<W>(self.widget, id, animated)
    }

    /// Like [`open_child_with`](Self::open_child_with), mounting the child
    /// under `container`.
    pub fn open_child_in<W: Widget>(
        &self,
        id: Option<&str>,
        container: ContainerId,
        animated: bool,
    ) -> Result<WidgetHandle<W>, HostError> {
        self.host()?.open_child_in::<W>(self.widget, id, container, animated)
    }

    /// Close one of this widget's children and return it to the pool.
    pub fn close_child(&self, child: &WidgetRef, animated: bool) -> Result<(), HostError> {
        self.host()?.close_child(self.widget, child, animated)
    }

    /// Open a top-level widget through the host.
    pub fn open<W: Widget>(&self, id: Option<&str>) -> Result<WidgetHandle<W>, HostError> {
        self.host()?.open::<W>(id)
    }

    // ── Services ─────────────────────────────────────────────────────

    /// Resolve a service from the host's registry.
    pub fn resolve<S: 'static>(&self, id: Option<&str>) -> Result<Rc<S>, HostError> {
        self.host()?.resolve::<S>(id)
    }

    /// Resolve a service, or `None` if the host or the service is missing.
    pub fn try_resolve<S: 'static>(&self, id: Option<&str>) -> Option<Rc<S>> {
        self.host().ok()?.try_resolve::<S>(id)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ProbeWidget;

    #[test]
    fn detached_widget_has_no_host() {
        let widget = WidgetRef::new(ProbeWidget::new("loose"));
        let ctx = WidgetContext::new(&widget);
        assert_eq!(ctx.id(), widget.id());
        assert_eq!(ctx.state(), LifecycleState::Pooled);
        assert_eq!(
            ctx.host().unwrap_err(),
            HostError::Detached { widget: widget.id() }
        );
        assert!(ctx.try_resolve::<String>(None).is_none());
        assert!(ctx.create_child::<ProbeWidget>(None).is_err());
    }

    #[test]
    fn resources_registered_through_context() {
        let widget = WidgetRef::new(ProbeWidget::new("owner"));
        let ctx = WidgetContext::new(&widget);
        ctx.add_resource("timer", || Ok(()));
        assert_eq!(widget.pending_resources(), 1);
    }
}
