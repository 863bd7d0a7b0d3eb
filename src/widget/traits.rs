//! Widget trait: effect catalogue, lifecycle hooks, duplication.
//!
//! The `Widget` trait is what application code implements for each screen or
//! panel. The framework owns everything else about an instance (children,
//! scoped resources, effects index, state); the trait only supplies the
//! widget's own configuration and hooks. The `WidgetExt` trait adds helpers
//! for common implementations.

use std::any::Any;

use super::context::WidgetContext;
use crate::effect::{completed, Completion, EffectRef};

// ---------------------------------------------------------------------------
// Widget trait
// ---------------------------------------------------------------------------

/// Core trait implemented by every pooled widget.
///
/// Widget is object-safe. Hooks take `&mut self` plus a [`WidgetContext`] for
/// reaching the framework (children, resources, services, close requests).
/// The futures returned by `on_open`/`on_close` must not borrow the widget.
pub trait Widget: Any {
    /// A short type name for logs and debugging (e.g. "Screen", "Dialog").
    fn widget_type(&self) -> &str;

    /// Custom effect categories, in addition to the built-in ones.
    ///
    /// Read once, when the effects index is built.
    fn custom_effect_categories(&self) -> Vec<String> {
        Vec::new()
    }

    /// The effects attached to this widget.
    ///
    /// Read once, when the effects index is built.
    fn effects(&self) -> Vec<EffectRef> {
        Vec::new()
    }

    /// Called on initialize, before any child is initialized.
    fn on_initialize(&mut self, _ctx: &WidgetContext<'_>) {}

    /// Called on deinitialize, before children are torn down and before
    /// scoped resources are released.
    fn on_deinitialize(&mut self, _ctx: &WidgetContext<'_>) {}

    /// Member of the open group. Defaults to an already-finished completion.
    fn on_open(&mut self, _ctx: &WidgetContext<'_>) -> Completion {
        completed()
    }

    /// Member of the close group. Defaults to an already-finished completion.
    fn on_close(&mut self, _ctx: &WidgetContext<'_>) -> Completion {
        completed()
    }

    /// A fresh copy of this widget, used when it is registered as a prototype.
    ///
    /// Defaults to `None`, which makes prototype acquisition fail with
    /// `InstanceUnavailable`. Clone-able widgets can return
    /// [`WidgetExt::boxed_clone`].
    fn duplicate(&self) -> Option<Box<dyn Widget>> {
        None
    }

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for mutable runtime type inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// WidgetExt
// ---------------------------------------------------------------------------

/// Extension helpers, implemented for every `Widget`.
pub trait WidgetExt: Widget {
    /// Box a clone of this widget; the usual body of [`Widget::duplicate`].
    fn boxed_clone(&self) -> Option<Box<dyn Widget>>
    where
        Self: Clone + Sized,
    {
        Some(Box::new(self.clone()))
    }
}

// Blanket implementation: every Widget gets WidgetExt for free.
impl<T: Widget> WidgetExt for T {}

// ===========================================================================
// Tests
// ===========================================================================
