//! Widget nodes: per-instance state behind a shared handle.
//!
//! A [`WidgetRef`] is a cheap, cloneable handle to one widget instance. The
//! node behind it owns the widget's behaviour (`Box<dyn Widget>`), its lazily
//! built effects index, its children, its scoped resources, its close-request
//! subscriber and its published [`LifecycleState`].
//!
//! [`WidgetHandle<W>`] is the typed view returned by the host: it derefs to
//! the untyped `WidgetRef` and adds `borrow`/`borrow_mut` on the concrete
//! widget.

use std::any::TypeId;
use std::cell::{Cell, OnceCell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use futures::future::{FutureExt, Shared};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::context::WidgetContext;
use super::lifecycle::{LifecycleError, LifecycleState, ReleaseFailure};
use super::subscription::{CloseSubscription, Subscriber};
use super::traits::Widget;
use crate::effect::{Completion, EffectCategorySet, EffectIndex, EffectRef, UnknownCategory};
use crate::host::{HostShared, WidgetHost};
use crate::pool::{InstanceId, Poolable};

/// Error returned by a scoped resource's release action.
pub type ReleaseError = Box<dyn std::error::Error>;

pub(crate) struct ScopedResource {
    label: String,
    release: Box<dyn FnOnce() -> Result<(), ReleaseError>>,
}

// ---------------------------------------------------------------------------
// WidgetNode
// ---------------------------------------------------------------------------

pub(crate) struct WidgetNode {
    pub(crate) id: InstanceId,
    pub(crate) type_name: String,
    pub(crate) runtime_type: TypeId,
    pub(crate) behavior: RefCell<Box<dyn Widget>>,
    pub(crate) effects: OnceCell<EffectIndex>,
    pub(crate) children: RefCell<Vec<WidgetRef>>,
    pub(crate) child_subscriptions: RefCell<HashMap<InstanceId, CloseSubscription>>,
    pub(crate) resources: RefCell<Vec<ScopedResource>>,
    pub(crate) close_subscriber: RefCell<Option<Subscriber>>,
    pub(crate) next_token: Cell<u64>,
    pub(crate) parent: RefCell<Weak<WidgetNode>>,
    pub(crate) host: RefCell<Weak<HostShared>>,
    pub(crate) state: watch::Sender<LifecycleState>,
    /// Group of the open in flight, joined by a close that interrupts it.
    pub(crate) open_group: RefCell<Option<Shared<Completion>>>,
    /// Bumped on every open; stale open completions compare against it.
    pub(crate) generation: Cell<u64>,
}

// ---------------------------------------------------------------------------
// WidgetRef
// ---------------------------------------------------------------------------

/// Shared handle to a widget instance.
///
/// Equality is identity: two handles are equal when they point at the same
/// instance.
#[derive(Clone)]
pub struct WidgetRef(pub(crate) Rc<WidgetNode>);

impl WidgetRef {
    /// Wrap a widget in a fresh, pooled node.
    pub fn new<W: Widget>(widget: W) -> Self {
        Self::from_box(Box::new(widget))
    }

    /// Wrap an already boxed widget in a fresh, pooled node.
    pub fn from_box(behavior: Box<dyn Widget>) -> Self {
        let type_name = behavior.widget_type().to_owned();
        let runtime_type = behavior.as_any().type_id();
        let (state, _) = watch::channel(LifecycleState::Pooled);
        Self(Rc::new(WidgetNode {
            id: InstanceId::next(),
            type_name,
            runtime_type,
            behavior: RefCell::new(behavior),
            effects: OnceCell::new(),
            children: RefCell::new(Vec::new()),
            child_subscriptions: RefCell::new(HashMap::new()),
            resources: RefCell::new(Vec::new()),
            close_subscriber: RefCell::new(None),
            next_token: Cell::new(0),
            parent: RefCell::new(Weak::new()),
            host: RefCell::new(Weak::new()),
            state,
            open_group: RefCell::new(None),
            generation: Cell::new(0),
        }))
    }

    pub(crate) fn from_node(node: Rc<WidgetNode>) -> Self {
        Self(node)
    }

    /// Unique runtime identity of this instance.
    pub fn id(&self) -> InstanceId {
        self.0.id
    }

    /// The widget's type name, as reported by [`Widget::widget_type`].
    pub fn widget_type(&self) -> &str {
        &self.0.type_name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.0.state.borrow()
    }

    /// A completion that resolves once the widget reaches `state`.
    ///
    /// Resolves immediately if the widget is already there.
    pub fn wait_for_state(&self, state: LifecycleState) -> Completion {
        let mut rx = self.0.state.subscribe();
        Box::pin(async move {
            let _ = rx.wait_for(|current| *current == state).await;
        })
    }

    /// Whether the concrete widget type is `W`.
    pub fn is<W: Widget>(&self) -> bool {
        self.0.runtime_type == TypeId::of::<W>()
    }

    /// A typed handle, if the concrete widget type is `W`.
    pub fn downcast<W: Widget>(&self) -> Option<WidgetHandle<W>> {
        self.is::<W>().then(|| WidgetHandle::new(self.clone()))
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &WidgetRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ── Tree ─────────────────────────────────────────────────────────

    /// Snapshot of the current children, in adoption order.
    pub fn children(&self) -> Vec<WidgetRef> {
        self.0.children.borrow().clone()
    }

    /// Whether `child` is currently in this widget's child set.
    pub fn has_child(&self, child: &WidgetRef) -> bool {
        self.0.children.borrow().iter().any(|c| c.ptr_eq(child))
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    /// The widget this one was adopted by, if any.
    pub fn parent(&self) -> Option<WidgetRef> {
        self.0.parent.borrow().upgrade().map(WidgetRef)
    }

    /// The category set of the effects index, once it has been built.
    pub fn effect_categories(&self) -> Option<EffectCategorySet> {
        self.0.effects.get().map(|index| index.categories().clone())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Build the effects index (once per instance), run the initialize hook,
    /// then initialize children depth-first.
    ///
    /// No-op while the widget is initialized or live.
    pub fn initialize(&self) {
        if self.state().is_active() {
            return;
        }
        self.0.effects.get_or_init(|| {
            let behavior = self.0.behavior.borrow();
            let categories = EffectCategorySet::with_custom(behavior.custom_effect_categories());
            EffectIndex::build(categories, &behavior.effects())
        });
        self.set_state(LifecycleState::Initialized);
        debug!(widget = %self.id(), ty = %self.widget_type(), "initialized");

        self.run_hook(|widget, ctx| widget.on_initialize(ctx));
        for child in self.children() {
            child.initialize();
        }
    }

    /// Run the teardown hook, deinitialize children, then release scoped
    /// resources in registration order.
    ///
    /// Every release action runs exactly once even when earlier ones fail;
    /// failures from the whole subtree are reported together afterwards.
    /// No-op unless the widget is initialized or live.
    pub fn deinitialize(&self) -> Result<(), LifecycleError> {
        if !self.state().is_active() {
            return Ok(());
        }
        self.run_hook(|widget, ctx| widget.on_deinitialize(ctx));

        let mut failures = Vec::new();
        for child in self.children() {
            if let Err(LifecycleError::ResourceRelease { failures: nested }) = child.deinitialize() {
                failures.extend(nested);
            }
        }

        let resources = std::mem::take(&mut *self.0.resources.borrow_mut());
        for ScopedResource { label, release } in resources {
            if let Err(err) = release() {
                warn!(widget = %self.id(), %label, error = %err, "scoped resource failed to release");
                failures.push(ReleaseFailure {
                    widget: self.id(),
                    label,
                    message: err.to_string(),
                });
            }
        }

        self.set_state(LifecycleState::DeInitialized);
        debug!(widget = %self.id(), failures = failures.len(), "deinitialized");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::ResourceRelease { failures })
        }
    }

    /// Select effects by category, deduplicated, in first-seen order.
    ///
    /// Fails with `NotInitialized` before the effects index exists and with
    /// `UnknownEffectCategory` for any category outside the widget's set.
    pub fn select_by_categories<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<EffectRef>, LifecycleError> {
        let index = self
            .0
            .effects
            .get()
            .ok_or(LifecycleError::NotInitialized { widget: self.id() })?;
        index
            .select(names)
            .map_err(|UnknownCategory(category)| LifecycleError::UnknownEffectCategory {
                widget: self.id(),
                category,
            })
    }

    /// Register a release action to run on the next deinitialize.
    pub fn add_resource<F>(&self, label: impl Into<String>, release: F)
    where
        F: FnOnce() -> Result<(), ReleaseError> + 'static,
    {
        self.0.resources.borrow_mut().push(ScopedResource {
            label: label.into(),
            release: Box::new(release),
        });
    }

    /// Number of scoped resources waiting for release.
    pub fn pending_resources(&self) -> usize {
        self.0.resources.borrow().len()
    }

    // ── Crate internals ──────────────────────────────────────────────

    /// Run a hook against the behaviour with a context for this widget.
    ///
    /// The behaviour stays mutably borrowed for the duration of the hook.
    pub(crate) fn run_hook<R>(&self, hook: impl FnOnce(&mut dyn Widget, &WidgetContext<'_>) -> R) -> R {
        let ctx = WidgetContext::new(self);
        let mut behavior = self.0.behavior.borrow_mut();
        hook(behavior.as_mut(), &ctx)
    }

    pub(crate) fn set_state(&self, state: LifecycleState) {
        self.0.state.send_replace(state);
    }

    /// Move `from → to`, but only if nothing else changed the state meanwhile.
    pub(crate) fn finish_transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        let moved = self.0.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if moved {
            debug!(widget = %self.id(), state = %to, "transition finished");
        }
        moved
    }

    /// Stamp a new open transition and keep its group joinable.
    pub(crate) fn begin_open(&self, group: Completion) -> (u64, Shared<Completion>) {
        let generation = self.0.generation.get() + 1;
        self.0.generation.set(generation);
        let group = group.shared();
        *self.0.open_group.borrow_mut() = Some(group.clone());
        (generation, group)
    }

    /// The open generation the widget is currently in.
    pub(crate) fn generation(&self) -> u64 {
        self.0.generation.get()
    }

    pub(crate) fn take_open_group(&self) -> Option<Shared<Completion>> {
        self.0.open_group.borrow_mut().take()
    }

    /// A completion that resolves once the state is no longer `from`.
    pub(crate) fn settled_from(&self, from: LifecycleState) -> Completion {
        let mut rx = self.0.state.subscribe();
        Box::pin(async move {
            let _ = rx.wait_for(|current| *current != from).await;
        })
    }

    pub(crate) fn adopt(&self, child: &WidgetRef, subscription: CloseSubscription) {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0
            .child_subscriptions
            .borrow_mut()
            .insert(child.id(), subscription);
        self.0.children.borrow_mut().push(child.clone());
        debug!(parent = %self.id(), child = %child.id(), "adopted child");
    }

    /// Drop `child` from the child set and unsubscribe from its close requests.
    pub(crate) fn remove_child(&self, child: &WidgetRef) -> bool {
        let subscription = self.0.child_subscriptions.borrow_mut().remove(&child.id());
        drop(subscription);
        let mut children = self.0.children.borrow_mut();
        let before = children.len();
        children.retain(|c| !c.ptr_eq(child));
        let removed = children.len() != before;
        if removed {
            *child.0.parent.borrow_mut() = Weak::new();
        }
        removed
    }

    /// Detach every child, dropping their close subscriptions.
    pub(crate) fn take_children(&self) -> Vec<WidgetRef> {
        let subscriptions = std::mem::take(&mut *self.0.child_subscriptions.borrow_mut());
        drop(subscriptions);
        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in &children {
            *child.0.parent.borrow_mut() = Weak::new();
        }
        children
    }

    pub(crate) fn attach_host(&self, host: Weak<HostShared>) {
        *self.0.host.borrow_mut() = host;
    }

    pub(crate) fn host(&self) -> Option<WidgetHost> {
        self.0.host.borrow().upgrade().map(WidgetHost::from_shared)
    }

    /// Return the node to a blank, reusable state. Children must already be taken.
    pub(crate) fn reset_for_pool(&self) {
        *self.0.close_subscriber.borrow_mut() = None;
        *self.0.parent.borrow_mut() = Weak::new();
        self.0.resources.borrow_mut().clear();
        *self.0.open_group.borrow_mut() = None;
        self.set_state(LifecycleState::Pooled);
    }
}

impl PartialEq for WidgetRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for WidgetRef {}

impl fmt::Debug for WidgetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRef")
            .field("id", &self.id())
            .field("type", &self.widget_type())
            .field("state", &self.state())
            .field("children", &self.child_count())
            .finish()
    }
}

impl Poolable for WidgetRef {
    fn instance_id(&self) -> InstanceId {
        self.id()
    }

    fn runtime_type(&self) -> TypeId {
        self.0.runtime_type
    }

    fn instantiate(&self) -> Option<Self> {
        let copy = self.0.behavior.borrow().duplicate()?;
        Some(WidgetRef::from_box(copy))
    }
}

// ---------------------------------------------------------------------------
// WidgetHandle
// ---------------------------------------------------------------------------

/// Typed handle to a widget instance whose concrete type is `W`.
pub struct WidgetHandle<W: Widget> {
    widget: WidgetRef,
    _marker: PhantomData<fn() -> W>,
}

impl<W: Widget> WidgetHandle<W> {
    /// The caller guarantees the concrete type is `W`.
    pub(crate) fn new(widget: WidgetRef) -> Self {
        debug_assert!(widget.is::<W>());
        Self {
            widget,
            _marker: PhantomData,
        }
    }

    /// The untyped handle.
    pub fn widget(&self) -> &WidgetRef {
        &self.widget
    }

    /// Drop the type information.
    pub fn into_widget(self) -> WidgetRef {
        self.widget
    }

    /// Borrow the concrete widget. Panics if a hook currently holds it.
    pub fn borrow(&self) -> Ref<'_, W> {
        Ref::map(self.widget.0.behavior.borrow(), |behavior| {
            behavior
                .as_any()
                .downcast_ref::<W>()
                .expect("widget type mismatch")
        })
    }

    /// Mutably borrow the concrete widget. Panics if it is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, W> {
        RefMut::map(self.widget.0.behavior.borrow_mut(), |behavior| {
            behavior
                .as_any_mut()
                .downcast_mut::<W>()
                .expect("widget type mismatch")
        })
    }
}

impl<W: Widget> Deref for WidgetHandle<W> {
    type Target = WidgetRef;

    fn deref(&self) -> &WidgetRef {
        &self.widget
    }
}

impl<W: Widget> Clone for WidgetHandle<W> {
    fn clone(&self) -> Self {
        Self::new(self.widget.clone())
    }
}

impl<W: Widget> fmt::Debug for WidgetHandle<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WidgetHandle").field(&self.widget).finish()
    }
}

impl<W: Widget> From<WidgetHandle<W>> for WidgetRef {
    fn from(handle: WidgetHandle<W>) -> Self {
        handle.widget
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::category::{CLOSE, OPEN, OPEN_FORWARD_CLOSE_BACKWARD};
    use crate::testing::{Journal, ProbeWidget, ScriptedEffect};
    use pretty_assertions::assert_eq;
    use std::fmt::Write as _;

    fn probe(name: &str) -> WidgetRef {
        WidgetRef::new(ProbeWidget::new(name))
    }

    #[test]
    fn new_node_is_pooled() {
        let widget = probe("a");
        assert_eq!(widget.state(), LifecycleState::Pooled);
        assert_eq!(widget.widget_type(), "ProbeWidget");
        assert!(widget.is::<ProbeWidget>());
        assert!(widget.effect_categories().is_none());
        assert!(widget.parent().is_none());
    }

    #[test]
    fn identity_equality() {
        let a = probe("a");
        let b = probe("b");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn initialize_builds_index_once_and_is_idempotent() {
        let journal = Journal::new();
        let widget = WidgetRef::new(
            ProbeWidget::new("screen")
                .with_journal(&journal)
                .with_custom_categories(["Pulse"]),
        );

        widget.initialize();
        widget.initialize();
        assert_eq!(widget.state(), LifecycleState::Initialized);
        assert_eq!(journal.entries(), vec!["screen:initialize"]);

        let categories = widget.effect_categories().unwrap();
        assert!(categories.contains("Pulse"));
        assert!(categories.contains(OPEN));
    }

    #[test]
    fn effects_index_survives_reuse() {
        let effect = ScriptedEffect::instant([OPEN]);
        let widget = WidgetRef::new(ProbeWidget::new("a").with_effect(effect.clone()));
        widget.initialize();
        let first = widget.select_by_categories(&[OPEN]).unwrap();

        widget.deinitialize().unwrap();
        widget.reset_for_pool();
        widget.initialize();
        let second = widget.select_by_categories(&[OPEN]).unwrap();
        assert!(Rc::ptr_eq(&first[0], &second[0]));
    }

    #[test]
    fn select_before_initialize_fails() {
        let widget = probe("a");
        let err = widget.select_by_categories(&[OPEN]).err().expect("expected error");
        assert_eq!(err, LifecycleError::NotInitialized { widget: widget.id() });
    }

    #[test]
    fn select_unknown_category_fails() {
        let widget = probe("a");
        widget.initialize();
        let err = widget.select_by_categories(&[CLOSE, "Wobble"]).err().expect("expected error");
        assert_eq!(
            err,
            LifecycleError::UnknownEffectCategory {
                widget: widget.id(),
                category: "Wobble".into()
            }
        );
    }

    #[test]
    fn select_deduplicates_in_first_seen_order() {
        let a = ScriptedEffect::instant([OPEN]);
        let b = ScriptedEffect::instant([OPEN, OPEN_FORWARD_CLOSE_BACKWARD]);
        let widget = WidgetRef::new(
            ProbeWidget::new("a")
                .with_effect(a.clone())
                .with_effect(b.clone()),
        );
        widget.initialize();

        let selected = widget
            .select_by_categories(&[OPEN_FORWARD_CLOSE_BACKWARD, OPEN])
            .unwrap();
        assert_eq!(selected.len(), 2);
        assert!(Rc::ptr_eq(&selected[0], &(b as EffectRef)));
        assert!(Rc::ptr_eq(&selected[1], &(a as EffectRef)));
    }

    #[test]
    fn deinitialize_order_hook_children_resources() {
        let journal = Journal::new();
        let parent = WidgetRef::new(ProbeWidget::new("parent").with_journal(&journal));
        let child = WidgetRef::new(ProbeWidget::new("child").with_journal(&journal));
        let subscription = child.subscribe_close(|_, _| {});
        parent.adopt(&child, subscription);

        let log = journal.clone();
        parent.add_resource("first", move || {
            log.record("parent:release first");
            Ok(())
        });
        let log = journal.clone();
        parent.add_resource("second", move || {
            log.record("parent:release second");
            Ok(())
        });

        parent.initialize();
        journal.take();
        parent.deinitialize().unwrap();

        assert_eq!(
            journal.entries(),
            vec![
                "parent:deinitialize",
                "child:deinitialize",
                "parent:release first",
                "parent:release second",
            ]
        );
        assert_eq!(parent.state(), LifecycleState::DeInitialized);
        assert_eq!(child.state(), LifecycleState::DeInitialized);
        assert_eq!(parent.pending_resources(), 0);
    }

    #[test]
    fn deinitialize_collects_every_failure() {
        let calls = Rc::new(Cell::new(0));
        let widget = probe("a");
        for label in ["one", "two", "three"] {
            let calls = Rc::clone(&calls);
            widget.add_resource(label, move || {
                calls.set(calls.get() + 1);
                if label == "two" {
                    Ok(())
                } else {
                    Err(format!("{label} is stuck").into())
                }
            });
        }
        widget.initialize();

        let err = widget.deinitialize().unwrap_err();
        assert_eq!(calls.get(), 3);
        let LifecycleError::ResourceRelease { failures } = err else {
            panic!("expected a release error");
        };
        let mut summary = String::new();
        for failure in &failures {
            writeln!(summary, "{}: {}", failure.label, failure.message).unwrap();
        }
        assert_eq!(summary, "one: one is stuck\nthree: three is stuck\n");
        assert_eq!(widget.state(), LifecycleState::DeInitialized);

        // Each action ran exactly once; a second teardown has nothing to do.
        widget.deinitialize().unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn deinitialize_reports_child_failures() {
        let parent = probe("parent");
        let child = probe("child");
        child.add_resource("socket", || Err("busy".into()));
        let subscription = child.subscribe_close(|_, _| {});
        parent.adopt(&child, subscription);
        parent.initialize();

        let err = parent.deinitialize().unwrap_err();
        assert_eq!(
            err,
            LifecycleError::ResourceRelease {
                failures: vec![ReleaseFailure {
                    widget: child.id(),
                    label: "socket".into(),
                    message: "busy".into(),
                }]
            }
        );
    }

    #[test]
    fn deinitialize_inactive_is_noop() {
        let journal = Journal::new();
        let widget = WidgetRef::new(ProbeWidget::new("a").with_journal(&journal));
        widget.deinitialize().unwrap();
        assert!(journal.entries().is_empty());
        assert_eq!(widget.state(), LifecycleState::Pooled);
    }

    #[test]
    fn adopt_and_remove_child() {
        let parent = probe("parent");
        let child = probe("child");
        let subscription = child.subscribe_close(|_, _| {});
        parent.adopt(&child, subscription);

        assert!(parent.has_child(&child));
        assert_eq!(child.parent(), Some(parent.clone()));
        assert!(child.has_close_subscriber());

        assert!(parent.remove_child(&child));
        assert!(!parent.has_child(&child));
        assert!(child.parent().is_none());
        assert!(!child.has_close_subscriber());
        assert!(!parent.remove_child(&child));
    }

    #[test]
    fn take_children_empties_the_set() {
        let parent = probe("parent");
        for name in ["a", "b"] {
            let child = probe(name);
            let subscription = child.subscribe_close(|_, _| {});
            parent.adopt(&child, subscription);
        }
        let children = parent.take_children();
        assert_eq!(children.len(), 2);
        assert_eq!(parent.child_count(), 0);
        assert!(children.iter().all(|c| c.parent().is_none()));
    }

    #[test]
    fn instantiate_duplicates_behaviour() {
        let prototype = WidgetRef::new(ProbeWidget::new("proto"));
        let copy = prototype.instantiate().unwrap();
        assert_ne!(copy.id(), prototype.id());
        assert!(copy.is::<ProbeWidget>());
        assert_eq!(copy.runtime_type(), TypeId::of::<ProbeWidget>());
        assert_eq!(copy.state(), LifecycleState::Pooled);
    }

    #[test]
    fn handle_borrows_concrete_widget() {
        let widget = probe("typed");
        let handle = widget.downcast::<ProbeWidget>().unwrap();
        assert_eq!(handle.borrow().name(), "typed");
        handle.borrow_mut().set_name("renamed");
        assert_eq!(handle.borrow().name(), "renamed");
        assert_eq!(handle.id(), widget.id());
        assert_eq!(WidgetRef::from(handle.clone()), widget);
    }

    #[test]
    fn wait_for_state_resolves_on_change() {
        let widget = probe("a");
        let mut wait = tokio_test::task::spawn(widget.wait_for_state(LifecycleState::Initialized));
        tokio_test::assert_pending!(wait.poll());
        widget.initialize();
        tokio_test::assert_ready!(wait.poll());
    }

    #[test]
    fn finish_transition_only_from_expected_state() {
        let widget = probe("a");
        widget.initialize();
        assert!(!widget.finish_transition(LifecycleState::Opening, LifecycleState::Open));
        assert_eq!(widget.state(), LifecycleState::Initialized);
        widget.set_state(LifecycleState::Opening);
        assert!(widget.finish_transition(LifecycleState::Opening, LifecycleState::Open));
        assert_eq!(widget.state(), LifecycleState::Open);
    }
}
