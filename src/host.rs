//! WidgetHost: the façade that owns the pool, the service registry, and the
//! lifecycle tracker.
//!
//! [`WidgetHost`] lends widgets out of its pool, drives their open and close
//! transitions in the background, and wires every widget's close requests back
//! to whoever owns it (the host for top-level widgets, the parent for
//! children). Background work runs through `tokio::task::spawn_local`, so the
//! host must be driven from within a `tokio::task::LocalSet`.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::effect::Completion;
use crate::error::ErrorKind;
use crate::pool::{ContainerId, InstanceId, MountHost, PoolError, ResourcePool, Source, Stage};
use crate::registry::{RegistryError, ServiceRegistry};
use crate::widget::{
    CloseSubscription, LifecycleError, LifecycleEvent, LifecycleState, LifecycleTracker, Widget,
    WidgetHandle, WidgetRef,
};

// ---------------------------------------------------------------------------
// HostConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`WidgetHost`].
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Whether `open`/`close` play effects unless told otherwise.
    pub animated: bool,
    /// Name of the live container widgets are mounted under.
    pub root_name: String,
    /// Name of the pool's holding container for idle widgets.
    pub holding_name: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            animated: true,
            root_name: "root".to_owned(),
            holding_name: "holding".to_owned(),
        }
    }
}

impl HostConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default animation flag (builder).
    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    /// Set the live container name (builder).
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Set the holding container name (builder).
    pub fn with_holding_name(mut self, name: impl Into<String>) -> Self {
        self.holding_name = name.into();
        self
    }
}

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

/// Errors returned by [`WidgetHost`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// The widget was not lent out by a host, or its host is gone.
    #[error("widget {widget} is not attached to a host")]
    Detached { widget: InstanceId },
    /// `child` is not in `parent`'s child set.
    #[error("widget {child} is not a child of widget {parent}")]
    NotAChild { parent: InstanceId, child: InstanceId },
}

impl HostError {
    /// Where this error sits in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::Pool(err) => err.kind(),
            HostError::Registry(err) => err.kind(),
            HostError::Lifecycle(err) => err.kind(),
            HostError::Detached { .. } => ErrorKind::Configuration,
            HostError::NotAChild { .. } => ErrorKind::Lookup,
        }
    }
}

// ---------------------------------------------------------------------------
// HostShared
// ---------------------------------------------------------------------------

pub(crate) struct HostShared {
    config: HostConfig,
    pool: RefCell<ResourcePool<WidgetRef>>,
    services: RefCell<ServiceRegistry>,
    root: ContainerId,
    tracker: RefCell<LifecycleTracker>,
    subscriptions: RefCell<HashMap<InstanceId, CloseSubscription>>,
}

impl HostShared {
    fn acquire<W: Widget>(
        self: &Rc<Self>,
        id: Option<&str>,
        container: ContainerId,
    ) -> Result<WidgetRef, HostError> {
        let widget = self.pool.borrow_mut().acquire_into::<W>(id, container)?;
        widget.attach_host(Rc::downgrade(self));
        self.tracker.borrow_mut().on_acquire(widget.id());
        Ok(widget)
    }

    fn create_child<W: Widget>(
        self: &Rc<Self>,
        parent: &WidgetRef,
        id: Option<&str>,
        container: ContainerId,
    ) -> Result<WidgetRef, HostError> {
        let child = self.acquire::<W>(id, container)?;

        let host = Rc::downgrade(self);
        let owner = Rc::downgrade(&parent.0);
        let subscription = child.subscribe_close(move |child, animated| {
            let (Some(host), Some(owner)) = (host.upgrade(), owner.upgrade()) else {
                return;
            };
            let parent = WidgetRef::from_node(owner);
            if let Err(err) = WidgetHost::from_shared(host).close_child(&parent, child, animated) {
                warn!(parent = %parent.id(), child = %child.id(), error = %err, "child close request failed");
            }
        });
        parent.adopt(&child, subscription);

        if parent.state().is_active() {
            child.initialize();
        }
        Ok(child)
    }

    /// Drive an open completion in the background and record the join.
    ///
    /// Nothing is recorded if the widget was closed, or closed and reopened,
    /// before the group joined.
    fn spawn_open(self: &Rc<Self>, widget: &WidgetRef, completion: Completion) {
        let host = Rc::downgrade(self);
        let widget = widget.clone();
        let generation = widget.generation();
        tokio::task::spawn_local(async move {
            completion.await;
            if widget.generation() != generation || widget.state() != LifecycleState::Open {
                return;
            }
            if let Some(host) = host.upgrade() {
                host.tracker.borrow_mut().on_open(widget.id());
            }
        });
    }

    /// Teardown after a close group has joined: deinitialize, unsubscribe,
    /// detach from the parent, and return the subtree to the pool.
    fn retire(&self, widget: &WidgetRef) {
        let id = widget.id();
        self.tracker.borrow_mut().on_close(id);

        if let Err(err) = widget.deinitialize() {
            warn!(widget = %id, error = %err, "teardown finished with failures");
        }

        let subscription = self.subscriptions.borrow_mut().remove(&id);
        drop(subscription);
        if let Some(parent) = widget.parent() {
            parent.remove_child(widget);
        }

        self.release_subtree(widget);
    }

    /// Return `widget` and its descendants to the pool, leaves first.
    fn release_subtree(&self, widget: &WidgetRef) {
        for child in widget.take_children() {
            self.release_subtree(&child);
        }
        widget.reset_for_pool();
        let released = self.pool.borrow_mut().release(widget);
        if released {
            self.tracker.borrow_mut().on_release(widget.id());
        }
        debug!(widget = %widget.id(), released, "returned to pool");
    }
}

// ---------------------------------------------------------------------------
// WidgetHost
// ---------------------------------------------------------------------------

/// Façade over the pool, the service registry, and widget orchestration.
///
/// Cloning a `WidgetHost` yields another handle to the same host.
#[derive(Clone)]
pub struct WidgetHost {
    shared: Rc<HostShared>,
}

impl WidgetHost {
    /// Create a host with a fresh [`Stage`] as its mount host.
    pub fn new(config: HostConfig) -> Self {
        let mut stage = Stage::new();
        let root = stage.create_container(&config.root_name);
        let pool = ResourcePool::with_mount(stage, root, &config.holding_name);
        debug!(root = %config.root_name, holding = %config.holding_name, "host created");
        Self {
            shared: Rc::new(HostShared {
                config,
                pool: RefCell::new(pool),
                services: RefCell::new(ServiceRegistry::new()),
                root,
                tracker: RefCell::new(LifecycleTracker::new()),
                subscriptions: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Rc<HostShared>) -> Self {
        Self { shared }
    }

    /// The host's configuration.
    pub fn config(&self) -> &HostConfig {
        &self.shared.config
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Register a prototype `W`; every new instance is a
    /// [`duplicate`](Widget::duplicate) of it. Returns the binding id.
    pub fn register_widget<W: Widget>(
        &self,
        prototype: W,
        id: Option<&str>,
    ) -> Result<String, HostError> {
        let source = Source::Prototype(WidgetRef::new(prototype));
        Ok(self.shared.pool.borrow_mut().register::<W>(id, source)?)
    }

    /// Register a factory building new `W`s. Returns the binding id.
    pub fn register_widget_factory<W, F>(&self, factory: F, id: Option<&str>) -> Result<String, HostError>
    where
        W: Widget,
        F: Fn() -> Option<W> + 'static,
    {
        let source = Source::factory(move || factory().map(WidgetRef::new));
        Ok(self.shared.pool.borrow_mut().register::<W>(id, source)?)
    }

    /// Register a shared service instance.
    pub fn register_service<S: 'static>(&self, instance: S, id: Option<&str>) -> Result<(), HostError> {
        Ok(self.shared.services.borrow_mut().register(instance, id)?)
    }

    /// Register a service factory, run on every resolve.
    pub fn register_service_factory<S, F>(&self, factory: F, id: Option<&str>) -> Result<(), HostError>
    where
        S: 'static,
        F: Fn() -> S + 'static,
    {
        Ok(self.shared.services.borrow_mut().register_factory(factory, id)?)
    }

    /// Resolve a service.
    pub fn resolve<S: 'static>(&self, id: Option<&str>) -> Result<Rc<S>, HostError> {
        Ok(self.shared.services.borrow().resolve::<S>(id)?)
    }

    /// Resolve a service, or `None` on any failure.
    pub fn try_resolve<S: 'static>(&self, id: Option<&str>) -> Option<Rc<S>> {
        self.shared.services.borrow().try_resolve::<S>(id)
    }

    // ── Top-level widgets ────────────────────────────────────────────

    /// Open a `W` using the configured animation default.
    pub fn open<W: Widget>(&self, id: Option<&str>) -> Result<WidgetHandle<W>, HostError> {
        self.open_with::<W>(id, self.shared.config.animated)
    }

    /// Acquire a `W`, initialize it, and start opening it.
    ///
    /// Returns as soon as the open group has started; the group is driven in
    /// the background. The host subscribes to the widget's close requests.
    pub fn open_with<W: Widget>(
        &self,
        id: Option<&str>,
        animated: bool,
    ) -> Result<WidgetHandle<W>, HostError> {
        let widget = self.shared.acquire::<W>(id, self.shared.root)?;
        widget.initialize();
        let completion = widget.open(animated)?;

        let host = Rc::downgrade(&self.shared);
        let subscription = widget.subscribe_close(move |widget, animated| {
            let Some(host) = host.upgrade() else {
                return;
            };
            if let Err(err) = WidgetHost::from_shared(host).close_with(widget, animated) {
                warn!(widget = %widget.id(), error = %err, "close request failed");
            }
        });
        self.shared
            .subscriptions
            .borrow_mut()
            .insert(widget.id(), subscription);

        debug!(widget = %widget.id(), ty = %widget.widget_type(), animated, "opened top-level widget");
        self.shared.spawn_open(&widget, completion);
        Ok(WidgetHandle::new(widget))
    }

    /// Close a widget using the configured animation default.
    pub fn close(&self, widget: &WidgetRef) -> Result<(), HostError> {
        self.close_with(widget, self.shared.config.animated)
    }

    /// Start closing `widget`; once the close group joins, deinitialize it
    /// and return it (and its subtree) to the pool.
    ///
    /// Closing a widget that is already closing does nothing; the close in
    /// flight finishes the job.
    pub fn close_with(&self, widget: &WidgetRef, animated: bool) -> Result<(), HostError> {
        if widget.state() == LifecycleState::Closing {
            debug!(widget = %widget.id(), "close already in flight");
            return Ok(());
        }
        let completion = widget.close(animated)?;

        let host = Rc::clone(&self.shared);
        let widget = widget.clone();
        tokio::task::spawn_local(async move {
            completion.await;
            host.retire(&widget);
        });
        Ok(())
    }

    // ── Children ─────────────────────────────────────────────────────

    /// Acquire a `W` and adopt it under `parent` without opening it.
    ///
    /// The child is initialized right away when the parent is active.
    pub fn create_child<W: Widget>(
        &self,
        parent: &WidgetRef,
        id: Option<&str>,
    ) -> Result<WidgetHandle<W>, HostError> {
        let child = self.shared.create_child::<W>(parent, id, self.shared.root)?;
        Ok(WidgetHandle::new(child))
    }

    /// Acquire a `W`, adopt it under `parent`, and start opening it using the
    /// configured animation default.
    pub fn open_child<W: Widget>(
        &self,
        parent: &WidgetRef,
        id: Option<&str>,
    ) -> Result<WidgetHandle<W>, HostError> {
        self.open_child_with::<W>(parent, id, self.shared.config.animated)
    }

    /// Acquire a `W`, adopt it under `parent`, and start opening it.
    pub fn open_child_with<W: Widget>(
        &self,
        parent: &WidgetRef,
        id: Option<&str>,
        animated: bool,
    ) -> Result<WidgetHandle<W>, HostError> {
        self.open_child_in::<W>(parent, id, self.shared.root, animated)
    }

    /// Like [`open_child_with`](Self::open_child_with), mounting the child
    /// under `container`.
    pub fn open_child_in<W: Widget>(
        &self,
        parent: &WidgetRef,
        id: Option<&str>,
        container: ContainerId,
        animated: bool,
    ) -> Result<WidgetHandle<W>, HostError> {
        let child = self.shared.create_child::<W>(parent, id, container)?;
        child.initialize();
        let completion = child.open(animated)?;
        self.shared.spawn_open(&child, completion);
        Ok(WidgetHandle::new(child))
    }

    /// Close `child` of `parent`. The child stays in the parent's child set
    /// until its close group has joined.
    pub fn close_child(
        &self,
        parent: &WidgetRef,
        child: &WidgetRef,
        animated: bool,
    ) -> Result<(), HostError> {
        if !parent.has_child(child) {
            return Err(HostError::NotAChild {
                parent: parent.id(),
                child: child.id(),
            });
        }
        self.close_with(child, animated)
    }

    // ── Mounting ─────────────────────────────────────────────────────

    /// Create an additional mount point on the stage.
    pub fn create_container(&self, name: &str) -> ContainerId {
        self.shared.pool.borrow_mut().mount_mut().create_container(name)
    }

    /// The live container top-level widgets are mounted under.
    pub fn root(&self) -> ContainerId {
        self.shared.root
    }

    /// The pool's holding container.
    pub fn holding_area(&self) -> ContainerId {
        self.shared.pool.borrow().holding_area()
    }

    /// The container `widget` is currently attached to.
    pub fn placement_of(&self, widget: &WidgetRef) -> Option<ContainerId> {
        self.shared.pool.borrow().mount().container_of(widget.id())
    }

    /// Read access to the pool (bookkeeping and stage).
    pub fn pool(&self) -> Ref<'_, ResourcePool<WidgetRef>> {
        self.shared.pool.borrow()
    }

    // ── Tracking ─────────────────────────────────────────────────────

    /// Drain the lifecycle events recorded since the last drain.
    pub fn drain_events(&self) -> Vec<LifecycleEvent> {
        self.shared.tracker.borrow_mut().pending_events()
    }

    /// Number of widgets currently lent out by this host.
    pub fn live_count(&self) -> usize {
        self.shared.tracker.borrow().live_count()
    }

    /// Whether `widget` is currently lent out by this host.
    pub fn is_live(&self, widget: &WidgetRef) -> bool {
        self.shared.tracker.borrow().is_live(widget.id())
    }

    /// Ids of every widget currently lent out, ascending.
    pub fn live_widgets(&self) -> Vec<InstanceId> {
        self.shared.tracker.borrow().live_widgets()
    }
}

impl Default for WidgetHost {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl std::fmt::Debug for WidgetHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHost")
            .field("config", &self.shared.config)
            .field("pool", &*self.shared.pool.borrow())
            .field("services", &*self.shared.services.borrow())
            .field("live", &self.live_count())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
