//! Close requests: a widget asks its owner (parent or host) to close it.
//!
//! The owner subscribes with a handler when it takes the widget on; the
//! returned [`CloseSubscription`] unsubscribes when dropped. A widget holds at
//! most one subscriber, so subscribing again replaces the previous one.
//!
//! Requests are delivered on the next turn of the local task set, never from
//! inside the caller. This lets a widget ask to be closed from one of its own
//! hooks.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::node::{WidgetNode, WidgetRef};

/// Handler run when a close request arrives: `(widget, animated)`.
pub type CloseHandler = Rc<dyn Fn(&WidgetRef, bool)>;

pub(crate) struct Subscriber {
    pub(crate) token: u64,
    pub(crate) handler: CloseHandler,
}

// ---------------------------------------------------------------------------
// CloseSubscription
// ---------------------------------------------------------------------------

/// Live subscription to a widget's close requests.
#[must_use = "dropping a CloseSubscription unsubscribes immediately"]
pub struct CloseSubscription {
    node: Weak<WidgetNode>,
    token: u64,
}

impl CloseSubscription {
    /// The widget this subscription listens to, while it is alive.
    pub fn widget(&self) -> Option<WidgetRef> {
        self.node.upgrade().map(WidgetRef::from_node)
    }

    /// Whether this subscription is still the widget's subscriber.
    pub fn is_active(&self) -> bool {
        let Some(node) = self.node.upgrade() else {
            return false;
        };
        let active = node
            .close_subscriber
            .borrow()
            .as_ref()
            .is_some_and(|s| s.token == self.token);
        active
    }
}

impl Drop for CloseSubscription {
    fn drop(&mut self) {
        let Some(node) = self.node.upgrade() else {
            return;
        };
        let mut slot = node.close_subscriber.borrow_mut();
        if slot.as_ref().is_some_and(|s| s.token == self.token) {
            *slot = None;
        }
    }
}

impl fmt::Debug for CloseSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseSubscription")
            .field("token", &self.token)
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CloseRequester
// ---------------------------------------------------------------------------

/// Cloneable handle that asks a widget's owner to close it.
///
/// Holds the widget weakly, so it can be captured by callbacks that outlive
/// the widget's time on screen.
#[derive(Clone)]
pub struct CloseRequester {
    node: Weak<WidgetNode>,
}

impl CloseRequester {
    /// Queue a close request for delivery on the next turn.
    ///
    /// Returns `false` if the widget is gone or nobody is subscribed. A
    /// request queued for a subscriber that is replaced or dropped before
    /// delivery is discarded. Must be called from within a
    /// `tokio::task::LocalSet`.
    pub fn request(&self, animated: bool) -> bool {
        let Some(node) = self.node.upgrade() else {
            return false;
        };
        let widget = WidgetRef::from_node(node);
        let token = widget
            .0
            .close_subscriber
            .borrow()
            .as_ref()
            .map(|s| s.token);
        let Some(token) = token else {
            warn!(widget = %widget.id(), "close requested without a subscriber");
            return false;
        };

        debug!(widget = %widget.id(), animated, "close requested");
        tokio::task::spawn_local(async move {
            let handler = widget
                .0
                .close_subscriber
                .borrow()
                .as_ref()
                .filter(|s| s.token == token)
                .map(|s| Rc::clone(&s.handler));
            match handler {
                Some(handler) => handler(&widget, animated),
                None => debug!(widget = %widget.id(), "close request dropped, subscriber changed"),
            }
        });
        true
    }

    /// The widget this requester targets, while it is alive.
    pub fn widget(&self) -> Option<WidgetRef> {
        self.node.upgrade().map(WidgetRef::from_node)
    }
}

impl fmt::Debug for CloseRequester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseRequester")
            .field("alive", &(self.node.strong_count() > 0))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// WidgetRef integration
// ---------------------------------------------------------------------------

impl WidgetRef {
    /// Subscribe `handler` to this widget's close requests, replacing any
    /// previous subscriber.
    pub fn subscribe_close<F>(&self, handler: F) -> CloseSubscription
    where
        F: Fn(&WidgetRef, bool) + 'static,
    {
        let token = self.0.next_token.get() + 1;
        self.0.next_token.set(token);
        *self.0.close_subscriber.borrow_mut() = Some(Subscriber {
            token,
            handler: Rc::new(handler),
        });
        CloseSubscription {
            node: Rc::downgrade(&self.0),
            token,
        }
    }

    /// Whether anyone is subscribed to this widget's close requests.
    pub fn has_close_subscriber(&self) -> bool {
        self.0.close_subscriber.borrow().is_some()
    }

    /// A detachable handle for requesting this widget's close.
    pub fn close_requester(&self) -> CloseRequester {
        CloseRequester {
            node: Rc::downgrade(&self.0),
        }
    }

    /// Ask the owner to close this widget. See [`CloseRequester::request`].
    pub fn request_close(&self, animated: bool) -> bool {
        self.close_requester().request(animated)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
