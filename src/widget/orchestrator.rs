//! Open/close orchestration over a widget subtree.
//!
//! A transition builds one join group: the widget's own hook, the same
//! transition on each eligible child, and the effects selected for the
//! transition. Every member is started while the group is built; the returned
//! [`Completion`] resolves once all of them have finished. A close that
//! interrupts an open also joins the open's group, so a widget never leaves
//! `Closing` while its open members are still running.
//!
//! | transition | effects (animated only)                                  |
//! |------------|----------------------------------------------------------|
//! | open       | `Open` forward, `Open Forward Close Backward` forward    |
//! | close      | `Close` forward, `Open Forward Close Backward` backward  |

use futures::future::{join_all, FutureExt};
use tracing::{debug, trace};

use super::lifecycle::{LifecycleError, LifecycleState};
use super::node::WidgetRef;
use crate::effect::category::{CLOSE, OPEN, OPEN_FORWARD_CLOSE_BACKWARD};
use crate::effect::{completed, Completion, EffectRef};

/// Join a group: resolves once every member has resolved.
pub fn when_all(members: Vec<Completion>) -> Completion {
    trace!(members = members.len(), "joining group");
    join_all(members).map(|_| ()).boxed_local()
}

impl WidgetRef {
    /// Start opening this widget and its children.
    ///
    /// - `Initialized`: moves to `Opening`, starts the group, and moves to
    ///   `Open` once the returned completion has been driven to the end,
    ///   unless a close or a later open took over in the meantime.
    /// - `Opening`: joins the open already in flight.
    /// - `Open`: nothing to do.
    /// - `Closing`: [`LifecycleError::InvalidTransition`].
    /// - `Pooled`/`DeInitialized`: [`LifecycleError::NotInitialized`].
    pub fn open(&self, animated: bool) -> Result<Completion, LifecycleError> {
        match self.state() {
            LifecycleState::Initialized => {}
            LifecycleState::Opening => return Ok(self.settled_from(LifecycleState::Opening)),
            LifecycleState::Open => return Ok(completed()),
            state @ LifecycleState::Closing => {
                return Err(LifecycleError::InvalidTransition {
                    widget: self.id(),
                    operation: "open",
                    state,
                })
            }
            LifecycleState::Pooled | LifecycleState::DeInitialized => {
                return Err(LifecycleError::NotInitialized { widget: self.id() })
            }
        }

        let effects = if animated {
            self.select_by_categories(&[OPEN, OPEN_FORWARD_CLOSE_BACKWARD])?
        } else {
            Vec::new()
        };

        self.set_state(LifecycleState::Opening);
        debug!(widget = %self.id(), animated, effects = effects.len(), "opening");

        let mut members = vec![self.run_hook(|widget, ctx| widget.on_open(ctx))];
        for child in self.children() {
            if matches!(
                child.state(),
                LifecycleState::Initialized | LifecycleState::Opening | LifecycleState::Open
            ) {
                members.push(child.open(animated)?);
            }
        }
        members.extend(effects.iter().map(|effect| effect.play_forward()));

        let (generation, group) = self.begin_open(when_all(members));
        let widget = self.clone();
        Ok(async move {
            group.await;
            if widget.generation() != generation {
                return;
            }
            widget.take_open_group();
            widget.finish_transition(LifecycleState::Opening, LifecycleState::Open);
        }
        .boxed_local())
    }

    /// Start closing this widget and its children.
    ///
    /// - `Initialized`/`Opening`/`Open`: moves to `Closing` and starts the
    ///   group. When interrupting `Opening`, the group also waits for the open
    ///   in flight. The widget stays `Closing` until it is deinitialized.
    /// - `Closing`: joins the close already in flight, which resolves once the
    ///   widget has been deinitialized.
    /// - `Pooled`/`DeInitialized`: [`LifecycleError::InvalidTransition`].
    pub fn close(&self, animated: bool) -> Result<Completion, LifecycleError> {
        let from = self.state();
        match from {
            LifecycleState::Initialized | LifecycleState::Opening | LifecycleState::Open => {}
            LifecycleState::Closing => return Ok(self.settled_from(LifecycleState::Closing)),
            state @ (LifecycleState::Pooled | LifecycleState::DeInitialized) => {
                return Err(LifecycleError::InvalidTransition {
                    widget: self.id(),
                    operation: "close",
                    state,
                })
            }
        }

        let (forward, backward) = if animated {
            (
                self.select_by_categories(&[CLOSE])?,
                self.select_by_categories(&[OPEN_FORWARD_CLOSE_BACKWARD])?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        self.set_state(LifecycleState::Closing);
        debug!(
            widget = %self.id(),
            animated,
            forward = forward.len(),
            backward = backward.len(),
            "closing"
        );

        let interrupted = self.take_open_group();
        let mut members = vec![self.run_hook(|widget, ctx| widget.on_close(ctx))];
        if from == LifecycleState::Opening {
            members.extend(interrupted.map(|group| group.boxed_local()));
        }
        for child in self.children() {
            if child.state().is_active() {
                members.push(child.close(animated)?);
            }
        }
        members.extend(forward.iter().map(|effect| effect.play_forward()));
        members.extend(backward.iter().map(|effect| effect.play_backward()));

        Ok(when_all(members))
    }

    /// Play every effect in `names` forward and join them.
    pub fn play_categories<S: AsRef<str>>(&self, names: &[S]) -> Result<Completion, LifecycleError> {
        let effects = self.playable(names)?;
        Ok(when_all(effects.iter().map(|e| e.play_forward()).collect()))
    }

    /// Play every effect in `names` backward and join them.
    pub fn play_categories_backward<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Completion, LifecycleError> {
        let effects = self.playable(names)?;
        Ok(when_all(effects.iter().map(|e| e.play_backward()).collect()))
    }

    fn playable<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<EffectRef>, LifecycleError> {
        if !self.state().is_active() {
            return Err(LifecycleError::NotInitialized { widget: self.id() });
        }
        self.select_by_categories(names)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Gate, Journal, ProbeWidget, ScriptedEffect};
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_pending, assert_ready, task};

    fn adopt(parent: &WidgetRef, child: &WidgetRef) {
        let subscription = child.subscribe_close(|_, _| {});
        parent.adopt(child, subscription);
    }

    // ── when_all ─────────────────────────────────────────────────────

    #[test]
    fn empty_group_is_ready() {
        let mut group = task::spawn(when_all(Vec::new()));
        assert_ready!(group.poll());
    }

    #[test]
    fn group_waits_for_slowest_member() {
        let gates: Vec<Gate> = (0..3).map(|_| Gate::new()).collect();
        let mut group = task::spawn(when_all(gates.iter().map(Gate::wait).collect()));

        assert_pending!(group.poll());
        gates[2].open();
        gates[0].open();
        assert_pending!(group.poll());
        gates[1].open();
        assert_ready!(group.poll());
    }

    // ── open ─────────────────────────────────────────────────────────

    #[test]
    fn open_joins_hook_children_and_effects() {
        let hook = Gate::new();
        let child_hook = Gate::new();
        let effect_gate = Gate::new();

        let effect = ScriptedEffect::gated([OPEN], &effect_gate);
        let parent = WidgetRef::new(
            ProbeWidget::new("parent")
                .with_open_gate(&hook)
                .with_effect(effect.clone()),
        );
        let child = WidgetRef::new(ProbeWidget::new("child").with_open_gate(&child_hook));
        adopt(&parent, &child);
        parent.initialize();

        let mut open = task::spawn(parent.open(true).unwrap());
        assert_eq!(parent.state(), LifecycleState::Opening);
        assert_eq!(child.state(), LifecycleState::Opening);
        // Every member was started before anything was awaited.
        assert_eq!(effect.forward_count(), 1);

        assert_pending!(open.poll());
        hook.open();
        effect_gate.open();
        assert_pending!(open.poll());
        assert_eq!(parent.state(), LifecycleState::Opening);

        child_hook.open();
        assert_ready!(open.poll());
        assert_eq!(parent.state(), LifecycleState::Open);
        assert_eq!(child.state(), LifecycleState::Open);
    }

    #[test]
    fn open_without_animation_skips_effects() {
        let effect = ScriptedEffect::instant([OPEN]);
        let widget = WidgetRef::new(ProbeWidget::new("a").with_effect(effect.clone()));
        widget.initialize();

        let mut open = task::spawn(widget.open(false).unwrap());
        assert_ready!(open.poll());
        assert_eq!(effect.forward_count(), 0);
        assert_eq!(widget.state(), LifecycleState::Open);
    }

    #[test]
    fn open_requires_initialize() {
        let widget = WidgetRef::new(ProbeWidget::new("a"));
        let err = widget.open(true).err().unwrap();
        assert_eq!(err, LifecycleError::NotInitialized { widget: widget.id() });
    }

    #[test]
    fn open_while_opening_joins_in_flight_open() {
        let hook = Gate::new();
        let journal = Journal::new();
        let widget = WidgetRef::new(
            ProbeWidget::new("a")
                .with_open_gate(&hook)
                .with_journal(&journal),
        );
        widget.initialize();

        let mut first = task::spawn(widget.open(true).unwrap());
        let mut second = task::spawn(widget.open(true).unwrap());
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        hook.open();
        assert_ready!(first.poll());
        assert_ready!(second.poll());
        // The hook ran once.
        assert_eq!(journal.entries(), vec!["a:initialize", "a:open"]);
    }

    #[test]
    fn open_when_open_is_immediate() {
        let widget = WidgetRef::new(ProbeWidget::new("a"));
        widget.initialize();
        let mut open = task::spawn(widget.open(true).unwrap());
        assert_ready!(open.poll());

        let mut again = task::spawn(widget.open(true).unwrap());
        assert_ready!(again.poll());
    }

    #[test]
    fn open_while_closing_is_rejected() {
        let widget = WidgetRef::new(ProbeWidget::new("a"));
        widget.initialize();
        let _close = widget.close(false).unwrap();

        let err = widget.open(true).err().unwrap();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                widget: widget.id(),
                operation: "open",
                state: LifecycleState::Closing,
            }
        );
    }

    // ── close ────────────────────────────────────────────────────────

    #[test]
    fn close_plays_close_forward_and_ofcb_backward() {
        let close_only = ScriptedEffect::instant([CLOSE]);
        let both_ways = ScriptedEffect::instant([OPEN_FORWARD_CLOSE_BACKWARD]);
        let widget = WidgetRef::new(
            ProbeWidget::new("a")
                .with_effect(close_only.clone())
                .with_effect(both_ways.clone()),
        );
        widget.initialize();

        let mut open = task::spawn(widget.open(true).unwrap());
        assert_ready!(open.poll());
        assert_eq!(close_only.forward_count(), 0);
        assert_eq!(both_ways.forward_count(), 1);

        let mut close = task::spawn(widget.close(true).unwrap());
        assert_ready!(close.poll());
        assert_eq!(close_only.forward_count(), 1);
        assert_eq!(close_only.backward_count(), 0);
        assert_eq!(both_ways.forward_count(), 1);
        assert_eq!(both_ways.backward_count(), 1);
        assert_eq!(widget.state(), LifecycleState::Closing);
    }

    #[test]
    fn close_joins_children() {
        let child_gate = Gate::new();
        let parent = WidgetRef::new(ProbeWidget::new("parent"));
        let child = WidgetRef::new(ProbeWidget::new("child").with_close_gate(&child_gate));
        adopt(&parent, &child);
        parent.initialize();

        let mut close = task::spawn(parent.close(true).unwrap());
        assert_eq!(child.state(), LifecycleState::Closing);
        assert_pending!(close.poll());
        child_gate.open();
        assert_ready!(close.poll());
    }

    #[test]
    fn close_while_closing_waits_for_teardown() {
        let widget = WidgetRef::new(ProbeWidget::new("a"));
        widget.initialize();
        let mut first = task::spawn(widget.close(false).unwrap());
        assert_ready!(first.poll());

        let mut second = task::spawn(widget.close(false).unwrap());
        assert_pending!(second.poll());
        widget.deinitialize().unwrap();
        assert_ready!(second.poll());
    }

    #[test]
    fn close_pooled_is_rejected() {
        let widget = WidgetRef::new(ProbeWidget::new("a"));
        let err = widget.close(true).err().unwrap();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                operation: "close",
                state: LifecycleState::Pooled,
                ..
            }
        ));
    }

    #[test]
    fn open_plays_open_and_ofcb_once_each() {
        let open_only = ScriptedEffect::instant([OPEN]);
        let tagged_twice = ScriptedEffect::instant([OPEN, OPEN_FORWARD_CLOSE_BACKWARD]);
        let widget = WidgetRef::new(
            ProbeWidget::new("a")
                .with_effect(open_only.clone())
                .with_effect(tagged_twice.clone()),
        );
        widget.initialize();

        let mut open = task::spawn(widget.open(true).unwrap());
        assert_ready!(open.poll());
        assert_eq!(open_only.forward_count(), 1);
        assert_eq!(tagged_twice.forward_count(), 1);
        assert_eq!(tagged_twice.backward_count(), 0);
    }

    #[test]
    fn close_during_open_waits_for_open_group() {
        let hook = Gate::new();
        let widget = WidgetRef::new(ProbeWidget::new("a").with_open_gate(&hook));
        widget.initialize();

        let mut open = task::spawn(widget.open(false).unwrap());
        assert_pending!(open.poll());
        let mut close = task::spawn(widget.close(false).unwrap());
        assert_pending!(close.poll());

        hook.open();
        assert_ready!(close.poll());
        assert_ready!(open.poll());
        assert_eq!(widget.state(), LifecycleState::Closing);
    }

    #[test]
    fn stale_open_does_not_promote_a_later_open() {
        let first_hook = Gate::new();
        let effect_gate = Gate::new();
        let effect = ScriptedEffect::gated([OPEN], &effect_gate);
        let widget = WidgetRef::new(
            ProbeWidget::new("a")
                .with_open_gate(&first_hook)
                .with_effect(effect.clone()),
        );
        widget.initialize();

        let mut stale = task::spawn(widget.open(false).unwrap());
        let mut close = task::spawn(widget.close(false).unwrap());
        first_hook.open();
        assert_ready!(close.poll());
        widget.deinitialize().unwrap();

        // Reused: initialize and open again, this time waiting on the effect.
        widget.initialize();
        let mut fresh = task::spawn(widget.open(true).unwrap());
        assert_ready!(stale.poll());
        assert_eq!(widget.state(), LifecycleState::Opening);

        assert_pending!(fresh.poll());
        effect_gate.open();
        assert_ready!(fresh.poll());
        assert_eq!(widget.state(), LifecycleState::Open);
    }

    // ── play_categories ──────────────────────────────────────────────

    #[test]
    fn play_custom_category_both_ways() {
        let pulse = ScriptedEffect::instant(["Pulse"]);
        let widget = WidgetRef::new(
            ProbeWidget::new("a")
                .with_custom_categories(["Pulse"])
                .with_effect(pulse.clone()),
        );
        widget.initialize();

        let mut forward = task::spawn(widget.play_categories(&["Pulse"]).unwrap());
        assert_ready!(forward.poll());
        let mut backward = task::spawn(widget.play_categories_backward(&["Pulse"]).unwrap());
        assert_ready!(backward.poll());
        assert_eq!((pulse.forward_count(), pulse.backward_count()), (1, 1));
    }

    #[test]
    fn play_categories_requires_active_widget() {
        let widget = WidgetRef::new(ProbeWidget::new("a"));
        assert!(matches!(
            widget.play_categories(&[OPEN]),
            Err(LifecycleError::NotInitialized { .. })
        ));
    }

    #[test]
    fn play_unknown_category_fails() {
        let widget = WidgetRef::new(ProbeWidget::new("a"));
        widget.initialize();
        assert!(matches!(
            widget.play_categories(&["Nope"]),
            Err(LifecycleError::UnknownEffectCategory { .. })
        ));
    }
}
