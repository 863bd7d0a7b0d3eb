//! Snapshot rendering helpers.
//!
//! Functions for turning lifecycle event logs into plain-text strings suitable
//! for snapshot testing. Instance ids are process-global counters, so widgets
//! are rendered by label instead.

use std::fmt::Write as _;

use crate::widget::{LifecycleEvent, WidgetRef};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render events one per line as `"<verb> <label>"`.
///
/// `labels` maps widgets to the names used in the output. Widgets without a
/// label render as `widget#?`. Lines are separated by `'\n'`; the final line
/// does not have a trailing newline.
///
/// # Examples
///
/// ```ignore
/// let log = render_events(&host.drain_events(), &[(&screen, "screen")]);
/// insta::assert_snapshot!(log, @r"
/// acquired screen
/// opened screen
/// ");
/// ```
pub fn render_events(events: &[LifecycleEvent], labels: &[(&WidgetRef, &str)]) -> String {
    let mut out = String::new();
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let verb = match event {
            LifecycleEvent::Acquired { .. } => "acquired",
            LifecycleEvent::Opened { .. } => "opened",
            LifecycleEvent::Closed { .. } => "closed",
            LifecycleEvent::Released { .. } => "released",
        };
        let label = labels
            .iter()
            .find(|(widget, _)| widget.id() == event.widget())
            .map_or("widget#?", |(_, label)| *label);
        let _ = write!(out, "{verb} {label}");
    }
    out
}

/// Render a journal as one entry per line.
pub fn render_journal(entries: &[String]) -> String {
    entries.join("\n")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ProbeWidget;

    #[test]
    fn empty_log_renders_empty() {
        assert_eq!(render_events(&[], &[]), "");
    }

    #[test]
    fn events_render_by_label() {
        let a = WidgetRef::new(ProbeWidget::new("a"));
        let b = WidgetRef::new(ProbeWidget::new("b"));
        let events = vec![
            LifecycleEvent::Acquired { widget: a.id() },
            LifecycleEvent::Opened { widget: a.id() },
            LifecycleEvent::Released { widget: b.id() },
        ];
        let out = render_events(&events, &[(&a, "screen")]);
        insta::assert_snapshot!(out, @r"
        acquired screen
        opened screen
        released widget#?
        ");
    }

    #[test]
    fn journal_lines() {
        let entries = vec!["x:open".to_owned(), "x:close".to_owned()];
        assert_eq!(render_journal(&entries), "x:open\nx:close");
    }
}
