//! Testing support: controllable effects and widgets, snapshot helpers.
//!
//! Use [`Gate`] to hold a hook or an effect open until the test releases it,
//! [`ScriptedEffect`] and [`ProbeWidget`] as stand-ins for real effects and
//! screens, and [`Journal`] to observe the order things happened in.
//! [`settle`] lets background transitions on the current `LocalSet` run to a
//! quiet point.

pub mod effect;
pub mod probe;
pub mod snapshot;

pub use effect::{Gate, Journal, ScriptedEffect};
pub use probe::ProbeWidget;
pub use snapshot::{render_events, render_journal};

/// Yields enough turns for chained background tasks to finish.
const SETTLE_TURNS: usize = 64;

/// Yield to the local task set until queued transitions have run.
///
/// Only makes progress for tasks that are not waiting on an unopened [`Gate`].
pub async fn settle() {
    for _ in 0..SETTLE_TURNS {
        tokio::task::yield_now().await;
    }
}
