//! Controllable stand-ins for asynchronous work: gates, journals, effects.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tokio::sync::watch;

use crate::effect::{completed, Completion, Effect};

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// A one-way latch. Completions from [`Gate::wait`] stay pending until the
/// gate is opened. Clones share the same latch.
#[derive(Clone)]
pub struct Gate {
    tx: Rc<watch::Sender<bool>>,
}

impl Gate {
    /// A closed gate.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Rc::new(tx) }
    }

    /// A gate that is already open.
    pub fn opened() -> Self {
        let gate = Self::new();
        gate.open();
        gate
    }

    /// Open the gate, releasing every waiter. Idempotent.
    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the gate has been opened.
    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// A completion that resolves once the gate is open.
    pub fn wait(&self) -> Completion {
        let mut rx = self.tx.subscribe();
        Box::pin(async move {
            let _ = rx.wait_for(|open| *open).await;
        })
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate").field("open", &self.is_open()).finish()
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Shared, ordered log of what happened. Clones append to the same log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    /// An empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// Copy of every entry so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Remove and return every entry so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

// ---------------------------------------------------------------------------
// ScriptedEffect
// ---------------------------------------------------------------------------

/// An effect that counts its plays and optionally waits on a [`Gate`].
///
/// Journal entries read `"<name>:forward"` / `"<name>:backward"`.
pub struct ScriptedEffect {
    name: String,
    categories: Vec<String>,
    gate: Option<Gate>,
    journal: Option<Journal>,
    forward: Cell<usize>,
    backward: Cell<usize>,
}

impl ScriptedEffect {
    /// An effect tagged with `categories` that finishes immediately.
    pub fn new(
        name: impl Into<String>,
        categories: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            categories: categories.into_iter().map(Into::into).collect(),
            gate: None,
            journal: None,
            forward: Cell::new(0),
            backward: Cell::new(0),
        }
    }

    /// Hold every play until `gate` opens (builder).
    pub fn with_gate(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    /// Record plays in `journal` (builder).
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Wrap in an `Rc`, ready to hand to a widget.
    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Shorthand for an anonymous, immediately finishing effect.
    pub fn instant(categories: impl IntoIterator<Item = impl Into<String>>) -> Rc<Self> {
        Self::new("effect", categories).shared()
    }

    /// Shorthand for an anonymous effect held by `gate`.
    pub fn gated(categories: impl IntoIterator<Item = impl Into<String>>, gate: &Gate) -> Rc<Self> {
        Self::new("effect", categories).with_gate(gate).shared()
    }

    /// The effect's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many times the effect was played forward.
    pub fn forward_count(&self) -> usize {
        self.forward.get()
    }

    /// How many times the effect was played backward.
    pub fn backward_count(&self) -> usize {
        self.backward.get()
    }

    fn play(&self, counter: &Cell<usize>, direction: &str) -> Completion {
        counter.set(counter.get() + 1);
        if let Some(journal) = &self.journal {
            journal.record(format!("{}:{direction}", self.name));
        }
        match &self.gate {
            Some(gate) => gate.wait(),
            None => completed(),
        }
    }
}

impl Effect for ScriptedEffect {
    fn categories(&self) -> &[String] {
        &self.categories
    }

    fn play_forward(&self) -> Completion {
        self.play(&self.forward, "forward")
    }

    fn play_backward(&self) -> Completion {
        self.play(&self.backward, "backward")
    }
}

impl fmt::Debug for ScriptedEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedEffect")
            .field("name", &self.name)
            .field("categories", &self.categories)
            .field("forward", &self.forward.get())
            .field("backward", &self.backward.get())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
