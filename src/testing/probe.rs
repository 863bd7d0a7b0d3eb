//! ProbeWidget: a configurable widget that journals its hooks.

use std::any::Any;
use std::rc::Rc;

use tracing::warn;

use super::effect::{Gate, Journal};
use crate::effect::{completed, Completion, Effect, EffectRef};
use crate::widget::{Widget, WidgetContext, WidgetExt};

/// A scoped resource the probe registers on every initialize.
#[derive(Debug, Clone)]
struct ProbeResource {
    label: String,
    fails: bool,
}

/// A widget whose hooks are scripted by its builder.
///
/// Journal entries read `"<name>:initialize"`, `"<name>:open"`,
/// `"<name>:close"`, `"<name>:deinitialize"` and `"<name>:release <label>"`.
/// Clones (and pool duplicates) share gates, journal and effects.
#[derive(Clone)]
pub struct ProbeWidget {
    name: String,
    custom_categories: Vec<String>,
    effects: Vec<EffectRef>,
    open_gate: Option<Gate>,
    close_gate: Option<Gate>,
    journal: Option<Journal>,
    children: Vec<Option<String>>,
    resources: Vec<ProbeResource>,
}

impl ProbeWidget {
    /// A probe with no effects whose hooks finish immediately.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            custom_categories: Vec::new(),
            effects: Vec::new(),
            open_gate: None,
            close_gate: None,
            journal: None,
            children: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Add custom effect categories (builder).
    pub fn with_custom_categories(
        mut self,
        categories: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.custom_categories
            .extend(categories.into_iter().map(Into::into));
        self
    }

    /// Attach an effect (builder).
    pub fn with_effect<E: Effect + 'static>(mut self, effect: Rc<E>) -> Self {
        self.effects.push(effect as EffectRef);
        self
    }

    /// Hold the open hook until `gate` opens (builder).
    pub fn with_open_gate(mut self, gate: &Gate) -> Self {
        self.open_gate = Some(gate.clone());
        self
    }

    /// Hold the close hook until `gate` opens (builder).
    pub fn with_close_gate(mut self, gate: &Gate) -> Self {
        self.close_gate = Some(gate.clone());
        self
    }

    /// Record hooks in `journal` (builder).
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    /// Open a `ProbeWidget` child bound under `id` (or the type key) on
    /// every initialize (builder).
    pub fn with_child(mut self, id: Option<&str>) -> Self {
        self.children.push(id.map(str::to_owned));
        self
    }

    /// Register a resource that releases cleanly on every initialize (builder).
    pub fn with_resource(mut self, label: impl Into<String>) -> Self {
        self.resources.push(ProbeResource {
            label: label.into(),
            fails: false,
        });
        self
    }

    /// Register a resource whose release fails on every initialize (builder).
    pub fn with_failing_resource(mut self, label: impl Into<String>) -> Self {
        self.resources.push(ProbeResource {
            label: label.into(),
            fails: true,
        });
        self
    }

    /// The probe's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the probe. Later journal entries use the new name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    fn note(&self, event: &str) {
        if let Some(journal) = &self.journal {
            journal.record(format!("{}:{event}", self.name));
        }
    }

    fn hold(gate: Option<&Gate>) -> Completion {
        match gate {
            Some(gate) => gate.wait(),
            None => completed(),
        }
    }
}

impl Widget for ProbeWidget {
    fn widget_type(&self) -> &str {
        "ProbeWidget"
    }

    fn custom_effect_categories(&self) -> Vec<String> {
        self.custom_categories.clone()
    }

    fn effects(&self) -> Vec<EffectRef> {
        self.effects.clone()
    }

    fn on_initialize(&mut self, ctx: &WidgetContext<'_>) {
        self.note("initialize");

        for resource in &self.resources {
            let ProbeResource { label, fails } = resource.clone();
            let journal = self.journal.clone();
            let name = self.name.clone();
            ctx.add_resource(label.clone(), move || {
                if let Some(journal) = journal {
                    journal.record(format!("{name}:release {label}"));
                }
                if fails {
                    Err(format!("{label} refused to release").into())
                } else {
                    Ok(())
                }
            });
        }

        for id in &self.children {
            if let Err(err) = ctx.open_child::<ProbeWidget>(id.as_deref()) {
                warn!(widget = %ctx.id(), error = %err, "probe could not open child");
                self.note("child failed");
            }
        }
    }

    fn on_deinitialize(&mut self, _ctx: &WidgetContext<'_>) {
        self.note("deinitialize");
    }

    fn on_open(&mut self, _ctx: &WidgetContext<'_>) -> Completion {
        self.note("open");
        Self::hold(self.open_gate.as_ref())
    }

    fn on_close(&mut self, _ctx: &WidgetContext<'_>) -> Completion {
        self.note("close");
        Self::hold(self.close_gate.as_ref())
    }

    fn duplicate(&self) -> Option<Box<dyn Widget>> {
        self.boxed_clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl std::fmt::Debug for ProbeWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeWidget")
            .field("name", &self.name)
            .field("effects", &self.effects.len())
            .field("children", &self.children)
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
