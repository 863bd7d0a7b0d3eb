//! Effects: category-tagged animation units and the per-widget effects index.
//!
//! An [`Effect`] knows which categories it belongs to and how to play itself
//! forward or backward. A widget resolves its effects into an [`EffectIndex`]
//! once, on first initialization; transitions then select effects by category.

pub mod category;

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};

pub use category::EffectCategorySet;

/// A completion signal: resolves once the operation it stands for has finished.
///
/// Everything runs on one cooperative execution context, so completions are
/// not `Send`.
pub type Completion = LocalBoxFuture<'static, ()>;

/// A completion that is already finished.
pub fn completed() -> Completion {
    future::ready(()).boxed_local()
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// A unit of animation that can be selected by category.
///
/// Direction is a property of the call, not of the effect: the same effect may
/// be played forward on open and backward on close. Whether playing the same
/// direction twice is meaningful is up to the implementation.
pub trait Effect {
    /// Category tags carried by this effect. Should be non-empty.
    fn categories(&self) -> &[String];

    /// Start playing forward. The returned future resolves when playback ends.
    fn play_forward(&self) -> Completion;

    /// Start playing backward. The returned future resolves when playback ends.
    fn play_backward(&self) -> Completion;
}

/// Shared handle to an effect. Identity (for deduplication) is pointer identity.
pub type EffectRef = Rc<dyn Effect>;

// ---------------------------------------------------------------------------
// EffectIndex
// ---------------------------------------------------------------------------

/// A requested category has no entry in the index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("effect category '{0}' is not defined")]
pub struct UnknownCategory(pub String);

/// Category name → effects tagged with it.
///
/// Only categories in the widget's [`EffectCategorySet`] get an entry; tags on
/// an effect that are not part of that set are ignored. Every known category has
/// an entry, possibly empty.
#[derive(Clone, Default)]
pub struct EffectIndex {
    categories: EffectCategorySet,
    by_category: HashMap<String, Vec<EffectRef>>,
}

impl EffectIndex {
    /// Build the index for `effects` over the given category set.
    pub fn build(categories: EffectCategorySet, effects: &[EffectRef]) -> Self {
        let by_category = categories
            .iter()
            .map(|name| {
                let tagged = effects
                    .iter()
                    .filter(|e| e.categories().iter().any(|c| c == name))
                    .cloned()
                    .collect();
                (name.to_owned(), tagged)
            })
            .collect();
        Self {
            categories,
            by_category,
        }
    }

    /// Select the effects for `names`, deduplicated by identity.
    ///
    /// Results are concatenated in request order and keep the first occurrence
    /// of each effect. Fails on the first category without an entry.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<EffectRef>, UnknownCategory> {
        let mut selected: Vec<EffectRef> = Vec::new();
        for name in names {
            let name = name.as_ref();
            let tagged = self
                .by_category
                .get(name)
                .ok_or_else(|| UnknownCategory(name.to_owned()))?;
            for effect in tagged {
                if !selected.iter().any(|seen| Rc::ptr_eq(seen, effect)) {
                    selected.push(Rc::clone(effect));
                }
            }
        }
        Ok(selected)
    }

    /// The category set this index was built over.
    pub fn categories(&self) -> &EffectCategorySet {
        &self.categories
    }

    /// Number of effects tagged with `name` (0 for unknown categories).
    pub fn count(&self, name: &str) -> usize {
        self.by_category.get(name).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EffectIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .categories
            .iter()
            .map(|name| (name, self.count(name)))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EffectIndex").field("counts", &counts).finish()
    }
}
