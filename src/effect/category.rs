//! Effect categories: the built-in vocabulary plus per-widget custom tags.

/// Effects played forward while a widget opens.
pub const OPEN: &str = "Open";

/// Effects played forward while a widget closes.
pub const CLOSE: &str = "Close";

/// Effects played forward while opening and backward while closing.
pub const OPEN_FORWARD_CLOSE_BACKWARD: &str = "Open Forward Close Backward";

/// All built-in categories, in declaration order.
pub const BUILT_IN: [&str; 3] = [OPEN, CLOSE, OPEN_FORWARD_CLOSE_BACKWARD];

/// The full, ordered category list of one widget.
///
/// Custom categories come first (in the order given), followed by the
/// built-ins. Duplicates are dropped, so a custom category that repeats a
/// built-in name does not create a second entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectCategorySet {
    names: Vec<String>,
}

impl EffectCategorySet {
    /// A set holding only the built-in categories.
    pub fn new() -> Self {
        Self::with_custom(std::iter::empty::<&str>())
    }

    /// A set holding `custom` followed by the built-in categories.
    pub fn with_custom(custom: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut names: Vec<String> = Vec::new();
        let custom = custom.into_iter().map(Into::into);
        for name in custom.chain(BUILT_IN.iter().map(|s| (*s).to_owned())) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Self { names }
    }

    /// Whether `name` is part of this set.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Iterate over category names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of categories (always at least the three built-ins).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for EffectCategorySet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn built_ins_only() {
        let set = EffectCategorySet::new();
        assert_eq!(set.iter().collect::<Vec<_>>(), BUILT_IN.to_vec());
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }

    #[test]
    fn custom_first_then_built_ins() {
        let set = EffectCategorySet::with_custom(["Highlight", "Shake"]);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["Highlight", "Shake", OPEN, CLOSE, OPEN_FORWARD_CLOSE_BACKWARD]
        );
    }

    #[test]
    fn duplicates_collapse() {
        let set = EffectCategorySet::with_custom(["Shake", "Open", "Shake"]);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["Shake", OPEN, CLOSE, OPEN_FORWARD_CLOSE_BACKWARD]
        );
    }

    #[test]
    fn contains() {
        let set = EffectCategorySet::with_custom(["Pulse"]);
        assert!(set.contains("Pulse"));
        assert!(set.contains(CLOSE));
        assert!(!set.contains("Missing"));
    }

    #[test]
    fn default_impl() {
        assert_eq!(EffectCategorySet::default(), EffectCategorySet::new());
    }
}
