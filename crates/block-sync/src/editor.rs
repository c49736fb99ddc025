//! Editor surface collaborator and the content-equivalence predicate.
//!
//! The manager only ever asks the surface for its current text and replaces
//! it wholesale. Whether two texts are "the same document" is decided by a
//! `ContentEquivalence`, so that renderer round-trips (trailing whitespace,
//! line endings) do not register as edits.

/// The live editing surface bound to the manager.
pub trait EditorSurface: Send {
    /// Current live content.
    fn get_markdown(&self) -> String;

    /// Replace the live content.
    ///
    /// Called only by the manager when it applies disk content. Hosts must not
    /// report the resulting change back as a user edit; if they do, the
    /// manager absorbs it because the text matches its last applied baseline.
    fn set_markdown(&mut self, text: &str);
}

/// Plain string buffer, for headless hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryEditor {
    text: String,
    applied: usize,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            applied: 0,
        }
    }

    /// Simulate the user typing: replace the buffer without going through
    /// `set_markdown`.
    pub fn type_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of times the manager pushed content into this surface.
    pub fn applied_count(&self) -> usize {
        self.applied
    }
}

impl EditorSurface for MemoryEditor {
    fn get_markdown(&self) -> String {
        self.text.clone()
    }

    fn set_markdown(&mut self, text: &str) {
        self.text = text.to_string();
        self.applied += 1;
    }
}

/// Decides whether two document texts are content-equivalent.
pub trait ContentEquivalence: Send + Sync {
    fn equivalent(&self, a: &str, b: &str) -> bool;
}

impl<F> ContentEquivalence for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn equivalent(&self, a: &str, b: &str) -> bool {
        self(a, b)
    }
}

/// Byte-for-byte comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactEquivalence;

impl ContentEquivalence for ExactEquivalence {
    fn equivalent(&self, a: &str, b: &str) -> bool {
        a == b
    }
}

/// Ignores line-ending style, trailing whitespace on each line and trailing
/// blank lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedEquivalence;

impl NormalizedEquivalence {
    fn normalized_lines(text: &str) -> impl Iterator<Item = &str> {
        text.trim_end().lines().map(|line| line.trim_end())
    }
}

impl ContentEquivalence for NormalizedEquivalence {
    fn equivalent(&self, a: &str, b: &str) -> bool {
        a == b || Self::normalized_lines(a).eq(Self::normalized_lines(b))
    }
}
