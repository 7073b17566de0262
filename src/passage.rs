use std::fmt;
use std::sync::Arc;

/// The passage shown when no other text is supplied.
pub const DEFAULT_PASSAGE: &str = "Typing quickly is not just about moving your fingers fast; it's about rhythm, accuracy, and focus. The more you practice, the more your hands learn the flow of the keyboard, almost like a musician mastering an instrument. Stay relaxed, keep your eyes on the screen, and let your thoughts guide your movements. Every mistake is a small lesson, reminding you to slow down, breathe, and improve with each word you type.";

/// Immutable passage the user types against, stored as code points.
///
/// Cloning is cheap: restarts share the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceText {
    chars: Arc<[char]>,
}

impl ReferenceText {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Expected character at `idx`, or `None` past the end of the passage.
    pub fn get(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }
}

impl Default for ReferenceText {
    fn default() -> Self {
        Self::new(DEFAULT_PASSAGE)
    }
}

impl From<&str> for ReferenceText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for ReferenceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}
