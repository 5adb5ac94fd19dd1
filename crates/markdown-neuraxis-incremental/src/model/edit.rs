use std::time::SystemTime;

use xi_rope::{Rope, delta::Builder};

use super::range::TextRange;
use crate::parsing::offsets::Utf16Index;

/// One buffer mutation reported by a text-editing surface.
///
/// `range` is expressed in the *old* source; `replacement` is the text that now occupies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDescriptor {
    pub range: TextRange,
    pub replacement: String,
    pub timestamp: SystemTime,
}

impl EditDescriptor {
    pub fn new(range: impl Into<TextRange>, replacement: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            replacement: replacement.into(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(at), text)
    }

    pub fn delete(range: impl Into<TextRange>) -> Self {
        Self::new(range, String::new())
    }

    /// Length of the replacement in UTF-16 code units.
    pub fn replacement_len(&self) -> usize {
        self.replacement.encode_utf16().count()
    }

    /// Where the replacement lives in the *new* source.
    pub fn resulting_range(&self) -> TextRange {
        TextRange::new(
            self.range.start,
            self.range.start + self.replacement_len(),
        )
    }

    /// Net change in source length.
    pub fn length_delta(&self) -> isize {
        self.replacement_len() as isize - self.range.len() as isize
    }

    /// Produces the new source by applying this edit to `source` through a rope delta.
    ///
    /// The range is clamped to the source first, so an edit computed against a slightly
    /// different snapshot still yields a well-formed string.
    pub fn apply(&self, source: &str) -> String {
        let index = Utf16Index::new(source);
        let range = self.range.clamp(index.len_utf16());
        let start = index.to_byte(range.start);
        let end = index.to_byte(range.end);

        let rope = Rope::from(source);
        let mut builder = Builder::new(rope.len());
        builder.replace(start..end, Rope::from(self.replacement.as_str()));
        let delta = builder.build();
        delta.apply(&rope).to_string()
    }
}
