use serde::{Deserialize, Serialize};

/// A half-open range `[start, end)` of UTF-16 code-unit offsets into a source string.
///
/// Every node range, edit range and style range in this crate uses this unit, so the
/// values can be handed straight to text-editing surfaces that count in UTF-16.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TextRange {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl TextRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty range positioned at `offset`.
    pub const fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns the length in code units. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Half-open containment: `start <= offset < end`.
    ///
    /// An empty range contains nothing.
    #[must_use]
    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True if `other` lies entirely within `self`.
    #[must_use]
    pub fn contains_range(self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if the two ranges share at least one offset or are directly adjacent.
    #[must_use]
    pub fn overlaps_or_touches(self, other: TextRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The smallest range covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: TextRange) -> TextRange {
        TextRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The overlap of both ranges, collapsed to an empty range at the boundary
    /// when they are disjoint.
    #[must_use]
    pub fn intersect(self, other: TextRange) -> TextRange {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end).max(start);
        TextRange { start, end }
    }

    /// Clamps the range to `[0, len]`, never producing `end < start`.
    #[must_use]
    pub fn clamp(self, len: usize) -> TextRange {
        let start = self.start.min(len);
        let end = self.end.min(len).max(start);
        TextRange { start, end }
    }

    /// Moves both ends by `delta`, saturating at zero.
    #[must_use]
    pub fn shift(self, delta: isize) -> TextRange {
        TextRange {
            start: offset_by(self.start, delta),
            end: offset_by(self.end, delta),
        }
    }

    /// Moves both ends forward by `base`.
    #[must_use]
    pub fn rebase(self, base: usize) -> TextRange {
        TextRange {
            start: self.start + base,
            end: self.end + base,
        }
    }

    /// Keeps the start and moves only the end by `delta`.
    #[must_use]
    pub fn resize_end(self, delta: isize) -> TextRange {
        TextRange {
            start: self.start,
            end: offset_by(self.end, delta).max(self.start),
        }
    }
}

impl From<std::ops::Range<usize>> for TextRange {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self {
            start: r.start,
            end: r.end,
        }
    }
}

impl From<TextRange> for std::ops::Range<usize> {
    fn from(r: TextRange) -> Self {
        r.start..r.end
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

pub(crate) fn offset_by(offset: usize, delta: isize) -> usize {
    if delta >= 0 {
        offset.saturating_add(delta.unsigned_abs())
    } else {
        offset.saturating_sub(delta.unsigned_abs())
    }
}
