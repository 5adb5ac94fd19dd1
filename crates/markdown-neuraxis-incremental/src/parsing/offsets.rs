use std::ops::Range;

use crate::model::TextRange;

/// Maps between UTF-8 byte offsets, UTF-16 code-unit offsets and line/column positions
/// for one source string.
///
/// Built once per parse: the line-start table costs a single O(n) pass, after which every
/// conversion is a binary search plus a scan of at most one line. Pure-ASCII sources take a
/// shortcut since all three offset spaces coincide.
#[derive(Debug, Clone)]
pub struct Utf16Index<'a> {
    source: &'a str,
    ascii: bool,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
    /// UTF-16 offset of the first character of every line.
    line_starts_utf16: Vec<usize>,
    len_utf16: usize,
}

impl<'a> Utf16Index<'a> {
    pub fn new(source: &'a str) -> Self {
        let ascii = source.is_ascii();
        let mut line_starts = vec![0];
        let mut line_starts_utf16 = vec![0];
        let mut units = 0usize;

        for (byte, ch) in source.char_indices() {
            units += ch.len_utf16();
            if ch == '\n' {
                line_starts.push(byte + 1);
                line_starts_utf16.push(units);
            }
        }

        Self {
            source,
            ascii,
            line_starts,
            line_starts_utf16,
            len_utf16: units,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset, clamping to the source and snapping down to a char boundary.
    pub fn to_utf16(&self, byte: usize) -> usize {
        let mut byte = byte.min(self.source.len());
        while !self.source.is_char_boundary(byte) {
            byte -= 1;
        }
        if self.ascii {
            return byte;
        }
        let line = self.line_starts.partition_point(|&s| s <= byte) - 1;
        let line_start = self.line_starts[line];
        self.line_starts_utf16[line] + self.source[line_start..byte].encode_utf16().count()
    }

    /// Converts a UTF-16 offset to a byte offset. Offsets past the end clamp to the end;
    /// offsets inside a surrogate pair snap down to the start of that character.
    pub fn to_byte(&self, offset: usize) -> usize {
        let target = offset.min(self.len_utf16);
        if self.ascii {
            return target;
        }
        let line = self.line_starts_utf16.partition_point(|&s| s <= target) - 1;
        let mut units = self.line_starts_utf16[line];
        let mut byte = self.line_starts[line];
        let mut chars = self.source[byte..].chars();
        while units < target {
            let Some(ch) = chars.next() else { break };
            let width = ch.len_utf16();
            if units + width > target {
                break;
            }
            units += width;
            byte += ch.len_utf8();
        }
        byte
    }

    pub fn range_to_utf16(&self, bytes: Range<usize>) -> TextRange {
        let start = self.to_utf16(bytes.start);
        let end = self.to_utf16(bytes.end).max(start);
        TextRange::new(start, end)
    }

    /// Byte range for a UTF-16 range, clamped to the source.
    pub fn range_to_bytes(&self, range: TextRange) -> Range<usize> {
        let range = range.clamp(self.len_utf16);
        self.to_byte(range.start)..self.to_byte(range.end)
    }

    /// The source text covered by `range`, clamped.
    pub fn slice(&self, range: TextRange) -> &'a str {
        &self.source[self.range_to_bytes(range)]
    }

    /// Zero-based `(line, column)` of a UTF-16 offset, column in UTF-16 units.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len_utf16);
        let line = self.line_starts_utf16.partition_point(|&s| s <= offset) - 1;
        (line, offset - self.line_starts_utf16[line])
    }

    /// UTF-16 offset of a zero-based line and UTF-16 column. Columns past the end of the
    /// line clamp to the line end; lines past the end clamp to the end of the source.
    pub fn offset_at(&self, line: usize, column: usize) -> usize {
        let Some(&start) = self.line_starts_utf16.get(line) else {
            return self.len_utf16;
        };
        let end = self
            .line_starts_utf16
            .get(line + 1)
            .copied()
            .unwrap_or(self.len_utf16);
        (start + column).min(end)
    }
}
