//! # Incremental Parser & Parser State
//!
//! Keeps a [`Document`](crate::model::Document) in step with an edited buffer.
//!
//! ## Modules
//!
//! - **`reparse`**: `IncrementalParser`, which re-parses only the block containing an edit
//!   and falls back to a full parse whenever the outcome is ambiguous
//! - **`state`**: `ParserState`, the single-writer holder of the current document
//!
//! ## Localized re-parse
//!
//! 1. Find the innermost block containing the edit start
//! 2. Refuse edits the fragment cannot judge: quote or list markup at the line start, and
//!    the opening or closing line of fences, HTML blocks and display math
//! 3. Re-parse that block's text from the new source in isolation
//! 4. Check the fragment is still one block of the same kind and, at the top level, that
//!    it does not run into the block after it
//! 5. Splice it in: earlier nodes are shared, later nodes shift by the length delta,
//!    ancestors stretch, and the block keeps its identity
//!
//! Any failed check yields a [`FallbackReason`] and a full parse.

pub mod reparse;
pub mod state;

use std::sync::Arc;

pub use reparse::{FallbackReason, IncrementalParser, ReparseStrategy, ReparseThresholds};
pub use state::{HISTORY_CAPACITY, ParserState};

use crate::model::{Document, TextRange};

/// [`IncrementalParser::parse_incremental`] with default configuration and thresholds.
pub fn parse_incremental(
    previous: &Document,
    edit_range: TextRange,
    new_source: impl Into<Arc<str>>,
) -> Document {
    IncrementalParser::default().parse_incremental(previous, edit_range, new_source)
}
