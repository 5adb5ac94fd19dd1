use std::{collections::VecDeque, sync::Arc};

use super::reparse::{IncrementalParser, ReparseStrategy};
use crate::{
    diff::{IncrementalUpdateInfo, compute_incremental_update},
    model::{Document, EditDescriptor, Node},
};

/// Number of edits kept in [`ParserState::history`].
pub const HISTORY_CAPACITY: usize = 100;

/// The single authoritative document for one open buffer.
///
/// Owned by whatever component serializes edits for that buffer; each open document gets
/// its own instance. Every update replaces the held [`Document`] wholesale, so snapshots
/// handed out earlier stay valid.
#[derive(Debug, Clone)]
pub struct ParserState {
    parser: IncrementalParser,
    document: Document,
    history: VecDeque<EditDescriptor>,
    last_strategy: Option<ReparseStrategy>,
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new(IncrementalParser::default())
    }
}

impl ParserState {
    /// Starts with an empty document.
    pub fn new(parser: IncrementalParser) -> Self {
        Self::with_source(parser, "")
    }

    pub fn with_source(parser: IncrementalParser, source: impl Into<Arc<str>>) -> Self {
        let document = parser.parse(source);
        Self {
            parser,
            document,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            last_strategy: None,
        }
    }

    /// Replaces the document with a full parse of `source` and clears the edit history.
    pub fn set_source(&mut self, source: impl Into<Arc<str>>) {
        self.document = self.parser.parse(source);
        self.history.clear();
        self.last_strategy = None;
    }

    /// Applies an edit whose resulting text the caller already has.
    pub fn apply_edit(
        &mut self,
        edit: EditDescriptor,
        new_source: impl Into<Arc<str>>,
    ) -> IncrementalUpdateInfo {
        let (document, strategy) =
            self.parser
                .parse_incremental_with_strategy(&self.document, edit.range, new_source);
        let info = compute_incremental_update(&self.document, &document, edit.range);
        log::debug!(
            "{} -> {} via {strategy}, affected {}",
            self.document.version,
            document.version,
            info.affected_range
        );

        self.document = document;
        self.last_strategy = Some(strategy);
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(edit);
        info
    }

    /// Applies an edit to the current source and re-parses.
    pub fn apply_text_edit(&mut self, edit: EditDescriptor) -> IncrementalUpdateInfo {
        let new_source = edit.apply(&self.document.source);
        self.apply_edit(edit, new_source)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn source(&self) -> &str {
        &self.document.source
    }

    pub fn node_at(&self, offset: usize) -> Option<&Node> {
        self.document.node_at(offset)
    }

    /// The innermost block at `offset`, for syntax visibility and list continuation logic.
    pub fn block_at(&self, offset: usize) -> Option<&Node> {
        self.document.block_at(offset)
    }

    /// Recent edits, oldest first, at most [`HISTORY_CAPACITY`].
    pub fn history(&self) -> impl ExactSizeIterator<Item = &EditDescriptor> {
        self.history.iter()
    }

    /// Strategy of the most recent edit, `None` right after a full source replacement.
    pub fn last_strategy(&self) -> Option<ReparseStrategy> {
        self.last_strategy
    }
}
