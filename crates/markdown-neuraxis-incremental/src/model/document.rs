use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use super::{
    node::{Node, NodeKind},
    range::TextRange,
};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Identifies one parse result. Every parse and re-parse yields a fresh, larger value,
/// so consumers can detect staleness without comparing trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentVersion(u64);

impl DocumentVersion {
    pub fn next() -> Self {
        Self(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A parsed markdown document: the tree, the exact source it was parsed from, and a version.
///
/// Documents are replaced, never mutated. Cloning is cheap (two reference counts), which
/// lets a render or diff run on a snapshot while the next edit is being parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Arc<Node>,
    pub source: Arc<str>,
    pub version: DocumentVersion,
}

impl Document {
    /// Wraps a root node. The root must be of kind [`NodeKind::Document`].
    pub fn new(root: Node, source: impl Into<Arc<str>>) -> Self {
        debug_assert!(matches!(root.kind, NodeKind::Document));
        Self {
            root: Arc::new(root),
            source: source.into(),
            version: DocumentVersion::next(),
        }
    }

    /// Length of the source in UTF-16 code units.
    pub fn len_utf16(&self) -> usize {
        self.root.range.end
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn child_at(&self, path: &[usize]) -> Option<&Node> {
        self.root.child_at(path)
    }

    /// The deepest node under `offset`. A caret sitting at the very end of the source
    /// resolves to the element just before it.
    pub fn node_at(&self, offset: usize) -> Option<&Node> {
        self.root.node_at(self.caret_offset(offset))
    }

    /// The innermost block under `offset`, with the same end-of-source rule as [`Self::node_at`].
    pub fn block_at(&self, offset: usize) -> Option<&Node> {
        self.root.block_at(self.caret_offset(offset))
    }

    /// Top-level blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Node> {
        self.root.children.iter().map(|c| c.as_ref())
    }

    /// The whole-document range.
    pub fn range(&self) -> TextRange {
        self.root.range
    }

    fn caret_offset(&self, offset: usize) -> usize {
        let len = self.len_utf16();
        if offset == len && len > 0 {
            len - 1
        } else {
            offset
        }
    }
}
