//! # AST Diff Engine
//!
//! Compares two documents top-down and reports, per node, whether it was inserted, deleted,
//! modified or left unchanged.
//!
//! Children are aligned greedily with one pointer per side. When the next pair is not
//! similar, source position decides whether the new child was inserted or the old child
//! deleted. This is O(n) in the number of children and handles the common edit (a contiguous
//! run of siblings shifted without reordering) well, but it is not a minimal edit script:
//! a moved block is reported as one deletion plus one insertion.
//!
//! Results come out in pre-order, starting with the document root.

use std::sync::Arc;

use crate::model::{Document, Node, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Inserted,
    Deleted,
    Modified,
    Unchanged,
}

/// One node's change classification.
///
/// `node` is the new node, except for deletions where it is the old one. Ranges are absent
/// on the side where the node does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub node: Arc<Node>,
    pub change_type: ChangeType,
    pub old_range: Option<TextRange>,
    pub new_range: Option<TextRange>,
}

/// What a consumer must refresh after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalUpdateInfo {
    /// Union of the edit range and every changed node's old and new range.
    pub affected_range: TextRange,
    /// Every node reported as anything other than unchanged.
    pub nodes_to_reparse: Vec<Arc<Node>>,
    /// True when at least one changed node is a block.
    pub is_structural_change: bool,
}

/// Diffs two documents, root first.
pub fn diff(old: &Document, new: &Document) -> Vec<DiffResult> {
    diff_nodes(&old.root, &new.root)
}

/// Diffs two subtrees, `old` and `new` first.
pub fn diff_nodes(old: &Arc<Node>, new: &Arc<Node>) -> Vec<DiffResult> {
    let mut results = Vec::new();
    compare(old, new, &mut results);
    results
}

/// Runs [`diff`] and condenses the changes into what needs re-rendering.
///
/// The affected range always covers `edit_range` (as far as it lies inside either source).
pub fn compute_incremental_update(
    old: &Document,
    new: &Document,
    edit_range: TextRange,
) -> IncrementalUpdateInfo {
    let changes: Vec<DiffResult> = diff(old, new)
        .into_iter()
        .filter(|r| r.change_type != ChangeType::Unchanged)
        .collect();

    let is_structural_change = changes.iter().any(|r| r.node.is_block());
    let affected_range = changes
        .iter()
        .flat_map(|r| r.old_range.into_iter().chain(r.new_range))
        .fold(edit_range, TextRange::union)
        .clamp(old.len_utf16().max(new.len_utf16()));

    log::trace!(
        "{} changed nodes, affected {affected_range}, structural: {is_structural_change}",
        changes.len()
    );

    IncrementalUpdateInfo {
        affected_range,
        nodes_to_reparse: changes.into_iter().map(|r| r.node).collect(),
        is_structural_change,
    }
}

fn compare(old: &Arc<Node>, new: &Arc<Node>, out: &mut Vec<DiffResult>) {
    if Arc::ptr_eq(old, new) {
        report_unchanged(new, out);
        return;
    }

    if old.kind != new.kind {
        out.push(DiffResult {
            node: Arc::clone(new),
            change_type: ChangeType::Modified,
            old_range: Some(old.range),
            new_range: Some(new.range),
        });
        return;
    }

    let change_type = if old.content != new.content
        || old.range != new.range
        || old.metadata != new.metadata
    {
        ChangeType::Modified
    } else {
        ChangeType::Unchanged
    };
    out.push(DiffResult {
        node: Arc::clone(new),
        change_type,
        old_range: Some(old.range),
        new_range: Some(new.range),
    });

    align_children(&old.children, &new.children, out);
}

fn align_children(old: &[Arc<Node>], new: &[Arc<Node>], out: &mut Vec<DiffResult>) {
    let (mut i, mut j) = (0, 0);
    while i < old.len() || j < new.len() {
        match (old.get(i), new.get(j)) {
            (None, Some(n)) => {
                out.push(inserted(n));
                j += 1;
            }
            (Some(o), None) => {
                out.push(deleted(o));
                i += 1;
            }
            (Some(o), Some(n)) if similar(o, n) => {
                compare(o, n, out);
                i += 1;
                j += 1;
            }
            (Some(o), Some(n)) => {
                if n.range.start < o.range.start {
                    out.push(inserted(n));
                    j += 1;
                } else {
                    out.push(deleted(o));
                    i += 1;
                }
            }
            (None, None) => break,
        }
    }
}

/// Same kind, and either positioned over the same stretch of source or carrying the same text.
fn similar(old: &Node, new: &Node) -> bool {
    old.kind == new.kind
        && (old.range.overlaps_or_touches(new.range) || old.content == new.content)
}

fn inserted(node: &Arc<Node>) -> DiffResult {
    DiffResult {
        node: Arc::clone(node),
        change_type: ChangeType::Inserted,
        old_range: None,
        new_range: Some(node.range),
    }
}

fn deleted(node: &Arc<Node>) -> DiffResult {
    DiffResult {
        node: Arc::clone(node),
        change_type: ChangeType::Deleted,
        old_range: Some(node.range),
        new_range: None,
    }
}

fn report_unchanged(node: &Arc<Node>, out: &mut Vec<DiffResult>) {
    out.push(DiffResult {
        node: Arc::clone(node),
        change_type: ChangeType::Unchanged,
        old_range: Some(node.range),
        new_range: Some(node.range),
    });
    for child in &node.children {
        report_unchanged(child, out);
    }
}
