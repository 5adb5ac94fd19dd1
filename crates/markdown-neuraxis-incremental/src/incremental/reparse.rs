use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    model::{Document, Node, NodeKind, TextRange},
    parsing::{MarkdownParser, Utf16Index},
};

/// Size limits deciding when a localized re-parse is worth attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReparseThresholds {
    /// Edits longer than this (removed or inserted UTF-16 units) always re-parse fully.
    pub max_edit_len: usize,
    /// Documents no longer than this always re-parse fully.
    pub min_document_len: usize,
}

impl Default for ReparseThresholds {
    fn default() -> Self {
        Self {
            max_edit_len: 1000,
            min_document_len: 5000,
        }
    }
}

impl ReparseThresholds {
    /// Thresholds that attempt a localized re-parse for every edit.
    pub fn always_localize() -> Self {
        Self {
            max_edit_len: usize::MAX,
            min_document_len: 0,
        }
    }
}

/// How a re-parse was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparseStrategy {
    /// Only the block containing the edit was re-parsed.
    Localized,
    /// The whole document was re-parsed.
    Full(FallbackReason),
}

impl fmt::Display for ReparseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReparseStrategy::Localized => f.write_str("localized"),
            ReparseStrategy::Full(reason) => write!(f, "full ({reason})"),
        }
    }
}

/// Why a localized re-parse was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    EditTooLarge,
    DocumentTooSmall,
    EditOutOfBounds,
    /// The new source does not equal the old source with only the edit range replaced.
    SourceMismatch,
    NoContainingBlock,
    /// The edit reaches the block's line terminator or leaves the block.
    EditAtBlockBoundary,
    /// The edit touches the quote or list markup that opens a line inside a container.
    ContainerPrefix,
    /// The edit touches the opening or closing line of a block that only ends at a
    /// delimiter, such as a fence or an HTML comment.
    DelimiterEdited,
    LineBreakInEdit,
    /// Link text may resolve against a reference definition elsewhere in the document.
    ReferenceDefinitions,
    /// The fragment did not re-parse as a single block of the same kind.
    BlockShapeChanged,
    /// Re-parsed together with the next block, the edited block ran into it or the next
    /// block changed.
    FollowingBlockChanged,
    ChildKindsChanged,
    AmbiguousOverlap,
    InconsistentRanges,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FallbackReason::EditTooLarge => "edit above size threshold",
            FallbackReason::DocumentTooSmall => "document below size threshold",
            FallbackReason::EditOutOfBounds => "edit range outside old source",
            FallbackReason::SourceMismatch => "new source inconsistent with edit",
            FallbackReason::NoContainingBlock => "no block contains the edit",
            FallbackReason::EditAtBlockBoundary => "edit touches block boundary",
            FallbackReason::ContainerPrefix => "edit touches quote or list markup",
            FallbackReason::DelimiterEdited => "edit touches a block delimiter line",
            FallbackReason::LineBreakInEdit => "edit adds or removes a line break",
            FallbackReason::ReferenceDefinitions => "fragment may use reference definitions",
            FallbackReason::BlockShapeChanged => "fragment is not one block of the same kind",
            FallbackReason::FollowingBlockChanged => "following block re-parses differently",
            FallbackReason::ChildKindsChanged => "container children changed kind",
            FallbackReason::AmbiguousOverlap => "node partially overlaps edited block",
            FallbackReason::InconsistentRanges => "rebuilt tree has inconsistent ranges",
        };
        f.write_str(text)
    }
}

/// Updates a [`Document`] after an edit, re-parsing only the edited block when that is safe.
///
/// Every localized attempt is guarded: whenever the result cannot be shown to match what a
/// full parse would produce at block level, the whole document is parsed instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncrementalParser {
    parser: MarkdownParser,
    thresholds: ReparseThresholds,
}

impl IncrementalParser {
    pub fn new(parser: MarkdownParser, thresholds: ReparseThresholds) -> Self {
        Self { parser, thresholds }
    }

    pub fn parser(&self) -> &MarkdownParser {
        &self.parser
    }

    pub fn thresholds(&self) -> &ReparseThresholds {
        &self.thresholds
    }

    /// Full parse of `source`.
    pub fn parse(&self, source: impl Into<Arc<str>>) -> Document {
        self.parser.parse(source)
    }

    /// Produces the document for `new_source`, where `edit_range` is the replaced range in
    /// the previous document's source.
    pub fn parse_incremental(
        &self,
        previous: &Document,
        edit_range: TextRange,
        new_source: impl Into<Arc<str>>,
    ) -> Document {
        self.parse_incremental_with_strategy(previous, edit_range, new_source)
            .0
    }

    /// Like [`Self::parse_incremental`], also reporting which strategy ran.
    pub fn parse_incremental_with_strategy(
        &self,
        previous: &Document,
        edit_range: TextRange,
        new_source: impl Into<Arc<str>>,
    ) -> (Document, ReparseStrategy) {
        let new_source: Arc<str> = new_source.into();
        match self.try_localized(previous, edit_range, &new_source) {
            Ok(root) => {
                log::debug!("localized re-parse for edit {edit_range}");
                (Document::new(root, new_source), ReparseStrategy::Localized)
            }
            Err(reason) => {
                log::debug!("full re-parse for edit {edit_range}: {reason}");
                (
                    self.parser.parse(new_source),
                    ReparseStrategy::Full(reason),
                )
            }
        }
    }

    fn try_localized(
        &self,
        previous: &Document,
        edit: TextRange,
        new_source: &str,
    ) -> Result<Node, FallbackReason> {
        let old_index = Utf16Index::new(&previous.source);
        let new_index = Utf16Index::new(new_source);
        let old_len = old_index.len_utf16();
        let new_len = new_index.len_utf16();

        if edit.start > edit.end || edit.end > old_len {
            return Err(FallbackReason::EditOutOfBounds);
        }
        let delta = new_len as isize - old_len as isize;
        let inserted_len = edit.len() as isize + delta;
        if inserted_len < 0 {
            return Err(FallbackReason::SourceMismatch);
        }
        let inserted = TextRange::new(edit.start, edit.start + inserted_len as usize);

        let edit_len = edit.len().max(inserted.len());
        if edit_len > self.thresholds.max_edit_len {
            return Err(FallbackReason::EditTooLarge);
        }
        if old_len <= self.thresholds.min_document_len {
            return Err(FallbackReason::DocumentTooSmall);
        }

        let unchanged_prefix = old_index.slice(TextRange::new(0, edit.start))
            == new_index.slice(TextRange::new(0, edit.start));
        let unchanged_suffix = old_index.slice(TextRange::new(edit.end, old_len))
            == new_index.slice(TextRange::new(inserted.end, new_len));
        if !unchanged_prefix || !unchanged_suffix {
            return Err(FallbackReason::SourceMismatch);
        }

        let removed_text = old_index.slice(edit);
        let inserted_text = new_index.slice(inserted);
        if [removed_text, inserted_text]
            .iter()
            .any(|t| t.contains(['\n', '\r']))
        {
            return Err(FallbackReason::LineBreakInEdit);
        }
        log::trace!("edit {edit}: removed {removed_text:?}, inserted {inserted_text:?}");

        let path = containing_block_path(&previous.root, &old_index, edit.start);
        let Some(block) = previous.root.child_at(&path).filter(|_| !path.is_empty()) else {
            return Err(FallbackReason::NoContainingBlock);
        };
        if edit.start < block.range.start || edit.end > text_end(block, &old_index) {
            return Err(FallbackReason::EditAtBlockBoundary);
        }
        let in_container = path_nodes(&previous.root, &path)
            .any(|n| matches!(n.kind, NodeKind::BlockQuote | NodeKind::ListItem));
        if in_container && changes_line_prefix(&old_index, &new_index, edit.start) {
            return Err(FallbackReason::ContainerPrefix);
        }
        if ends_at_delimiter(block) && touches_delimiter_line(block, &old_index, edit) {
            return Err(FallbackReason::DelimiterEdited);
        }

        let fragment_range = block.range.resize_end(delta);
        let fragment = new_index.slice(fragment_range);
        if fragment.contains('[') && (previous.source.contains("]:") || new_source.contains("]:"))
        {
            return Err(FallbackReason::ReferenceDefinitions);
        }

        let parent = previous.root.child_at(&path[..path.len() - 1]);
        let is_first = path.last() == Some(&0);
        let fragment_root = self.parser.parse_tree(fragment);
        let mut replacement = single_block(&fragment_root, block, parent, is_first, fragment)?;
        if block_child_kinds(&replacement) != block_child_kinds(block) {
            return Err(FallbackReason::ChildKindsChanged);
        }
        if let &[at] = path.as_slice() {
            if let Some(next) = previous.root.children.get(at + 1) {
                self.check_following_block(
                    &new_index,
                    fragment_range.start,
                    replacement.range,
                    next,
                    delta,
                )?;
            }
        }
        replacement = replacement.rebased(fragment_range.start);
        inherit_ids(&mut replacement, block);

        let root = rebuild(&previous.root, &path, block.range, replacement, delta)?;
        if root.range != TextRange::new(0, new_len) || !root.ranges_are_consistent() {
            return Err(FallbackReason::InconsistentRanges);
        }
        Ok(root)
    }

    /// Parses the edited block together with the top-level block after it. The edited
    /// block must keep the range it had on its own and the next block its kind and start,
    /// so an unclosed construct cannot swallow what follows.
    fn check_following_block(
        &self,
        new_index: &Utf16Index<'_>,
        start: usize,
        edited: TextRange,
        next: &Node,
        delta: isize,
    ) -> Result<(), FallbackReason> {
        let next_range = next.range.shift(delta);
        let combined = self
            .parser
            .parse_tree(new_index.slice(TextRange::new(start, next_range.end)));
        match combined.children.as_slice() {
            [first, second]
                if first.range == edited
                    && second.kind == next.kind
                    && second.range.start + start == next_range.start =>
            {
                Ok(())
            }
            _ => Err(FallbackReason::FollowingBlockChanged),
        }
    }
}

/// Indentation, `>` markers and list markers at the start of a line.
static LINE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[ \t>]|(?:[-+*]|[0-9]{1,9}[.)])(?:[ \t\r]|$))*")
        .expect("valid line prefix pattern")
});

/// Whether an edit at `offset` can change how the container markup opening its line reads:
/// it lands inside that markup, the markup itself differs afterwards, or the line has no
/// content on either side. Any of these can split a list, end a quote or move a list
/// item's content column, none of which the fragment can see.
fn changes_line_prefix(old: &Utf16Index<'_>, new: &Utf16Index<'_>, offset: usize) -> bool {
    let (old_line, at) = line_around(old, offset);
    let (new_line, _) = line_around(new, offset);
    let old_prefix = line_prefix(old_line);
    let new_prefix = line_prefix(new_line);
    at < old_prefix.len()
        || old_prefix != new_prefix
        || old_line[old_prefix.len()..].trim().is_empty()
        || new_line[new_prefix.len()..].trim().is_empty()
}

/// The line holding `offset`, without its terminator, and the byte position within it.
fn line_around<'a>(index: &Utf16Index<'a>, offset: usize) -> (&'a str, usize) {
    let source = index.source();
    let byte = index.to_byte(offset);
    let start = source[..byte].rfind('\n').map_or(0, |i| i + 1);
    let end = source[start..].find('\n').map_or(source.len(), |i| start + i);
    (&source[start..end], byte - start)
}

fn line_prefix(line: &str) -> &str {
    LINE_PREFIX.find(line).map_or("", |m| m.as_str())
}

/// Blocks that run until a closing delimiter, or to the end of the document without one.
fn ends_at_delimiter(block: &Node) -> bool {
    match &block.kind {
        NodeKind::CodeBlock { .. } => block.metadata.get("fence").is_some_and(|f| f == "true"),
        NodeKind::MermaidDiagram | NodeKind::FrontMatter => true,
        NodeKind::RawHtml { inline } => !inline,
        NodeKind::Math { display } => *display,
        _ => false,
    }
}

/// Whether the edit reaches the block's first or last line.
fn touches_delimiter_line(block: &Node, index: &Utf16Index<'_>, edit: TextRange) -> bool {
    let text = index.slice(TextRange::new(block.range.start, text_end(block, index)));
    let units = |s: &str| s.encode_utf16().count();
    let first_line_end =
        block.range.start + text.find('\n').map_or(units(text), |i| units(&text[..i]));
    let last_line_start =
        block.range.start + text.rfind('\n').map_or(0, |i| units(&text[..=i]));
    edit.start <= first_line_end || edit.end >= last_line_start
}

/// The nodes along `path`, outermost first.
fn path_nodes<'a>(root: &'a Node, path: &'a [usize]) -> impl Iterator<Item = &'a Node> + 'a {
    path.iter().scan(root, |current, &i| {
        let node: &'a Node = *current;
        let child = node.children.get(i)?.as_ref();
        *current = child;
        Some(child)
    })
}

/// Child-index path to the innermost block that contains `offset`, or whose text ends
/// exactly at `offset` (a caret typing at the end of a line).
fn containing_block_path(root: &Node, index: &Utf16Index<'_>, offset: usize) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = root;
    'descend: loop {
        for (i, child) in current.children.iter().enumerate() {
            if child.is_block()
                && child.range.start <= offset
                && (offset < child.range.end || offset == text_end(child, index))
            {
                path.push(i);
                current = child;
                continue 'descend;
            }
        }
        return path;
    }
}

/// End of the block's range with trailing line terminators excluded.
fn text_end(block: &Node, index: &Utf16Index<'_>) -> usize {
    let text = index.slice(block.range);
    let trimmed = text.trim_end_matches(['\n', '\r']);
    block.range.end - (text.len() - trimmed.len())
}

/// The fragment's only block, which must match `old` in kind and start at offset 0.
///
/// A list item is parsed inside the list its marker opens and is unwrapped from it; that
/// list must match the item's old parent, including the start number for a first item.
fn single_block(
    fragment_root: &Node,
    old: &Node,
    parent: Option<&Node>,
    is_first: bool,
    fragment: &str,
) -> Result<Node, FallbackReason> {
    let [only] = fragment_root.children.as_slice() else {
        return Err(FallbackReason::BlockShapeChanged);
    };
    if only.range.start != 0 {
        return Err(FallbackReason::BlockShapeChanged);
    }
    let index = Utf16Index::new(fragment);
    let tail = index.slice(TextRange::new(only.range.end, index.len_utf16()));
    if !tail.trim().is_empty() {
        return Err(FallbackReason::BlockShapeChanged);
    }

    let candidate = match (&old.kind, &only.kind) {
        (NodeKind::ListItem, NodeKind::List { .. }) => {
            let [item] = only.children.as_slice() else {
                return Err(FallbackReason::BlockShapeChanged);
            };
            let Some(parent) = parent.filter(|p| p.kind == only.kind) else {
                return Err(FallbackReason::BlockShapeChanged);
            };
            if is_first && parent.metadata.get("start") != only.metadata.get("start") {
                return Err(FallbackReason::BlockShapeChanged);
            }
            item.as_ref()
        }
        _ => only.as_ref(),
    };
    if candidate.kind != old.kind {
        return Err(FallbackReason::BlockShapeChanged);
    }
    Ok(candidate.clone())
}

fn block_child_kinds(node: &Node) -> Vec<&NodeKind> {
    node.children
        .iter()
        .filter(|c| c.is_block())
        .map(|c| &c.kind)
        .collect()
}

/// Carries identities from the old subtree onto the re-parsed one, child by child, while
/// the kinds line up.
fn inherit_ids(new: &mut Node, old: &Node) {
    new.id = old.id;
    for (new_child, old_child) in new.children.iter_mut().zip(&old.children) {
        if new_child.kind.same_variant(&old_child.kind) {
            inherit_ids(Arc::make_mut(new_child), old_child);
        }
    }
}

/// Rebuilds the spine from `node` down to the replaced block.
///
/// Siblings before the spine are shared, siblings after it are shifted by `delta`, and each
/// spine node keeps its start while its end moves by `delta`.
fn rebuild(
    node: &Arc<Node>,
    path: &[usize],
    block: TextRange,
    replacement: Node,
    delta: isize,
) -> Result<Node, FallbackReason> {
    let Some((&index, rest)) = path.split_first() else {
        return Ok(replacement);
    };
    if !node.range.contains_range(block) {
        return Err(FallbackReason::AmbiguousOverlap);
    }

    let mut children = Vec::with_capacity(node.children.len());
    let mut replacement = Some(replacement);
    for (i, child) in node.children.iter().enumerate() {
        if i < index {
            if child.range.end > block.start {
                return Err(FallbackReason::AmbiguousOverlap);
            }
            children.push(Arc::clone(child));
        } else if i == index {
            let replacement = replacement
                .take()
                .ok_or(FallbackReason::AmbiguousOverlap)?;
            children.push(Arc::new(rebuild(child, rest, block, replacement, delta)?));
        } else {
            if child.range.start < block.end {
                return Err(FallbackReason::AmbiguousOverlap);
            }
            children.push(if delta == 0 {
                Arc::clone(child)
            } else {
                Arc::new(child.shifted(delta))
            });
        }
    }

    let mut rebuilt = node.shallow_clone();
    rebuilt.range = node.range.resize_end(delta);
    rebuilt.children = children;
    Ok(rebuilt)
}
