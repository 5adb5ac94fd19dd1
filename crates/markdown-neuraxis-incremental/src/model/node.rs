use std::{collections::BTreeMap, fmt, sync::Arc};

use uuid::Uuid;

use super::range::TextRange;

/// Process-unique identity of a node.
///
/// Identities are generated, never derived from content, so the same logical element can
/// keep its identity when an incremental re-parse rebuilds it with different text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of syntax element kinds.
///
/// Constructs the grammar engine reports that have no dedicated variant land in
/// [`NodeKind::Custom`] with the engine's name for them, so conversion never drops content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    /// ATX or setext heading, level 1 to 6.
    Heading {
        level: u8,
    },
    BlockQuote,
    List {
        ordered: bool,
    },
    ListItem,
    /// Fenced or indented code; `language` is the first word of the info string.
    CodeBlock {
        language: Option<String>,
    },
    InlineCode,
    Emphasis,
    Strong,
    Link {
        destination: String,
        title: Option<String>,
    },
    Image {
        source: String,
        alt: Option<String>,
    },
    Text,
    SoftBreak,
    LineBreak,
    ThematicBreak,
    Table,
    TableRow,
    TableCell,
    Strikethrough,
    RawHtml {
        inline: bool,
    },
    FrontMatter,
    Math {
        display: bool,
    },
    /// A fenced code block tagged `mermaid`.
    MermaidDiagram,
    Custom(String),
}

impl NodeKind {
    /// Block kinds occupy whole lines; everything else is inline.
    ///
    /// The diff engine's structural-change signal depends on this split.
    pub fn is_block(&self) -> bool {
        match self {
            NodeKind::Document
            | NodeKind::Paragraph
            | NodeKind::Heading { .. }
            | NodeKind::BlockQuote
            | NodeKind::List { .. }
            | NodeKind::ListItem
            | NodeKind::CodeBlock { .. }
            | NodeKind::MermaidDiagram
            | NodeKind::ThematicBreak
            | NodeKind::Table
            | NodeKind::TableRow
            | NodeKind::TableCell
            | NodeKind::FrontMatter => true,
            NodeKind::RawHtml { inline } => !inline,
            NodeKind::Math { display } => *display,
            _ => false,
        }
    }

    pub fn is_inline(&self) -> bool {
        !self.is_block()
    }

    /// Kinds that never carry children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Text
                | NodeKind::InlineCode
                | NodeKind::CodeBlock { .. }
                | NodeKind::MermaidDiagram
                | NodeKind::Image { .. }
                | NodeKind::SoftBreak
                | NodeKind::LineBreak
                | NodeKind::ThematicBreak
                | NodeKind::RawHtml { .. }
                | NodeKind::FrontMatter
                | NodeKind::Math { .. }
        )
    }

    /// True when both kinds are the same variant, ignoring payloads such as heading level.
    pub fn same_variant(&self, other: &NodeKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Document => f.write_str("document"),
            NodeKind::Paragraph => f.write_str("paragraph"),
            NodeKind::Heading { level } => write!(f, "heading({level})"),
            NodeKind::BlockQuote => f.write_str("blockquote"),
            NodeKind::List { ordered: true } => f.write_str("list(ordered)"),
            NodeKind::List { ordered: false } => f.write_str("list(bullet)"),
            NodeKind::ListItem => f.write_str("list_item"),
            NodeKind::CodeBlock { language: Some(lang) } => write!(f, "code_block({lang})"),
            NodeKind::CodeBlock { language: None } => f.write_str("code_block"),
            NodeKind::InlineCode => f.write_str("inline_code"),
            NodeKind::Emphasis => f.write_str("emphasis"),
            NodeKind::Strong => f.write_str("strong"),
            NodeKind::Link { destination, .. } => write!(f, "link({destination})"),
            NodeKind::Image { source, .. } => write!(f, "image({source})"),
            NodeKind::Text => f.write_str("text"),
            NodeKind::SoftBreak => f.write_str("soft_break"),
            NodeKind::LineBreak => f.write_str("line_break"),
            NodeKind::ThematicBreak => f.write_str("thematic_break"),
            NodeKind::Table => f.write_str("table"),
            NodeKind::TableRow => f.write_str("table_row"),
            NodeKind::TableCell => f.write_str("table_cell"),
            NodeKind::Strikethrough => f.write_str("strikethrough"),
            NodeKind::RawHtml { inline: true } => f.write_str("html(inline)"),
            NodeKind::RawHtml { inline: false } => f.write_str("html(block)"),
            NodeKind::FrontMatter => f.write_str("front_matter"),
            NodeKind::Math { display: true } => f.write_str("math(display)"),
            NodeKind::Math { display: false } => f.write_str("math(inline)"),
            NodeKind::MermaidDiagram => f.write_str("mermaid"),
            NodeKind::Custom(name) => write!(f, "custom({name})"),
        }
    }
}

/// One element of the syntax tree.
///
/// Nodes are immutable values. Children are reference-counted so an updated tree can share
/// every subtree an edit did not touch with the tree it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Literal payload for text-bearing leaves (text runs, code bodies) and the plain title of
    /// headings; empty otherwise.
    pub content: String,
    /// UTF-16 range in the owning document's source.
    pub range: TextRange,
    /// Children in document order.
    pub children: Vec<Arc<Node>>,
    /// Kind-specific annotations added by extensions (footnotes, front matter, task lists).
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    pub fn new(kind: NodeKind, range: TextRange) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            content: String::new(),
            range,
            children: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_block(&self) -> bool {
        self.kind.is_block()
    }

    pub fn is_inline(&self) -> bool {
        self.kind.is_inline()
    }

    /// Resolves a path of child indices to a descendant. An empty path is the node itself.
    pub fn child_at(&self, path: &[usize]) -> Option<&Node> {
        let mut current = self;
        for &index in path {
            current = current.children.get(index)?;
        }
        Some(current)
    }

    /// The most deeply nested node whose range contains `offset`.
    ///
    /// Falls back to `self` when no child contains the offset and returns `None` when
    /// `self` does not contain it either.
    pub fn node_at(&self, offset: usize) -> Option<&Node> {
        if !self.range.contains(offset) {
            return None;
        }
        for child in &self.children {
            if let Some(found) = child.node_at(offset) {
                return Some(found);
            }
        }
        Some(self)
    }

    /// The innermost block containing `offset`, descending through block children only.
    pub fn block_at(&self, offset: usize) -> Option<&Node> {
        if !self.range.contains(offset) {
            return None;
        }
        let mut current = self;
        'descend: loop {
            for child in &current.children {
                if child.is_block() && child.range.contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Pre-order traversal starting with `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Concatenated content of every text-bearing descendant.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in self.descendants() {
            match node.kind {
                NodeKind::SoftBreak | NodeKind::LineBreak => out.push('\n'),
                _ if node.kind.is_leaf() => out.push_str(&node.content),
                _ => {}
            }
        }
        out
    }

    /// A copy of this subtree with every range moved by `delta`. Identities are kept.
    #[must_use]
    pub fn shifted(&self, delta: isize) -> Node {
        if delta == 0 {
            return self.clone();
        }
        Node {
            range: self.range.shift(delta),
            children: self
                .children
                .iter()
                .map(|c| Arc::new(c.shifted(delta)))
                .collect(),
            ..self.shallow_clone()
        }
    }

    /// A copy of this subtree with every range moved forward by `base`.
    #[must_use]
    pub fn rebased(&self, base: usize) -> Node {
        Node {
            range: self.range.rebase(base),
            children: self
                .children
                .iter()
                .map(|c| Arc::new(c.rebased(base)))
                .collect(),
            ..self.shallow_clone()
        }
    }

    /// A copy of this subtree whose ranges all lie within `bounds`.
    #[must_use]
    pub fn clamped_into(&self, bounds: TextRange) -> Node {
        let range = self.range.intersect(bounds);
        Node {
            range,
            children: self
                .children
                .iter()
                .map(|c| {
                    if range.contains_range(c.range) {
                        Arc::clone(c)
                    } else {
                        Arc::new(c.clamped_into(range))
                    }
                })
                .collect(),
            ..self.shallow_clone()
        }
    }

    /// Everything except the children.
    pub(crate) fn shallow_clone(&self) -> Node {
        Node {
            id: self.id,
            kind: self.kind.clone(),
            content: self.content.clone(),
            range: self.range,
            children: Vec::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Checks the range invariants over the whole subtree: children inside their parent,
    /// siblings in non-decreasing, non-overlapping order.
    pub fn ranges_are_consistent(&self) -> bool {
        let mut previous_end = self.range.start;
        for child in &self.children {
            if !self.range.contains_range(child.range) || child.range.start < previous_end {
                return false;
            }
            previous_end = child.range.end;
            if !child.ranges_are_consistent() {
                return false;
            }
        }
        true
    }
}

/// Pre-order iterator over a subtree. See [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| child.as_ref()));
        Some(node)
    }
}
