//! Event stream to [`Node`] tree conversion.
//!
//! pulldown-cmark emits a flat stream of `Start(tag)` / `End(tag)` pairs interleaved with leaf
//! events, each carrying the byte range it covers. The builder keeps one [`Frame`] per open
//! tag; `End` pops the frame, normalizes its children and attaches the finished node to the
//! frame below. Leaf kinds (code blocks, images, HTML blocks, front matter) swallow their
//! nested events into `content` instead of growing children.
//!
//! # Event flow for a nested list
//!
//! ```markdown
//! - Parent
//!   - Child
//! ```
//!
//! 1. `Start(List)` / `Start(Item)` / `Text("Parent")`
//! 2. `Start(List)` / `Start(Item)` / `Text("Child")` / `End(Item)` / `End(List)`
//! 3. `End(Item)` / `End(List)`
//!
//! The nested list arrives inside the parent item, so the frame stack mirrors the tree.

use std::collections::BTreeMap;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, MetadataBlockKind, Options, Parser, Tag};

use super::{front_matter, offsets::Utf16Index};
use crate::model::{Node, NodeKind, TextRange};

/// Builds the full tree for `source`. Total: every event lands somewhere.
pub(crate) fn build_tree(source: &str, options: Options) -> Node {
    let index = Utf16Index::new(source);
    let mut builder = TreeBuilder::new(&index);
    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        builder.push(event, index.range_to_utf16(range));
    }
    builder.finish()
}

struct Frame {
    kind: NodeKind,
    range: TextRange,
    content: String,
    children: Vec<Node>,
    metadata: BTreeMap<String, String>,
}

impl Frame {
    fn new(kind: NodeKind, range: TextRange) -> Self {
        Self {
            kind,
            range,
            content: String::new(),
            children: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    fn into_node(self) -> Node {
        let Frame {
            mut kind,
            range,
            content,
            children,
            mut metadata,
        } = self;

        match &mut kind {
            NodeKind::Image { alt, .. } if !content.is_empty() => *alt = Some(content.clone()),
            NodeKind::FrontMatter => metadata.extend(front_matter::parse_fields(&content)),
            _ => {}
        }

        let mut node = Node::new(kind, range).with_content(content);
        node.metadata = metadata;
        let mut node = node.with_children(normalize_children(range, children));
        if matches!(node.kind, NodeKind::Heading { .. }) {
            // Headings carry their title for outline consumers and change detection.
            node.content = node.plain_text();
        }
        node
    }
}

struct TreeBuilder<'a> {
    index: &'a Utf16Index<'a>,
    stack: Vec<Frame>,
}

impl<'a> TreeBuilder<'a> {
    fn new(index: &'a Utf16Index<'a>) -> Self {
        let root = Frame::new(NodeKind::Document, TextRange::new(0, index.len_utf16()));
        Self {
            index,
            stack: vec![root],
        }
    }

    /// True while any open frame is a leaf kind; nested events then become content.
    fn in_leaf(&self) -> bool {
        self.stack.iter().any(|f| f.kind.is_leaf())
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push(&mut self, event: Event<'_>, range: TextRange) {
        if self.in_leaf() {
            self.push_leaf_content(event, range);
            return;
        }

        match event {
            Event::Start(tag) => {
                self.stack.push(open_frame(tag, range));
            }
            Event::End(_) => self.close(),
            Event::Text(text) => {
                self.attach(Node::new(NodeKind::Text, range).with_content(text.into_string()))
            }
            Event::Code(code) => {
                self.attach(Node::new(NodeKind::InlineCode, range).with_content(code.into_string()))
            }
            Event::InlineMath(math) => self.attach(
                Node::new(NodeKind::Math { display: false }, range)
                    .with_content(math.into_string()),
            ),
            Event::DisplayMath(math) => self.attach(
                Node::new(NodeKind::Math { display: true }, range).with_content(math.into_string()),
            ),
            Event::Html(html) => self.attach(
                Node::new(NodeKind::RawHtml { inline: false }, range)
                    .with_content(html.into_string()),
            ),
            Event::InlineHtml(html) => self.attach(
                Node::new(NodeKind::RawHtml { inline: true }, range)
                    .with_content(html.into_string()),
            ),
            Event::FootnoteReference(label) => self.attach(
                Node::new(NodeKind::Custom("footnote_reference".into()), range)
                    .with_metadata("label", label.into_string()),
            ),
            Event::SoftBreak => self.attach(Node::new(NodeKind::SoftBreak, range)),
            Event::HardBreak => self.attach(Node::new(NodeKind::LineBreak, range)),
            Event::Rule => self.attach(Node::new(NodeKind::ThematicBreak, range)),
            Event::TaskListMarker(checked) => {
                let state = if checked { "checked" } else { "unchecked" };
                if let Some(item) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f.kind, NodeKind::ListItem))
                {
                    item.metadata.insert("task".into(), state.into());
                }
                self.attach(
                    Node::new(NodeKind::Custom("task_marker".into()), range)
                        .with_metadata("checked", checked.to_string()),
                );
            }
        }
    }

    fn push_leaf_content(&mut self, event: Event<'_>, range: TextRange) {
        match event {
            Event::Start(tag) => {
                // Nested structure inside a leaf (emphasis in image alt text) only keeps its text.
                let frame = Frame::new(NodeKind::Custom(tag_name(&tag)), range);
                self.stack.push(frame);
            }
            Event::End(_) => self.close(),
            Event::Text(text)
            | Event::Code(text)
            | Event::InlineMath(text)
            | Event::DisplayMath(text)
            | Event::Html(text)
            | Event::InlineHtml(text) => self.top().content.push_str(&text),
            Event::SoftBreak | Event::HardBreak => self.top().content.push(' '),
            Event::FootnoteReference(_) | Event::Rule | Event::TaskListMarker(_) => {}
        }
    }

    /// Adds a finished node to the innermost open frame.
    fn attach(&mut self, node: Node) {
        self.top().children.push(node);
    }

    fn close(&mut self) {
        if self.stack.len() < 2 {
            log::trace!("unbalanced end event ignored");
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if self.in_leaf() {
            // Closing a frame nested inside a leaf: fold its text into the leaf.
            let content = frame.content;
            self.top().content.push_str(&content);
        } else {
            let node = frame.into_node();
            self.attach(node);
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close();
        }
        match self.stack.pop() {
            Some(root) => root.into_node(),
            None => Node::new(NodeKind::Document, TextRange::new(0, self.index.len_utf16())),
        }
    }
}

fn open_frame(tag: Tag<'_>, range: TextRange) -> Frame {
    match tag {
        Tag::Paragraph => Frame::new(NodeKind::Paragraph, range),
        Tag::Heading { level, id, .. } => {
            let frame = Frame::new(NodeKind::Heading { level: level as u8 }, range);
            match id {
                Some(id) => frame.with_metadata("id", id.into_string()),
                None => frame,
            }
        }
        Tag::BlockQuote(kind) => {
            let frame = Frame::new(NodeKind::BlockQuote, range);
            match kind {
                Some(kind) => frame.with_metadata("alert", format!("{kind:?}").to_lowercase()),
                None => frame,
            }
        }
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
            let language = info.split_whitespace().next().map(str::to_string);
            match language.as_deref() {
                Some("mermaid") => Frame::new(NodeKind::MermaidDiagram, range),
                _ => Frame::new(NodeKind::CodeBlock { language }, range)
                    .with_metadata("fence", "true"),
            }
        }
        Tag::CodeBlock(CodeBlockKind::Indented) => {
            Frame::new(NodeKind::CodeBlock { language: None }, range)
        }
        Tag::HtmlBlock => Frame::new(NodeKind::RawHtml { inline: false }, range),
        Tag::List(start) => {
            let frame = Frame::new(
                NodeKind::List {
                    ordered: start.is_some(),
                },
                range,
            );
            match start {
                Some(start) => frame.with_metadata("start", start.to_string()),
                None => frame,
            }
        }
        Tag::Item => Frame::new(NodeKind::ListItem, range),
        Tag::FootnoteDefinition(label) => {
            Frame::new(NodeKind::Custom("footnote_definition".into()), range)
                .with_metadata("label", label.into_string())
        }
        Tag::Table(alignments) => {
            let alignments: Vec<String> = alignments
                .iter()
                .map(|a| format!("{a:?}").to_lowercase())
                .collect();
            Frame::new(NodeKind::Table, range).with_metadata("alignments", alignments.join(","))
        }
        Tag::TableHead => Frame::new(NodeKind::TableRow, range).with_metadata("header", "true"),
        Tag::TableRow => Frame::new(NodeKind::TableRow, range),
        Tag::TableCell => Frame::new(NodeKind::TableCell, range),
        Tag::Emphasis => Frame::new(NodeKind::Emphasis, range),
        Tag::Strong => Frame::new(NodeKind::Strong, range),
        Tag::Strikethrough => Frame::new(NodeKind::Strikethrough, range),
        Tag::Link {
            dest_url, title, ..
        } => Frame::new(
            NodeKind::Link {
                destination: dest_url.into_string(),
                title: non_empty(title),
            },
            range,
        ),
        Tag::Image {
            dest_url, title, ..
        } => {
            let frame = Frame::new(
                NodeKind::Image {
                    source: dest_url.into_string(),
                    alt: None,
                },
                range,
            );
            match non_empty(title) {
                Some(title) => frame.with_metadata("title", title),
                None => frame,
            }
        }
        Tag::MetadataBlock(kind) => {
            let format = match kind {
                MetadataBlockKind::YamlStyle => "yaml",
                MetadataBlockKind::PlusesStyle => "toml",
            };
            Frame::new(NodeKind::FrontMatter, range).with_metadata("format", format)
        }
        other => Frame::new(NodeKind::Custom(tag_name(&other)), range),
    }
}

/// Merges contiguous text runs and pulls every child into `[previous sibling end, parent end]`.
fn normalize_children(parent: TextRange, children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        if let Some(prev) = out.last_mut() {
            if matches!(prev.kind, NodeKind::Text)
                && matches!(child.kind, NodeKind::Text)
                && prev.range.end == child.range.start
            {
                prev.content.push_str(&child.content);
                prev.range.end = child.range.end;
                continue;
            }
        }

        let lower = out
            .last()
            .map_or(parent.start, |p| p.range.end)
            .clamp(parent.start, parent.end);
        let bounds = TextRange::new(lower, parent.end);
        if bounds.contains_range(child.range) {
            out.push(child);
        } else {
            out.push(child.clamped_into(bounds));
        }
    }
    out
}

fn non_empty(text: CowStr<'_>) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.into_string())
    }
}

/// `snake_case` name of a tag variant, used for [`NodeKind::Custom`].
fn tag_name(tag: &Tag<'_>) -> String {
    let debug = format!("{tag:?}");
    let variant = debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default();
    let mut name = String::with_capacity(variant.len() + 4);
    for (i, ch) in variant.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.extend(ch.to_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}
