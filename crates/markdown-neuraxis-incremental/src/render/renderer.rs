use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{
    config::RenderConfiguration,
    style::{Attribute, FontFamily, FontTrait, StyledText},
};
use crate::{
    model::{Document, Node, NodeKind, TextRange},
    parsing::Utf16Index,
};

/// One leading `>` marker, with the indentation before it and one optional space after.
static QUOTE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*>[ \t]?").expect("valid quote marker pattern"));

/// Projects a document onto its own source text as attribute runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePreservingRenderer {
    config: RenderConfiguration,
}

impl SourcePreservingRenderer {
    pub fn new(config: RenderConfiguration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfiguration {
        &self.config
    }

    /// Styles the whole document source.
    pub fn render(&self, document: &Document) -> StyledText {
        let index = Utf16Index::new(&document.source);
        let window = TextRange::new(0, index.len_utf16());
        let mut out = StyledText::new(
            Arc::clone(&document.source),
            window,
            Some(document.version),
        );
        let mut pass = Pass {
            config: &self.config,
            index: &index,
            out: &mut out,
            quote_depth: 0,
        };
        pass.base(window);
        for child in &document.root.children {
            pass.node(child);
        }
        out
    }

    /// Styles the slice of `source` under `node`, clamped to the source.
    pub fn render_node(&self, node: &Node, source: &Arc<str>) -> StyledText {
        let index = Utf16Index::new(source);
        let window = node.range.clamp(index.len_utf16());
        let mut out = StyledText::new(Arc::clone(source), window, None);
        let mut pass = Pass {
            config: &self.config,
            index: &index,
            out: &mut out,
            quote_depth: 0,
        };
        pass.base(window);
        pass.node(node);
        out
    }
}

/// One rendering walk over a tree.
struct Pass<'a> {
    config: &'a RenderConfiguration,
    index: &'a Utf16Index<'a>,
    out: &'a mut StyledText,
    quote_depth: u8,
}

impl Pass<'_> {
    fn base(&mut self, window: TextRange) {
        self.out.apply(
            window,
            Attribute::Font {
                family: FontFamily::Body,
                scale_percent: 100,
            },
        );
        self.out
            .apply(window, Attribute::Foreground(self.config.theme.text.clone()));
    }

    fn node(&mut self, node: &Node) {
        let range = node.range.clamp(self.index.len_utf16());
        match &node.kind {
            NodeKind::Heading { level } => {
                self.out.apply(
                    range,
                    Attribute::Font {
                        family: FontFamily::Body,
                        scale_percent: self.config.heading_scale(*level),
                    },
                );
                self.out.apply(range, Attribute::Trait(FontTrait::Bold));
                if let Some(marker) = self.heading_marker(range) {
                    self.marker(marker);
                }
                self.children(node);
            }
            NodeKind::Emphasis => self.inline_span(node, range, Attribute::Trait(FontTrait::Italic)),
            NodeKind::Strong => self.inline_span(node, range, Attribute::Trait(FontTrait::Bold)),
            NodeKind::Strikethrough => self.inline_span(node, range, Attribute::Strikethrough),
            NodeKind::InlineCode => {
                self.code(range);
                let text = self.index.slice(range);
                let open = text.len() - text.trim_start_matches('`').len();
                let close = text.len() - text.trim_end_matches('`').len();
                if open > 0 && open + close <= text.len() {
                    self.marker(TextRange::new(range.start, range.start + open));
                    self.marker(TextRange::new(range.end - close, range.end));
                }
            }
            NodeKind::CodeBlock { .. } | NodeKind::MermaidDiagram => {
                self.code(range);
                for fence in self.fence_lines(range) {
                    self.marker(fence);
                }
            }
            NodeKind::Link { destination, .. } => {
                self.children(node);
                self.delimiters(node, range);
                self.out
                    .apply(range, Attribute::Foreground(self.config.theme.link.clone()));
                self.out.apply(range, Attribute::Underline);
                self.out.apply(range, Attribute::Link(destination.clone()));
            }
            NodeKind::Image { source, .. } => {
                self.out
                    .apply(range, Attribute::Foreground(self.config.theme.link.clone()));
                self.out.apply(range, Attribute::Link(source.clone()));
            }
            NodeKind::BlockQuote => {
                self.quote_depth = self.quote_depth.saturating_add(1);
                self.out.apply(range, Attribute::Indent(self.quote_depth));
                self.out
                    .apply(range, Attribute::Foreground(self.config.theme.quote.clone()));
                self.children(node);
                for marker in self.quote_markers(range) {
                    self.marker(marker);
                }
                self.quote_depth -= 1;
            }
            NodeKind::ThematicBreak | NodeKind::RawHtml { .. } => {
                self.out
                    .apply(range, Attribute::Foreground(self.config.theme.muted.clone()));
            }
            NodeKind::FrontMatter | NodeKind::Math { .. } => {
                self.monospace(range);
            }
            NodeKind::Table => {
                self.monospace(range);
                self.children(node);
            }
            _ => self.children(node),
        }
    }

    fn children(&mut self, node: &Node) {
        for child in &node.children {
            self.node(child);
        }
    }

    /// Children first, then the span's own attribute over its whole range.
    fn inline_span(&mut self, node: &Node, range: TextRange, attribute: Attribute) {
        self.children(node);
        self.delimiters(node, range);
        self.out.apply(range, attribute);
    }

    /// Marks the text between the node's edges and its first/last child as syntax.
    fn delimiters(&mut self, node: &Node, range: TextRange) {
        let (Some(first), Some(last)) = (node.children.first(), node.children.last()) else {
            return;
        };
        self.marker(TextRange::new(range.start, first.range.start.max(range.start)));
        self.marker(TextRange::new(last.range.end.min(range.end), range.end));
    }

    fn code(&mut self, range: TextRange) {
        self.monospace(range);
        self.out.apply(
            range,
            Attribute::Background(self.config.theme.code_background.clone()),
        );
    }

    fn monospace(&mut self, range: TextRange) {
        self.out.apply(
            range,
            Attribute::Font {
                family: FontFamily::Monospace,
                scale_percent: 100,
            },
        );
    }

    /// Mutes a piece of syntax and flags it as hideable. A no-op in source mode.
    fn marker(&mut self, range: TextRange) {
        if self.config.source_mode || range.is_empty() {
            return;
        }
        self.out
            .apply(range, Attribute::Foreground(self.config.theme.muted.clone()));
        self.out.apply(range, Attribute::SyntaxMarker);
    }

    /// `#` run plus one following space for ATX headings, the underline for setext ones.
    fn heading_marker(&self, range: TextRange) -> Option<TextRange> {
        let text = self.index.slice(range);
        let indent = text.len() - text.trim_start_matches(' ').len();
        let rest = &text[indent..];
        if rest.starts_with('#') {
            let hashes = rest.len() - rest.trim_start_matches('#').len();
            let space = usize::from(rest[hashes..].starts_with([' ', '\t']));
            return Some(TextRange::new(range.start, range.start + indent + hashes + space));
        }

        let body = text.trim_end_matches(['\n', '\r']);
        if let Some(last_start) = body.rfind('\n').map(|i| i + 1) {
            let line = &body[last_start..];
            let quoted = self.quote_prefix_len(line);
            let last = &line[quoted..];
            let fence_at = quoted + (last.len() - last.trim_start().len());
            let fence = line[fence_at..].trim_end();
            if fence.starts_with("```") || fence.starts_with("~~~") {
                let start = range.start + self.utf16_len(&text[..last_start + fence_at]);
                fences.push(TextRange::new(start, start + self.utf16_len(fence)));
            }
        }
        fences
    }

    /// The `>` prefix of every line in a block quote, counting no more markers than the
    /// quotes currently open. A `>` past that belongs to the content, e.g. quoted code.
    fn quote_markers(&self, range: TextRange) -> Vec<TextRange> {
        let source = self.index.source();
        let bytes = self.index.range_to_bytes(range);
        let mut markers = Vec::new();
        let mut line_start = source[..bytes.start].rfind('\n').map_or(0, |i| i + 1);
        while line_start < bytes.end {
            let line_end = source[line_start..]
                .find('\n')
                .map_or(source.len(), |i| line_start + i);
            let len = self.quote_prefix_len(&source[line_start..line_end]);
            let marker = self
                .index
                .range_to_utf16(line_start..line_start + len)
                .intersect(range);
            if !marker.is_empty() {
                markers.push(marker);
            }
            line_start = line_end + 1;
        }
        markers
    }

    /// Byte length of the `>` markers opening `line`, at most one per open quote.
    fn quote_prefix_len(&self, line: &str) -> usize {
        let mut len = 0;
        for _ in 0..self.quote_depth {
            match QUOTE_MARKER.find(&line[len..]) {
                Some(m) => len += m.end(),
                None => break,
            }
        }
        len
    }

    fn utf16_len(&self, text: &str) -> usize {
        text.encode_utf16().count()
    }
}
