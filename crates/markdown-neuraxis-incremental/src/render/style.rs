use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    model::{Document, DocumentVersion, TextRange},
    parsing::Utf16Index,
};

/// A color by name or hex value (`"#0969da"`); interpretation is up to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorToken(pub String);

impl ColorToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(r, g, b)` for `#rrggbb` tokens.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.0.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some((channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FontFamily {
    #[default]
    Body,
    Monospace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontTrait {
    Bold,
    Italic,
}

/// One styling instruction applied to a range of the unmodified source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    Font {
        family: FontFamily,
        scale_percent: u16,
    },
    /// Unioned with traits already present rather than replacing them.
    Trait(FontTrait),
    Foreground(ColorToken),
    Background(ColorToken),
    Underline,
    Strikethrough,
    /// Destination of a link or image.
    Link(String),
    /// Block quote nesting depth.
    Indent(u8),
    /// Markdown syntax a presentation layer may hide. The characters stay in the text.
    SyntaxMarker,
}

/// An attribute over a range relative to the start of the styled window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleRun {
    pub range: TextRange,
    pub attribute: Attribute,
}

/// The effective style of a stretch of text once every overlapping run is applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedStyle {
    pub family: FontFamily,
    pub scale_percent: u16,
    pub bold: bool,
    pub italic: bool,
    pub foreground: Option<ColorToken>,
    pub background: Option<ColorToken>,
    pub underline: bool,
    pub strikethrough: bool,
    pub link: Option<String>,
    pub indent: u8,
    pub syntax_marker: bool,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            family: FontFamily::Body,
            scale_percent: 100,
            bold: false,
            italic: false,
            foreground: None,
            background: None,
            underline: false,
            strikethrough: false,
            link: None,
            indent: 0,
            syntax_marker: false,
        }
    }
}

impl ResolvedStyle {
    /// Later single-valued attributes override earlier ones; flags and traits accumulate.
    pub fn apply(&mut self, attribute: &Attribute) {
        match attribute {
            Attribute::Font {
                family,
                scale_percent,
            } => {
                self.family = *family;
                self.scale_percent = *scale_percent;
            }
            Attribute::Trait(FontTrait::Bold) => self.bold = true,
            Attribute::Trait(FontTrait::Italic) => self.italic = true,
            Attribute::Foreground(color) => self.foreground = Some(color.clone()),
            Attribute::Background(color) => self.background = Some(color.clone()),
            Attribute::Underline => self.underline = true,
            Attribute::Strikethrough => self.strikethrough = true,
            Attribute::Link(url) => self.link = Some(url.clone()),
            Attribute::Indent(level) => self.indent = *level,
            Attribute::SyntaxMarker => self.syntax_marker = true,
        }
    }
}

/// A stretch of text with one uniform style. See [`StyledText::segments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSegment {
    pub range: TextRange,
    pub style: ResolvedStyle,
}

/// The source text, untouched, plus the attribute runs layered over it.
///
/// `text()` is always exactly the source slice for `window`; rendering never adds, removes or
/// reorders characters, so run offsets line up one-to-one with buffer offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledText {
    source: Arc<str>,
    window: TextRange,
    runs: Vec<StyleRun>,
    version: Option<DocumentVersion>,
}

impl StyledText {
    pub(crate) fn new(source: Arc<str>, window: TextRange, version: Option<DocumentVersion>) -> Self {
        Self {
            source,
            window,
            runs: Vec::new(),
            version,
        }
    }

    /// The styled text: the source slice covered by the window.
    pub fn text(&self) -> &str {
        Utf16Index::new(&self.source).slice(self.window)
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// The covered range of the source, in UTF-16 units.
    pub fn window(&self) -> TextRange {
        self.window
    }

    /// Attribute applications in the order they were made, ranges relative to the window.
    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    /// Version of the rendered document; `None` for a single-node render.
    pub fn version(&self) -> Option<DocumentVersion> {
        self.version
    }

    /// True when this render belongs to a different document version than `document`.
    pub fn is_stale(&self, document: &Document) -> bool {
        self.version.is_some_and(|v| v != document.version)
    }

    /// Records `attribute` over an absolute source range. The range is clamped to the window
    /// first; ranges that end up empty are dropped.
    pub(crate) fn apply(&mut self, range: TextRange, attribute: Attribute) {
        let clamped = range.intersect(self.window);
        if clamped.is_empty() {
            return;
        }
        self.runs.push(StyleRun {
            range: TextRange::new(
                clamped.start - self.window.start,
                clamped.end - self.window.start,
            ),
            attribute,
        });
    }

    /// Flattens the runs into consecutive, non-overlapping segments covering the window.
    ///
    /// Adjacent segments with identical styles are merged.
    pub fn segments(&self) -> Vec<StyledSegment> {
        let len = self.window.len();
        let mut bounds: Vec<usize> = Vec::with_capacity(self.runs.len() * 2 + 2);
        bounds.push(0);
        bounds.push(len);
        for run in &self.runs {
            bounds.push(run.range.start.min(len));
            bounds.push(run.range.end.min(len));
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut segments: Vec<StyledSegment> = Vec::new();
        for pair in bounds.windows(2) {
            let range = TextRange::new(pair[0], pair[1]);
            let mut style = ResolvedStyle::default();
            for run in &self.runs {
                if run.range.contains_range(range) {
                    style.apply(&run.attribute);
                }
            }
            match segments.last_mut() {
                Some(last) if last.style == style && last.range.end == range.start => {
                    last.range.end = range.end;
                }
                _ => segments.push(StyledSegment { range, style }),
            }
        }
        segments
    }
}
