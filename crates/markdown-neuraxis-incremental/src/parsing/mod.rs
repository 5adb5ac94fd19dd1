//! # Markdown Parser
//!
//! Converts raw source into a [`Document`] whose every node carries an exact UTF-16 range.
//! Tokenization is delegated to pulldown-cmark; this module owns the structural conversion
//! on top of it.
//!
//! ## Modules
//!
//! - **`config`**: `ParserConfiguration`, the GFM extension switches
//! - **`offsets`**: `Utf16Index`, byte / UTF-16 / line-column conversion built once per parse
//! - **`convert`**: event stream to node tree, including range normalization
//! - **`front_matter`**: key/value extraction for metadata blocks
//! - **`footnotes`**: reference/definition cross-linking post-pass
//!
//! Parsing is total. Input the grammar cannot classify ends up as text or paragraph nodes,
//! and engine constructs without a dedicated kind become [`NodeKind::Custom`].
//!
//! [`NodeKind::Custom`]: crate::model::NodeKind::Custom

pub mod config;
mod convert;
mod footnotes;
mod front_matter;
pub mod offsets;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use config::ParserConfiguration;
pub use offsets::Utf16Index;

use crate::model::{Document, Node};

/// Full-document parser. Cheap to construct and to clone; holds only its configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownParser {
    config: ParserConfiguration,
}

impl MarkdownParser {
    pub fn new(config: ParserConfiguration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfiguration {
        &self.config
    }

    /// Parses `source` into a new [`Document`] with a fresh version.
    pub fn parse(&self, source: impl Into<Arc<str>>) -> Document {
        let source: Arc<str> = source.into();
        let root = self.parse_tree(&source);
        Document::new(root, source)
    }

    /// Parses `source` into a bare root node, ranges relative to the start of `source`.
    pub(crate) fn parse_tree(&self, source: &str) -> Node {
        let mut root = convert::build_tree(source, self.config.options());
        if self.config.footnotes {
            footnotes::link(&mut root);
        }
        log::trace!(
            "parsed {} bytes into {} top-level blocks",
            source.len(),
            root.children.len()
        );
        root
    }
}

/// Parses with the default configuration.
pub fn parse(source: impl Into<Arc<str>>) -> Document {
    MarkdownParser::default().parse(source)
}
