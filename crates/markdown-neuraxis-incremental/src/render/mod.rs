//! # Source-Preserving Renderer
//!
//! Turns a [`Document`](crate::model::Document) into [`StyledText`]: the unmodified source
//! plus attribute runs over UTF-16 ranges of it.
//!
//! ## Modules
//!
//! - **`style`**: `Attribute`, `StyleRun`, `StyledText` and run flattening into segments
//! - **`config`**: `RenderConfiguration` and the color `Theme`
//! - **`renderer`**: `SourcePreservingRenderer`, the tree walk that emits runs
//!
//! ## Why the text is never rebuilt
//!
//! Rendering by concatenating per-node strings (dropping `#`, `*`, backticks and so on) gives
//! a display string whose offsets no longer match the buffer. Every caret position, selection
//! and edit from the view then needs a mapping back to the source, and those mappings break
//! as soon as markers nest. No such rendering path exists here.
//!
//! Markers stay in the text. They are muted and tagged with [`Attribute::SyntaxMarker`] so a
//! view may hide them, and in source mode they are left exactly as typed.

pub mod config;
pub mod renderer;
pub mod style;

pub use config::{RenderConfiguration, Theme};
pub use renderer::SourcePreservingRenderer;
pub use style::{
    Attribute, ColorToken, FontFamily, FontTrait, ResolvedStyle, StyleRun, StyledSegment,
    StyledText,
};
