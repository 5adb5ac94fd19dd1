pub mod diff;
pub mod incremental;
pub mod model;
pub mod parsing;
pub mod render;

// Re-export key types for easier usage
pub use diff::{ChangeType, DiffResult, IncrementalUpdateInfo, compute_incremental_update, diff};
pub use incremental::{
    FallbackReason, IncrementalParser, ParserState, ReparseStrategy, ReparseThresholds,
    parse_incremental,
};
pub use model::{Document, DocumentVersion, EditDescriptor, Node, NodeId, NodeKind, TextRange};
pub use parsing::{MarkdownParser, ParserConfiguration, Utf16Index, parse};
pub use render::{RenderConfiguration, SourcePreservingRenderer, StyledText};
