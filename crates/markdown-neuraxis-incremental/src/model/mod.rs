//! # Document Model
//!
//! Value types for the syntax tree and the structural invariants every other module relies on:
//!
//! - **`range`**: `TextRange`, a half-open UTF-16 interval
//! - **`node`**: `Node`, `NodeKind`, `NodeId` and the traversal primitives
//!   (`child_at`, `node_at`, `block_at`, `descendants`)
//! - **`document`**: `Document` (root, source, version)
//! - **`edit`**: `EditDescriptor`, the edit record supplied by text-editing surfaces
//!
//! ## Invariants
//!
//! - A child's range lies within its parent's range
//! - Sibling ranges are non-decreasing and non-overlapping in source order
//! - The root's range spans the entire source

pub mod document;
pub mod edit;
pub mod node;
pub mod range;

pub use document::{Document, DocumentVersion};
pub use edit::EditDescriptor;
pub use node::{Descendants, Node, NodeId, NodeKind};
pub use range::TextRange;
