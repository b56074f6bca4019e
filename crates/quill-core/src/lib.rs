//! # quill-core
//!
//! Core types, traits, and abstractions for the quill collaborative-notes
//! engine.
//!
//! This crate provides the document tree model, the access gate, the error
//! taxonomy, and the boundary traits that other quill crates depend on.

pub mod access;
pub mod error;
pub mod logging;
pub mod models;
pub mod node;
pub mod schema;
pub mod traits;

// Re-export commonly used types at crate root
pub use access::AccessRelation;
pub use error::{Error, Result};
pub use models::{NoteRecord, ShareGrant};
pub use node::{canonical_actor, Attrs, Mark, Node, ResolvedPos, AUTHOR_ATTR, LEVEL_ATTR};
pub use schema::{MarkType, NodeType, Schema};
pub use traits::{CompletionBackend, NoteStore, ShareStore};
