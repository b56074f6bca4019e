//! # quill-doc
//!
//! The edit pipeline over quill document snapshots: the step & transaction
//! engine, the authorship attribution pass, and the flattening projector.
//!
//! Snapshots are immutable values; applying a transaction yields a new
//! snapshot and never touches the base, so independent pipelines over
//! different snapshots are freely parallel. Serializing concurrent writers
//! on one document is the store's job, not this crate's.

mod linear;

pub mod attribute;
pub mod flatten;
pub mod step;

pub use attribute::attribute;
pub use flatten::flatten;
pub use step::{apply, Range, Step, Transaction};

use quill_core::{Node, Result, Schema};

/// Apply a transaction and attribute its inserted text to the
/// transaction's actor in one go.
pub fn apply_attributed(schema: &Schema, doc: &Node, tx: &Transaction) -> Result<Node> {
    let (next, inserted) = apply(schema, doc, tx)?;
    attribute(schema, &next, &inserted, &tx.actor)
}
