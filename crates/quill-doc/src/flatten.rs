//! Flattening projector: tree snapshot to linear text.
//!
//! Visits blocks in document order, emitting each text payload verbatim and
//! exactly one line break between consecutive block siblings. Marks are
//! provenance metadata and invisible here: two snapshots differing only in
//! marks flatten identically.

use tracing::debug;

use quill_core::{Node, Schema};

/// Flatten a snapshot to text.
///
/// A tree that fails validation flattens to the empty string instead of
/// surfacing a structural error: search and context assembly treat absence
/// of content as "nothing to search", not a fatal condition.
pub fn flatten(schema: &Schema, doc: &Node) -> String {
    if let Err(err) = doc.validate(schema) {
        debug!(error = %err, "flattening invalid tree to empty text");
        return String::new();
    }
    let blocks: Vec<String> = doc.content.iter().map(block_text).collect();
    blocks.join("\n")
}

fn block_text(block: &Node) -> String {
    block
        .content
        .iter()
        .filter_map(|run| run.text.as_deref())
        .collect()
}
