//! Attribution pass: tag freshly inserted text with the acting actor.
//!
//! Runs after the step engine, over the ranges it reported as inserted.
//! Text inside those ranges loses any existing authorship mark and gains
//! one carrying the canonical actor id; everything outside the ranges is
//! untouched, so content a step merely moved keeps its provenance. This
//! pass is the sole writer of authorship marks.
//!
//! Inserted content that arrived carrying authorship marks of its own
//! (e.g. a paste) is re-attributed to the acting actor; the pasted text's
//! original author is not preserved.

use tracing::{debug, trace};

use quill_core::{canonical_actor, Mark, MarkType, Node, Result, Schema};

use crate::linear::{Atom, LinearDoc};
use crate::step::Range;

/// Reapply authorship marks on the inserted ranges of a snapshot.
///
/// Idempotent: running this again with the same ranges and actor over its
/// own output yields an identical snapshot. An actor id that canonicalizes
/// to empty leaves the inserted text unmarked rather than recording an
/// empty author.
pub fn attribute(schema: &Schema, doc: &Node, inserted: &[Range], actor: &str) -> Result<Node> {
    doc.validate(schema)?;
    let canonical = canonical_actor(actor);
    if canonical.is_empty() {
        debug!("actor id canonicalizes to empty; leaving inserted text unmarked");
        return Ok(doc.clone());
    }
    let author = Mark::author(&canonical);

    let mut linear = LinearDoc::decompose(doc);
    let mut marked = 0usize;
    for range in inserted {
        let to = range.to.min(linear.atoms.len());
        for atom in &mut linear.atoms[range.from.min(to)..to] {
            if let Atom::Char { marks, .. } = atom {
                marks.retain(|m| m.kind != MarkType::Author);
                marks.push(author.clone());
                marks.sort_by_key(|m| m.kind);
                marked += 1;
            }
        }
    }
    trace!(actor = %canonical, chars = marked, "attributed inserted text");
    Ok(linear.rebuild())
}
