//! Step & transaction engine.
//!
//! A step replaces the half-open range `[from, to)` of the flattened
//! position stream with a slice of nodes. Steps within one transaction
//! execute in order, each interpreted against the tree as it stands after
//! the prior steps, so step authors account for earlier size deltas
//! themselves. The engine reports the position ranges the inserted content
//! occupies in the final tree, adjusted for subsequent steps.
//!
//! The whole transaction is atomic: any failing step rejects the
//! transaction and the base snapshot is returned untouched (it is never
//! mutated in place to begin with).

use tracing::{debug, trace};

use quill_core::{Error, Node, NodeType, Result, Schema};

use crate::linear::{canonical_marks, Atom, LinearDoc};

/// A half-open `[from, to)` position range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

impl Range {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }
}

/// One atomic edit: replace `[from, to)` with `slice`.
///
/// The slice is an ordered sequence of nodes: text leaves insert inline at
/// `from`; block nodes open a new block at the insertion point (splitting
/// the surrounding block), contributing one boundary position each.
#[derive(Debug, Clone)]
pub struct Step {
    pub from: usize,
    pub to: usize,
    pub slice: Vec<Node>,
}

impl Step {
    /// Replace `[from, to)` with the given slice.
    pub fn replace(from: usize, to: usize, slice: Vec<Node>) -> Self {
        Self { from, to, slice }
    }

    /// Insert a slice at `at` without deleting anything.
    pub fn insert(at: usize, slice: Vec<Node>) -> Self {
        Self::replace(at, at, slice)
    }

    /// Delete `[from, to)`.
    pub fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to, Vec::new())
    }
}

/// An ordered batch of steps from one actor against one base snapshot.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Raw actor identifier; canonicalized by the attribution pass.
    pub actor: String,
    pub steps: Vec<Step>,
}

impl Transaction {
    pub fn new(actor: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            actor: actor.into(),
            steps,
        }
    }
}

/// Apply a transaction to a snapshot.
///
/// Returns the new snapshot plus the ranges of the final position stream
/// occupied by freshly inserted content. Fails with `InvalidRange` when a
/// step's bounds fall outside the running document size and
/// `IncompatibleSlice` when a slice is structurally impossible; either way
/// no step of the transaction is applied.
pub fn apply(schema: &Schema, doc: &Node, tx: &Transaction) -> Result<(Node, Vec<Range>)> {
    doc.validate(schema)?;
    let mut linear = LinearDoc::decompose(doc);
    let mut inserted: Vec<Range> = Vec::new();

    for (index, step) in tx.steps.iter().enumerate() {
        let size = linear.atoms.len();
        if step.from > step.to {
            return Err(Error::InvalidRange(format!(
                "step {index}: from {} exceeds to {}",
                step.from, step.to
            )));
        }
        if step.to > size {
            return Err(Error::InvalidRange(format!(
                "step {index}: to {} exceeds document size {size}",
                step.to
            )));
        }

        let slice_atoms = slice_atoms(schema, &step.slice)?;
        let inserted_len = slice_atoms.len();
        let removed_len = step.to - step.from;
        trace!(
            step = index,
            from = step.from,
            to = step.to,
            inserted = inserted_len,
            removed = removed_len,
            "applying replace step"
        );

        linear.atoms.splice(step.from..step.to, slice_atoms);

        remap_ranges(&mut inserted, step.from, step.to, inserted_len);
        if inserted_len > 0 {
            inserted.push(Range::new(step.from, step.from + inserted_len));
        }
    }

    let inserted = coalesce(inserted);
    debug!(
        steps = tx.steps.len(),
        ranges = inserted.len(),
        size = linear.atoms.len(),
        "transaction applied"
    );
    Ok((linear.rebuild(), inserted))
}

/// Convert a slice's nodes to atoms, rejecting structurally impossible
/// content.
fn slice_atoms(schema: &Schema, slice: &[Node]) -> Result<Vec<Atom>> {
    let mut atoms = Vec::new();
    for node in slice {
        match node.kind {
            NodeType::Text => push_text_atoms(schema, node, &mut atoms)?,
            kind if kind.is_block() => {
                if !schema.allows_node(kind) {
                    return Err(Error::IncompatibleSlice(format!(
                        "schema does not allow node type {kind}"
                    )));
                }
                if !node.marks.is_empty() {
                    return Err(Error::IncompatibleSlice(format!(
                        "marks on non-text node {kind}"
                    )));
                }
                atoms.push(Atom::Break {
                    kind,
                    attrs: node.attrs.clone(),
                });
                for child in &node.content {
                    if child.kind != NodeType::Text {
                        return Err(Error::IncompatibleSlice(format!(
                            "{kind} in slice may only contain text, got {}",
                            child.kind
                        )));
                    }
                    push_text_atoms(schema, child, &mut atoms)?;
                }
            }
            kind => {
                return Err(Error::IncompatibleSlice(format!(
                    "{kind} may not appear in a slice"
                )))
            }
        }
    }
    Ok(atoms)
}

fn push_text_atoms(schema: &Schema, node: &Node, atoms: &mut Vec<Atom>) -> Result<()> {
    let text = node.text.as_deref().unwrap_or_default();
    if text.is_empty() {
        return Err(Error::IncompatibleSlice(
            "empty text node in slice".to_string(),
        ));
    }
    for mark in &node.marks {
        if !schema.allows_mark(mark.kind) {
            return Err(Error::IncompatibleSlice(format!(
                "schema does not allow mark type {}",
                mark.kind
            )));
        }
    }
    let marks = canonical_marks(node.marks.clone());
    for ch in text.chars() {
        atoms.push(Atom::Char {
            ch,
            marks: marks.clone(),
        });
    }
    Ok(())
}

/// Shift previously recorded ranges across a later replacement of
/// `[from, to)` by `inserted_len` positions. Positions inside the replaced
/// region collapse to its start; the replacement's own range is recorded
/// separately by the caller.
fn remap_ranges(ranges: &mut Vec<Range>, from: usize, to: usize, inserted_len: usize) {
    let removed = to - from;
    let map = |p: usize| {
        if p <= from {
            p
        } else if p >= to {
            p - removed + inserted_len
        } else {
            from
        }
    };
    for range in ranges.iter_mut() {
        range.from = map(range.from);
        range.to = map(range.to);
    }
    ranges.retain(|r| !r.is_empty());
}

/// Merge overlapping or touching ranges, in position order.
fn coalesce(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.sort_by_key(|r| (r.from, r.to));
    let mut out: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match out.last_mut() {
            Some(last) if range.from <= last.to => last.to = last.to.max(range.to),
            _ => out.push(range),
        }
    }
    out
}
