//! Linear atom decomposition of a document tree.
//!
//! The step engine and the attribution pass both work over a flat sequence
//! of atoms, one per position in the flattened character stream: a `Char`
//! per text character and a `Break` per block boundary. The first block's
//! header carries no atom; each `Break` carries the header of the block it
//! opens. Rebuilding groups consecutive equally-marked characters into text
//! runs, which is also where adjacent same-mark runs get normalized.

use quill_core::{Attrs, Mark, Node, NodeType};

/// One position of the flattened stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Atom {
    /// A single text character with the marks of its run.
    Char { ch: char, marks: Vec<Mark> },
    /// The boundary opening a new block.
    Break { kind: NodeType, attrs: Attrs },
}

/// A document decomposed into its first-block header plus atoms.
#[derive(Debug, Clone)]
pub(crate) struct LinearDoc {
    head_kind: NodeType,
    head_attrs: Attrs,
    pub atoms: Vec<Atom>,
}

/// Sort marks into canonical order so equally-marked runs compare equal
/// regardless of the order their marks were applied in.
pub(crate) fn canonical_marks(mut marks: Vec<Mark>) -> Vec<Mark> {
    marks.sort_by_key(|m| m.kind);
    marks
}

impl LinearDoc {
    /// Decompose a validated document. The caller must have run validation;
    /// this walk assumes the doc → blocks → text shape.
    pub fn decompose(doc: &Node) -> Self {
        let mut atoms = Vec::with_capacity(doc.size());
        let mut head = None;
        for block in &doc.content {
            if head.is_none() {
                head = Some((block.kind, block.attrs.clone()));
            } else {
                atoms.push(Atom::Break {
                    kind: block.kind,
                    attrs: block.attrs.clone(),
                });
            }
            for run in &block.content {
                let marks = canonical_marks(run.marks.clone());
                for ch in run.text.as_deref().unwrap_or_default().chars() {
                    atoms.push(Atom::Char {
                        ch,
                        marks: marks.clone(),
                    });
                }
            }
        }
        let (head_kind, head_attrs) =
            head.unwrap_or((NodeType::Paragraph, Attrs::new()));
        Self {
            head_kind,
            head_attrs,
            atoms,
        }
    }

    /// Rebuild the tree, merging consecutive equally-marked characters into
    /// single text runs.
    pub fn rebuild(self) -> Node {
        let mut blocks = Vec::new();
        let mut kind = self.head_kind;
        let mut attrs = self.head_attrs;
        let mut runs: Vec<Node> = Vec::new();

        for atom in self.atoms {
            match atom {
                Atom::Break {
                    kind: next_kind,
                    attrs: next_attrs,
                } => {
                    blocks.push(make_block(kind, std::mem::take(&mut attrs), std::mem::take(&mut runs)));
                    kind = next_kind;
                    attrs = next_attrs;
                }
                Atom::Char { ch, marks } => match runs.last_mut() {
                    Some(last) if last.marks == marks => {
                        if let Some(text) = last.text.as_mut() {
                            text.push(ch);
                        }
                    }
                    _ => runs.push(Node::marked_text(ch.to_string(), marks)),
                },
            }
        }
        blocks.push(make_block(kind, attrs, runs));
        Node::doc(blocks)
    }
}

fn make_block(kind: NodeType, attrs: Attrs, runs: Vec<Node>) -> Node {
    Node {
        kind,
        attrs,
        content: runs,
        marks: Vec::new(),
        text: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Mark;

    #[test]
    fn test_decompose_rebuild_roundtrip() {
        let doc = Node::doc(vec![
            Node::heading(2, vec![Node::text("hi")]),
            Node::paragraph(vec![
                Node::text("ab"),
                Node::marked_text("cd", vec![Mark::author("alice")]),
            ]),
        ]);
        let linear = LinearDoc::decompose(&doc);
        assert_eq!(linear.atoms.len(), doc.size());
        assert_eq!(linear.rebuild(), doc);
    }

    #[test]
    fn test_rebuild_merges_adjacent_same_mark_runs() {
        let doc = Node::doc(vec![Node::paragraph(vec![
            Node::text("ab"),
            Node::text("cd"),
        ])]);
        let rebuilt = LinearDoc::decompose(&doc).rebuild();
        assert_eq!(
            rebuilt,
            Node::doc(vec![Node::paragraph(vec![Node::text("abcd")])])
        );
    }

    #[test]
    fn test_rebuild_keeps_mark_boundaries() {
        let doc = Node::doc(vec![Node::paragraph(vec![
            Node::text("ab"),
            Node::marked_text("cd", vec![Mark::highlight()]),
        ])]);
        let rebuilt = LinearDoc::decompose(&doc).rebuild();
        assert_eq!(rebuilt.content[0].content.len(), 2);
    }

    #[test]
    fn test_mark_order_is_canonicalized() {
        let doc = Node::doc(vec![Node::paragraph(vec![
            Node::marked_text("ab", vec![Mark::highlight(), Mark::author("a")]),
            Node::marked_text("cd", vec![Mark::author("a"), Mark::highlight()]),
        ])]);
        let rebuilt = LinearDoc::decompose(&doc).rebuild();
        // Same mark set in either order merges into one run.
        assert_eq!(rebuilt.content[0].content.len(), 1);
    }

    #[test]
    fn test_empty_blocks_survive() {
        let doc = Node::doc(vec![
            Node::paragraph(vec![]),
            Node::paragraph(vec![Node::text("x")]),
            Node::paragraph(vec![]),
        ]);
        let rebuilt = LinearDoc::decompose(&doc).rebuild();
        assert_eq!(rebuilt, doc);
    }
}
