//! Closed document schema: node and mark type enumerations.
//!
//! The schema is an explicit value passed into every validation and
//! flattening call. There is no process-wide registry; a restricted schema
//! (fewer node or mark types) is just a different `Schema` value.

use serde::{Deserialize, Serialize};

/// Node types the document tree may contain.
///
/// The set is closed: a serialized tree naming any other type fails
/// validation with `MalformedDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Document root. Contains block nodes only.
    Doc,
    Paragraph,
    Heading,
    /// AI command block: a block the editor uses to hold a pending LLM
    /// prompt. Flattens like any other block.
    CommandBlock,
    /// Text leaf carrying a non-empty payload and optional marks.
    Text,
}

impl NodeType {
    /// Wire-format name of this node type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::CommandBlock => "command_block",
            Self::Text => "text",
        }
    }

    /// Whether this type is a block-level element (a valid child of `doc`).
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading | Self::CommandBlock)
    }

    /// Whether this type is the text leaf.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mark types a text run may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkType {
    /// Authorship provenance. The attribute `author` holds the canonical
    /// actor id. Written only by the attribution pass.
    Author,
    Highlight,
}

impl MarkType {
    /// Wire-format name of this mark type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Highlight => "highlight",
        }
    }
}

impl std::fmt::Display for MarkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit schema value: the node and mark types a document may use.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<NodeType>,
    marks: Vec<MarkType>,
}

impl Schema {
    /// Build a schema from explicit node and mark sets.
    pub fn new(nodes: Vec<NodeType>, marks: Vec<MarkType>) -> Self {
        Self { nodes, marks }
    }

    /// Look up a node type by its wire-format name.
    pub fn node_type(&self, name: &str) -> Option<NodeType> {
        self.nodes.iter().copied().find(|n| n.as_str() == name)
    }

    /// Look up a mark type by its wire-format name.
    pub fn mark_type(&self, name: &str) -> Option<MarkType> {
        self.marks.iter().copied().find(|m| m.as_str() == name)
    }

    /// Whether this schema allows the given node type.
    pub fn allows_node(&self, kind: NodeType) -> bool {
        self.nodes.contains(&kind)
    }

    /// Whether this schema allows the given mark type.
    pub fn allows_mark(&self, kind: MarkType) -> bool {
        self.marks.contains(&kind)
    }
}

impl Default for Schema {
    /// The full note schema: every node and mark type.
    fn default() -> Self {
        Self {
            nodes: vec![
                NodeType::Doc,
                NodeType::Paragraph,
                NodeType::Heading,
                NodeType::CommandBlock,
                NodeType::Text,
            ],
            marks: vec![MarkType::Author, MarkType::Highlight],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_lookup() {
        let schema = Schema::default();
        assert_eq!(schema.node_type("paragraph"), Some(NodeType::Paragraph));
        assert_eq!(schema.node_type("command_block"), Some(NodeType::CommandBlock));
        assert_eq!(schema.node_type("marquee"), None);
    }

    #[test]
    fn test_mark_type_lookup() {
        let schema = Schema::default();
        assert_eq!(schema.mark_type("author"), Some(MarkType::Author));
        assert_eq!(schema.mark_type("blink"), None);
    }

    #[test]
    fn test_block_classification() {
        assert!(NodeType::Paragraph.is_block());
        assert!(NodeType::CommandBlock.is_block());
        assert!(!NodeType::Doc.is_block());
        assert!(!NodeType::Text.is_block());
        assert!(NodeType::Text.is_text());
    }

    #[test]
    fn test_restricted_schema() {
        let schema = Schema::new(
            vec![NodeType::Doc, NodeType::Paragraph, NodeType::Text],
            vec![MarkType::Author],
        );
        assert!(schema.allows_node(NodeType::Paragraph));
        assert!(!schema.allows_node(NodeType::Heading));
        assert!(!schema.allows_mark(MarkType::Highlight));
    }
}
