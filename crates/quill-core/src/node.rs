//! Document tree model: nodes, marks, positions.
//!
//! A document is a persistent immutable tree value. The root is a `doc`
//! node containing block nodes (`paragraph`, `heading`, `command_block`);
//! blocks contain `text` leaves; text leaves carry a non-empty payload and
//! optional marks. No node references its parent; every edit produces a new
//! root value.
//!
//! ## Positions
//!
//! Positions index the flattened character stream of the tree. A text
//! node's size is its character count; the boundary between two consecutive
//! block siblings contributes exactly 1 (the line break the flattener
//! emits). The document's size therefore equals the character count of its
//! flattened text. Ranges are half-open `[from, to)`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::schema::{MarkType, NodeType, Schema};

/// Type-specific attribute map for nodes and marks.
pub type Attrs = BTreeMap<String, JsonValue>;

/// Attribute key holding a mark's actor id.
pub const AUTHOR_ATTR: &str = "author";

/// Attribute key holding a heading's level.
pub const LEVEL_ATTR: &str = "level";

/// Canonicalize an actor identifier: strip surrounding whitespace and quote
/// characters. Upstream producers emit inconsistently quoted ids, so every
/// comparison and every stored mark goes through this first.
pub fn canonical_actor(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
        .to_string()
}

/// A tag attached to a contiguous run of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    /// Authorship mark for the given actor. The id is canonicalized here so
    /// a stored mark never carries quoting noise.
    pub fn author(actor: &str) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert(
            AUTHOR_ATTR.to_string(),
            JsonValue::String(canonical_actor(actor)),
        );
        Self {
            kind: MarkType::Author,
            attrs,
        }
    }

    /// Highlight mark.
    pub fn highlight() -> Self {
        Self {
            kind: MarkType::Highlight,
            attrs: Attrs::new(),
        }
    }

    /// The canonical actor id carried by an authorship mark.
    pub fn author_id(&self) -> Option<&str> {
        if self.kind != MarkType::Author {
            return None;
        }
        self.attrs.get(AUTHOR_ATTR).and_then(|v| v.as_str())
    }
}

/// One element of the structured document tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attrs,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    /// Document root from block children.
    pub fn doc(blocks: Vec<Node>) -> Self {
        Self {
            kind: NodeType::Doc,
            attrs: Attrs::new(),
            content: blocks,
            marks: Vec::new(),
            text: None,
        }
    }

    /// Paragraph from text children.
    pub fn paragraph(children: Vec<Node>) -> Self {
        Self {
            kind: NodeType::Paragraph,
            attrs: Attrs::new(),
            content: children,
            marks: Vec::new(),
            text: None,
        }
    }

    /// Heading at the given level from text children.
    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert(LEVEL_ATTR.to_string(), JsonValue::from(level));
        Self {
            kind: NodeType::Heading,
            attrs,
            content: children,
            marks: Vec::new(),
            text: None,
        }
    }

    /// AI command block from text children.
    pub fn command_block(children: Vec<Node>) -> Self {
        Self {
            kind: NodeType::CommandBlock,
            attrs: Attrs::new(),
            content: children,
            marks: Vec::new(),
            text: None,
        }
    }

    /// Unmarked text leaf.
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            kind: NodeType::Text,
            attrs: Attrs::new(),
            content: Vec::new(),
            marks: Vec::new(),
            text: Some(payload.into()),
        }
    }

    /// Text leaf carrying the given marks.
    pub fn marked_text(payload: impl Into<String>, marks: Vec<Mark>) -> Self {
        let mut node = Self::text(payload);
        node.marks = marks;
        node
    }

    /// Size of this node in the flattened character stream. Text is its
    /// character count; a block is the sum of its children; `doc` adds 1
    /// per boundary between consecutive block siblings.
    pub fn size(&self) -> usize {
        match self.kind {
            NodeType::Text => self
                .text
                .as_deref()
                .map(|t| t.chars().count())
                .unwrap_or(0),
            NodeType::Doc => {
                let content: usize = self.content.iter().map(Node::size).sum();
                content + self.content.len().saturating_sub(1)
            }
            _ => self.content.iter().map(Node::size).sum(),
        }
    }

    /// Serialize to the wire format `{ type, attrs?, content?, marks?, text? }`.
    pub fn to_json(&self) -> JsonValue {
        // Serialize of a closed enum tree cannot fail.
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// Parse a node from the wire format and validate it against the
    /// schema. This is the canonical acceptance test for serialized trees:
    /// unknown node or mark types, marks on non-text nodes, and empty text
    /// payloads are all `MalformedDocument`.
    pub fn from_json(schema: &Schema, value: &JsonValue) -> Result<Self> {
        let node = Self::parse(schema, value)?;
        node.validate(schema)?;
        Ok(node)
    }

    fn parse(schema: &Schema, value: &JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::MalformedDocument("node must be an object".to_string()))?;
        let type_name = obj
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::MalformedDocument("node is missing a type".to_string()))?;
        let kind = schema
            .node_type(type_name)
            .ok_or_else(|| Error::MalformedDocument(format!("unknown node type: {type_name}")))?;

        let attrs = match obj.get("attrs") {
            None | Some(JsonValue::Null) => Attrs::new(),
            Some(JsonValue::Object(map)) => map.clone().into_iter().collect(),
            Some(_) => {
                return Err(Error::MalformedDocument(format!(
                    "attrs of {type_name} must be an object"
                )))
            }
        };

        let mut marks = Vec::new();
        if let Some(raw_marks) = obj.get("marks") {
            let list = raw_marks.as_array().ok_or_else(|| {
                Error::MalformedDocument(format!("marks of {type_name} must be an array"))
            })?;
            for raw in list {
                marks.push(Self::parse_mark(schema, raw)?);
            }
        }

        let mut content = Vec::new();
        if let Some(raw_content) = obj.get("content") {
            let list = raw_content.as_array().ok_or_else(|| {
                Error::MalformedDocument(format!("content of {type_name} must be an array"))
            })?;
            for raw in list {
                content.push(Self::parse(schema, raw)?);
            }
        }

        let text = match obj.get("text") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(Error::MalformedDocument(format!(
                    "text of {type_name} must be a string"
                )))
            }
        };

        Ok(Self {
            kind,
            attrs,
            content,
            marks,
            text,
        })
    }

    fn parse_mark(schema: &Schema, value: &JsonValue) -> Result<Mark> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::MalformedDocument("mark must be an object".to_string()))?;
        let type_name = obj
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::MalformedDocument("mark is missing a type".to_string()))?;
        let kind = schema
            .mark_type(type_name)
            .ok_or_else(|| Error::MalformedDocument(format!("unknown mark type: {type_name}")))?;
        let mut attrs: Attrs = match obj.get("attrs") {
            None | Some(JsonValue::Null) => Attrs::new(),
            Some(JsonValue::Object(map)) => map.clone().into_iter().collect(),
            Some(_) => {
                return Err(Error::MalformedDocument(format!(
                    "attrs of mark {type_name} must be an object"
                )))
            }
        };
        // Authorship ids are canonicalized on ingestion, mirroring the
        // canonicalization applied when marks are created in-process.
        if kind == MarkType::Author {
            if let Some(JsonValue::String(raw)) = attrs.get(AUTHOR_ATTR) {
                let canonical = canonical_actor(raw);
                attrs.insert(AUTHOR_ATTR.to_string(), JsonValue::String(canonical));
            }
        }
        Ok(Mark { kind, attrs })
    }

    /// Validate this tree's structural invariants against the schema.
    ///
    /// Rules: the root is `doc` with one or more block children; blocks
    /// contain only text leaves; marks appear only on text nodes; text
    /// payloads are non-empty; heading levels are integers in 1..=6.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        if self.kind != NodeType::Doc {
            return Err(Error::MalformedDocument(format!(
                "root must be doc, got {}",
                self.kind
            )));
        }
        if self.content.is_empty() {
            return Err(Error::MalformedDocument(
                "doc must contain at least one block".to_string(),
            ));
        }
        if !self.marks.is_empty() {
            return Err(Error::MalformedDocument(
                "marks are not allowed on doc".to_string(),
            ));
        }
        for block in &self.content {
            Self::validate_block(schema, block)?;
        }
        Ok(())
    }

    fn validate_block(schema: &Schema, block: &Node) -> Result<()> {
        if !schema.allows_node(block.kind) {
            return Err(Error::MalformedDocument(format!(
                "schema does not allow node type {}",
                block.kind
            )));
        }
        if !block.kind.is_block() {
            return Err(Error::MalformedDocument(format!(
                "doc may only contain blocks, got {}",
                block.kind
            )));
        }
        if !block.marks.is_empty() {
            return Err(Error::MalformedDocument(format!(
                "marks are not allowed on {}",
                block.kind
            )));
        }
        if block.text.is_some() {
            return Err(Error::MalformedDocument(format!(
                "{} may not carry a text payload",
                block.kind
            )));
        }
        if block.kind == NodeType::Heading {
            if let Some(level) = block.attrs.get(LEVEL_ATTR) {
                match level.as_u64() {
                    Some(1..=6) => {}
                    _ => {
                        return Err(Error::MalformedDocument(
                            "heading level must be an integer in 1..=6".to_string(),
                        ))
                    }
                }
            }
        }
        for child in &block.content {
            Self::validate_text(schema, child)?;
        }
        Ok(())
    }

    fn validate_text(schema: &Schema, node: &Node) -> Result<()> {
        if !node.kind.is_text() {
            return Err(Error::MalformedDocument(format!(
                "blocks may only contain text, got {}",
                node.kind
            )));
        }
        if !schema.allows_node(node.kind) {
            return Err(Error::MalformedDocument(
                "schema does not allow text".to_string(),
            ));
        }
        match node.text.as_deref() {
            Some("") | None => {
                return Err(Error::MalformedDocument(
                    "text payload must be non-empty".to_string(),
                ))
            }
            Some(_) => {}
        }
        if !node.content.is_empty() {
            return Err(Error::MalformedDocument(
                "text may not have children".to_string(),
            ));
        }
        for mark in &node.marks {
            if !schema.allows_mark(mark.kind) {
                return Err(Error::MalformedDocument(format!(
                    "schema does not allow mark type {}",
                    mark.kind
                )));
            }
        }
        Ok(())
    }

    /// Resolve a position to the node covering it.
    ///
    /// A boundary position (the separator between two blocks) resolves to
    /// the end of the earlier block. Walks root to leaf, so cost is the
    /// depth of the tree plus the siblings scanned at each level.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos> {
        let size = self.size();
        if pos > size {
            return Err(Error::InvalidRange(format!(
                "position {pos} exceeds document size {size}"
            )));
        }
        let mut at = 0usize;
        for (block_index, block) in self.content.iter().enumerate() {
            let block_size = block.size();
            if pos <= at + block_size {
                let offset_in_block = pos - at;
                let mut run_at = 0usize;
                for (run_index, run) in block.content.iter().enumerate() {
                    let run_size = run.size();
                    let last = run_index + 1 == block.content.len();
                    if offset_in_block < run_at + run_size || (last && offset_in_block == run_at + run_size) {
                        return Ok(ResolvedPos {
                            block: block_index,
                            run: Some(run_index),
                            offset: offset_in_block - run_at,
                        });
                    }
                    run_at += run_size;
                }
                return Ok(ResolvedPos {
                    block: block_index,
                    run: None,
                    offset: 0,
                });
            }
            // Skip the block and its trailing boundary separator.
            at += block_size + 1;
        }
        Err(Error::InvalidRange(format!(
            "position {pos} not covered by any block"
        )))
    }
}

/// A position resolved to its covering node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPos {
    /// Index of the block under the root.
    pub block: usize,
    /// Index of the text run within the block, or `None` for an empty block.
    pub run: Option<usize>,
    /// Character offset within the run.
    pub offset: usize,
}
