//! # quill-search
//!
//! Line-oriented context-window search over flattened document text, plus
//! multi-document context assembly for the language-model collaborator.
//!
//! Matching is case-insensitive substring containment, unranked. Each
//! matching line yields one snippet: the non-empty lines among its
//! predecessor, itself, and its successor, joined by line breaks.

use tracing::debug;

use quill_core::{Node, Schema};
use quill_doc::flatten;

/// Separator between documents in an assembled LLM context.
pub const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// Lazy iterator over context snippets for a query.
///
/// Restartable: it is `Clone`, and rebuilding it from the same inputs
/// yields the same sequence. Empty query or empty text produce an empty
/// sequence, not an error.
#[derive(Debug, Clone)]
pub struct ContextMatches<'a> {
    lines: Vec<&'a str>,
    query_lower: String,
    next_line: usize,
}

impl<'a> ContextMatches<'a> {
    fn new(text: &'a str, query: &str) -> Self {
        // Empty lines are preserved to keep line indices stable; an empty
        // query (or empty text) simply never matches.
        let lines = if text.is_empty() || query.is_empty() {
            Vec::new()
        } else {
            text.split('\n').collect()
        };
        Self {
            lines,
            query_lower: query.to_lowercase(),
            next_line: 0,
        }
    }

    fn snippet(&self, index: usize) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if index > 0 && !self.lines[index - 1].is_empty() {
            parts.push(self.lines[index - 1]);
        }
        parts.push(self.lines[index]);
        if index + 1 < self.lines.len() && !self.lines[index + 1].is_empty() {
            parts.push(self.lines[index + 1]);
        }
        parts.join("\n")
    }
}

impl Iterator for ContextMatches<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.next_line < self.lines.len() {
            let index = self.next_line;
            self.next_line += 1;
            if self.lines[index].to_lowercase().contains(&self.query_lower) {
                return Some(self.snippet(index));
            }
        }
        None
    }
}

/// Scan flattened text for a query, yielding one context snippet per
/// matching line, in line order. Duplicate identical lines each produce
/// their own snippet.
pub fn search<'a>(text: &'a str, query: &str) -> ContextMatches<'a> {
    ContextMatches::new(text, query)
}

/// Flatten a document and search it in one call.
pub fn search_document(schema: &Schema, doc: &Node, query: &str) -> Vec<String> {
    let text = flatten(schema, doc);
    let matches: Vec<String> = search(&text, query).collect();
    debug!(matches = matches.len(), "searched document");
    matches
}

/// Join flattened documents into one LLM context, separated by the
/// document separator token.
pub fn assemble_context<I>(texts: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let parts: Vec<String> = texts
        .into_iter()
        .map(|t| t.as_ref().to_string())
        .collect();
    parts.join(DOCUMENT_SEPARATOR)
}
