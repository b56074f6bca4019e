//! # quill-notes
//!
//! The note service layer: gate-checked note CRUD, edit transactions with
//! authorship attribution, sharing grants, context-window search across
//! readable notes, and ask-the-LLM over assembled note context.

pub mod mock;
pub mod openai;
pub mod service;

pub use mock::MockCompletionBackend;
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use service::{AskAnswer, NoteMatches, NoteService, NOTES_ASSISTANT_PROMPT};
