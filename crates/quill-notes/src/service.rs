//! Note service: the orchestration between the access gate, the edit
//! pipeline, the stores, and the completion backend.
//!
//! Every request resolves the actor's relation to the document fresh from
//! the stores, gates the operation, and only then touches the pipeline.
//! Mutations are all-or-nothing: a failing step, attribution, or
//! conflicting save leaves the stored snapshot unchanged.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use quill_core::{
    canonical_actor, AccessRelation, CompletionBackend, Error, Node, NoteRecord, NoteStore,
    Result, Schema, ShareGrant, ShareStore,
};
use quill_doc::{attribute, flatten, step, Transaction};
use quill_search::{assemble_context, search};

/// System instruction sent with every ask request.
pub const NOTES_ASSISTANT_PROMPT: &str = "You are a world class assistant within an app for \
taking notes. You will take what the user has already written in their notes as context, and \
then answer the actual question keeping the context in mind. If the user's context contains a \
list, you will return your answer in the form of a list. If the user's context contains a \
table, you will answer the question using a table.";

/// Search result for one note.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NoteMatches {
    pub note_id: Uuid,
    pub title: String,
    /// One context snippet per matching line, in line order.
    pub snippets: Vec<String>,
}

/// Answer to an ask request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AskAnswer {
    pub answer: String,
    /// Number of notes included in the assembled context.
    pub note_count: usize,
}

/// The note service.
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteStore>,
    shares: Arc<dyn ShareStore>,
    llm: Arc<dyn CompletionBackend>,
    schema: Schema,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        shares: Arc<dyn ShareStore>,
        llm: Arc<dyn CompletionBackend>,
        schema: Schema,
    ) -> Self {
        Self {
            notes,
            shares,
            llm,
            schema,
        }
    }

    /// Recompute the actor's relation to a note from the current store
    /// records. Never cached.
    async fn relation_for(&self, actor: &str, record: &NoteRecord) -> Result<AccessRelation> {
        let actor = canonical_actor(actor);
        if record.owner == actor {
            return Ok(AccessRelation::Owner);
        }
        let grantees = self.shares.grantees_of(record.id).await?;
        if grantees.iter().any(|g| g == &actor) {
            Ok(AccessRelation::SharedWriter)
        } else {
            Ok(AccessRelation::None)
        }
    }

    /// Create a note owned by `owner`. The content must pass validation; a
    /// missing content means a single empty paragraph.
    pub async fn create_note(
        &self,
        owner: &str,
        title: &str,
        content: Option<Node>,
    ) -> Result<NoteRecord> {
        let content = content.unwrap_or_else(|| Node::doc(vec![Node::paragraph(vec![])]));
        content.validate(&self.schema)?;
        let record = self.notes.create(owner, title, content).await?;
        info!(note_id = %record.id, actor = %record.owner, op = "create_note", "note created");
        Ok(record)
    }

    /// Load a note the actor may read.
    pub async fn get_note(&self, actor: &str, id: Uuid) -> Result<NoteRecord> {
        let record = self.notes.load(id).await?;
        self.relation_for(actor, &record)
            .await?
            .require_read(actor)?;
        Ok(record)
    }

    /// Apply an edit transaction to a note. The transaction's actor is the
    /// acting user; inserted text is attributed to them. All-or-nothing:
    /// any failure leaves the stored snapshot unchanged.
    pub async fn apply_edit(&self, id: Uuid, tx: &Transaction) -> Result<NoteRecord> {
        let started = Instant::now();
        let record = self.notes.load(id).await?;
        self.relation_for(&tx.actor, &record)
            .await?
            .require_edit(&tx.actor)?;

        let (next, inserted) = step::apply(&self.schema, &record.content, tx)?;
        let attributed = attribute(&self.schema, &next, &inserted, &tx.actor)?;
        self.notes.save(id, attributed, record.version).await?;

        debug!(
            note_id = %id,
            actor = %canonical_actor(&tx.actor),
            op = "apply_edit",
            step_count = tx.steps.len(),
            range_count = inserted.len(),
            base_version = record.version,
            duration_ms = started.elapsed().as_millis() as u64,
            "edit applied"
        );
        self.notes.load(id).await
    }

    /// Rename a note.
    pub async fn update_title(&self, actor: &str, id: Uuid, title: &str) -> Result<()> {
        let record = self.notes.load(id).await?;
        self.relation_for(actor, &record)
            .await?
            .require_edit(actor)?;
        self.notes.update_title(id, title).await
    }

    /// Delete a note and its sharing grants. Owner only.
    pub async fn delete_note(&self, actor: &str, id: Uuid) -> Result<()> {
        let record = self.notes.load(id).await?;
        self.relation_for(actor, &record)
            .await?
            .require_delete(actor)?;
        self.notes.delete(id).await?;
        self.shares.remove_all_for(id).await?;
        info!(note_id = %id, actor = %canonical_actor(actor), op = "delete_note", "note deleted");
        Ok(())
    }

    /// Share a note with another actor for writing. Owner only; duplicate
    /// grants are rejected at the store boundary.
    pub async fn share_note(&self, actor: &str, id: Uuid, grantee: &str) -> Result<ShareGrant> {
        let record = self.notes.load(id).await?;
        self.relation_for(actor, &record)
            .await?
            .require_manage_sharing(actor)?;
        let grantee = canonical_actor(grantee);
        if grantee.is_empty() {
            return Err(Error::InvalidInput("grantee must be non-empty".to_string()));
        }
        let grant = self.shares.grant(id, &grantee).await?;
        info!(note_id = %id, actor = %canonical_actor(actor), grantee = %grant.grantee, op = "share_note", "note shared");
        Ok(grant)
    }

    /// Every note the actor can read: owned first (newest updated first),
    /// then shared (newest grant first).
    async fn readable_notes(&self, actor: &str) -> Result<Vec<NoteRecord>> {
        let actor = canonical_actor(actor);
        let mut records = self.notes.list_owned(&actor).await?;
        for grant in self.shares.list_shares_for(&actor).await? {
            match self.notes.load(grant.document_id).await {
                Ok(record) => records.push(record),
                // A grant can outlive its note; skip rather than fail the
                // whole listing.
                Err(Error::NoteNotFound(id)) => {
                    warn!(note_id = %id, "sharing grant references a missing note");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }

    /// Context-window search across every note the actor can read.
    pub async fn search_notes(&self, actor: &str, query: &str) -> Result<Vec<NoteMatches>> {
        let started = Instant::now();
        let mut results = Vec::new();
        if query.is_empty() {
            return Ok(results);
        }
        for record in self.readable_notes(actor).await? {
            let text = flatten(&self.schema, &record.content);
            let snippets: Vec<String> = search(&text, query).collect();
            if !snippets.is_empty() {
                results.push(NoteMatches {
                    note_id: record.id,
                    title: record.title.clone(),
                    snippets,
                });
            }
        }
        debug!(
            actor = %canonical_actor(actor),
            op = "search_notes",
            query = %query,
            match_count = results.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(results)
    }

    /// Ask the language model a question over the actor's own notes.
    ///
    /// The context is the flattened text of every owned note, newest
    /// first, joined by the document separator. Backend failures surface
    /// as `ExternalService`; they never corrupt or partially apply
    /// anything.
    pub async fn ask(&self, actor: &str, prompt: &str) -> Result<AskAnswer> {
        let owned = self.notes.list_owned(&canonical_actor(actor)).await?;
        let note_count = owned.len();
        let texts: Vec<String> = owned
            .iter()
            .map(|record| flatten(&self.schema, &record.content))
            .collect();
        let context = assemble_context(texts);
        debug!(
            actor = %canonical_actor(actor),
            op = "ask",
            note_count,
            prompt_len = prompt.len(),
            "assembled ask context"
        );
        let answer = self
            .llm
            .complete(NOTES_ASSISTANT_PROMPT, &context, prompt)
            .await?;
        Ok(AskAnswer { answer, note_count })
    }
}
