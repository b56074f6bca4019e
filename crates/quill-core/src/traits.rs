//! Boundary traits for quill collaborators.
//!
//! These traits define the interfaces the core expects from its external
//! collaborators (persistence, language model), enabling pluggable backends
//! and testability. Implementations of the other side live outside the
//! core; `quill-store` ships an in-memory reference store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NoteRecord, ShareGrant};
use crate::node::Node;

/// Persistence collaborator for note snapshots.
///
/// The store serializes writes per document: `save` carries the version of
/// the snapshot the caller based its edit on and must fail with `Conflict`
/// when the stored version has moved on. The core performs no merge of
/// divergent histories.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Create a note owned by `owner` with an initial snapshot.
    async fn create(&self, owner: &str, title: &str, content: Node) -> Result<NoteRecord>;

    /// Load the current record. `NoteNotFound` if absent.
    async fn load(&self, id: Uuid) -> Result<NoteRecord>;

    /// Replace the snapshot. Fails with `Conflict` unless `base_version`
    /// matches the stored version; returns the new version on success.
    async fn save(&self, id: Uuid, content: Node, base_version: u64) -> Result<u64>;

    /// Update the note's title.
    async fn update_title(&self, id: Uuid, title: &str) -> Result<()>;

    /// Permanently delete the note.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// All notes owned by `owner`, newest updated first.
    async fn list_owned(&self, owner: &str) -> Result<Vec<NoteRecord>>;
}

/// Persistence collaborator for sharing grants.
#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Record a grant. Fails with `AlreadyShared` for a duplicate
    /// (document, grantee) pair.
    async fn grant(&self, document_id: Uuid, grantee: &str) -> Result<ShareGrant>;

    /// All grants naming `grantee`, newest first.
    async fn list_shares_for(&self, grantee: &str) -> Result<Vec<ShareGrant>>;

    /// Canonical actor ids the document is shared with.
    async fn grantees_of(&self, document_id: Uuid) -> Result<Vec<String>>;

    /// Drop every grant for a document (on delete).
    async fn remove_all_for(&self, document_id: Uuid) -> Result<()>;
}

/// Language-model collaborator: a black-box text-completion service.
///
/// Any non-success response surfaces as `ExternalService`, never as a
/// structural document error. The core performs no retries.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete `prompt` given a system instruction and assembled context.
    async fn complete(&self, system: &str, context: &str, prompt: &str) -> Result<String>;
}
