//! Persistence-facing data models: note records and sharing grants.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::node::Node;

/// A stored note: one document snapshot plus its metadata.
///
/// The snapshot is immutable; a save replaces the whole value and bumps the
/// version. The version is the store's per-document write serialization: a
/// save carries the base version it was computed against and fails with
/// `Conflict` when another writer got there first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRecord {
    pub id: Uuid,
    /// Canonical actor id of the owner.
    pub owner: String,
    pub title: String,
    /// Current document snapshot.
    pub content: Node,
    /// Monotonic per-document version, starting at 1.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sharing grant: one record per (document, grantee) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareGrant {
    pub document_id: Uuid,
    /// Canonical actor id of the grantee.
    pub grantee: String,
    pub created_at: DateTime<Utc>,
}
