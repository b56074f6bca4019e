//! # quill-store
//!
//! In-memory reference implementation of the quill persistence traits.
//!
//! The production store is an external collaborator; this implementation
//! backs the service layer in tests and small deployments. It honors the
//! same contract: per-document write serialization via a base-version
//! compare on `save`, one sharing grant per (document, grantee) pair.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use quill_core::{
    canonical_actor, Error, Node, NoteRecord, NoteStore, Result, ShareGrant, ShareStore,
};

/// In-memory note store.
#[derive(Clone, Default)]
pub struct MemoryNoteStore {
    notes: Arc<RwLock<HashMap<Uuid, NoteRecord>>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn create(&self, owner: &str, title: &str, content: Node) -> Result<NoteRecord> {
        let now = Utc::now();
        let record = NoteRecord {
            id: Uuid::now_v7(),
            owner: canonical_actor(owner),
            title: title.to_string(),
            content,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.notes.write().await.insert(record.id, record.clone());
        debug!(note_id = %record.id, owner = %record.owner, "created note");
        Ok(record)
    }

    async fn load(&self, id: Uuid) -> Result<NoteRecord> {
        self.notes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }

    async fn save(&self, id: Uuid, content: Node, base_version: u64) -> Result<u64> {
        let mut notes = self.notes.write().await;
        let record = notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        if record.version != base_version {
            return Err(Error::Conflict(format!(
                "note {id} is at version {}, save was based on {base_version}",
                record.version
            )));
        }
        record.content = content;
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.version)
    }

    async fn update_title(&self, id: Uuid, title: &str) -> Result<()> {
        let mut notes = self.notes.write().await;
        let record = notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        record.title = title.to_string();
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.notes
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NoteNotFound(id))
    }

    async fn list_owned(&self, owner: &str) -> Result<Vec<NoteRecord>> {
        let owner = canonical_actor(owner);
        let notes = self.notes.read().await;
        let mut owned: Vec<NoteRecord> = notes
            .values()
            .filter(|n| n.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }
}

/// In-memory share store.
#[derive(Clone, Default)]
pub struct MemoryShareStore {
    grants: Arc<RwLock<Vec<ShareGrant>>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn grant(&self, document_id: Uuid, grantee: &str) -> Result<ShareGrant> {
        let grantee = canonical_actor(grantee);
        let mut grants = self.grants.write().await;
        if grants
            .iter()
            .any(|g| g.document_id == document_id && g.grantee == grantee)
        {
            return Err(Error::AlreadyShared(format!(
                "note {document_id} is already shared with {grantee}"
            )));
        }
        let grant = ShareGrant {
            document_id,
            grantee,
            created_at: Utc::now(),
        };
        grants.push(grant.clone());
        debug!(note_id = %document_id, grantee = %grant.grantee, "recorded sharing grant");
        Ok(grant)
    }

    async fn list_shares_for(&self, grantee: &str) -> Result<Vec<ShareGrant>> {
        let grantee = canonical_actor(grantee);
        let grants = self.grants.read().await;
        let mut found: Vec<ShareGrant> = grants
            .iter()
            .filter(|g| g.grantee == grantee)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn grantees_of(&self, document_id: Uuid) -> Result<Vec<String>> {
        let grants = self.grants.read().await;
        Ok(grants
            .iter()
            .filter(|g| g.document_id == document_id)
            .map(|g| g.grantee.clone())
            .collect())
    }

    async fn remove_all_for(&self, document_id: Uuid) -> Result<()> {
        self.grants
            .write()
            .await
            .retain(|g| g.document_id != document_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Node;

    fn empty_doc() -> Node {
        Node::doc(vec![Node::paragraph(vec![])])
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = MemoryNoteStore::new();
        let record = store.create("alice", "first", empty_doc()).await.unwrap();
        assert_eq!(record.version, 1);
        let loaded = store.load(record.id).await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let store = MemoryNoteStore::new();
        assert!(matches!(
            store.load(Uuid::now_v7()).await,
            Err(Error::NoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let store = MemoryNoteStore::new();
        let record = store.create("alice", "t", empty_doc()).await.unwrap();
        let v2 = store
            .save(record.id, empty_doc(), record.version)
            .await
            .unwrap();
        assert_eq!(v2, 2);
    }

    #[tokio::test]
    async fn test_save_with_stale_base_conflicts() {
        let store = MemoryNoteStore::new();
        let record = store.create("alice", "t", empty_doc()).await.unwrap();
        store
            .save(record.id, empty_doc(), record.version)
            .await
            .unwrap();
        // A second writer racing with the same base version loses.
        assert!(matches!(
            store.save(record.id, empty_doc(), record.version).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_owned_is_newest_first() {
        let store = MemoryNoteStore::new();
        let first = store.create("alice", "old", empty_doc()).await.unwrap();
        let second = store.create("alice", "new", empty_doc()).await.unwrap();
        store.save(second.id, empty_doc(), 1).await.unwrap();
        store.create("bob", "other", empty_doc()).await.unwrap();
        let owned = store.list_owned("alice").await.unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].id, second.id);
        assert_eq!(owned[1].id, first.id);
    }

    #[tokio::test]
    async fn test_owner_is_canonicalized() {
        let store = MemoryNoteStore::new();
        let record = store
            .create(" \"alice\" ", "t", empty_doc())
            .await
            .unwrap();
        assert_eq!(record.owner, "alice");
        assert_eq!(store.list_owned("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_grant_rejected() {
        let shares = MemoryShareStore::new();
        let id = Uuid::now_v7();
        shares.grant(id, "bob").await.unwrap();
        assert!(matches!(
            shares.grant(id, " \"bob\" ").await,
            Err(Error::AlreadyShared(_))
        ));
    }

    #[tokio::test]
    async fn test_shares_listed_per_grantee_and_document() {
        let shares = MemoryShareStore::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        shares.grant(a, "bob").await.unwrap();
        shares.grant(b, "bob").await.unwrap();
        shares.grant(a, "carol").await.unwrap();
        assert_eq!(shares.list_shares_for("bob").await.unwrap().len(), 2);
        let grantees = shares.grantees_of(a).await.unwrap();
        assert_eq!(grantees.len(), 2);
        assert!(grantees.contains(&"bob".to_string()));
    }

    #[tokio::test]
    async fn test_remove_all_for_document() {
        let shares = MemoryShareStore::new();
        let id = Uuid::now_v7();
        shares.grant(id, "bob").await.unwrap();
        shares.grant(id, "carol").await.unwrap();
        shares.remove_all_for(id).await.unwrap();
        assert!(shares.grantees_of(id).await.unwrap().is_empty());
    }
}
