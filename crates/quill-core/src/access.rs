//! Access gate: per-request authorization decisions.
//!
//! The relation between an actor and a document is recomputed fresh on
//! every request from the persistence collaborator's current ownership and
//! sharing records; nothing here caches or transitions state. The gate
//! itself is a pure decision function over that relation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An actor's relation to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRelation {
    /// The actor owns the document.
    Owner,
    /// The document has been shared with the actor for writing.
    SharedWriter,
    /// No relation.
    None,
}

impl AccessRelation {
    /// Whether the actor may mutate the document's content or title.
    pub fn can_edit(&self) -> bool {
        matches!(self, Self::Owner | Self::SharedWriter)
    }

    /// Whether the actor may grant or inspect sharing for the document.
    pub fn can_manage_sharing(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Whether the actor may delete the document.
    pub fn can_delete(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Whether the actor may read the document at all.
    pub fn can_read(&self) -> bool {
        matches!(self, Self::Owner | Self::SharedWriter)
    }

    /// Gate a content/title mutation.
    pub fn require_edit(&self, actor: &str) -> Result<()> {
        if self.can_edit() {
            Ok(())
        } else {
            Err(Error::Forbidden(format!("{actor} may not edit this note")))
        }
    }

    /// Gate a share-management operation.
    pub fn require_manage_sharing(&self, actor: &str) -> Result<()> {
        if self.can_manage_sharing() {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "{actor} may not manage sharing for this note"
            )))
        }
    }

    /// Gate a delete.
    pub fn require_delete(&self, actor: &str) -> Result<()> {
        if self.can_delete() {
            Ok(())
        } else {
            Err(Error::Forbidden(format!("{actor} may not delete this note")))
        }
    }

    /// Gate a read.
    pub fn require_read(&self, actor: &str) -> Result<()> {
        if self.can_read() {
            Ok(())
        } else {
            Err(Error::Forbidden(format!("{actor} may not read this note")))
        }
    }
}
