//! Record storage seam.
//!
//! The pipeline does not own persistence. A [`RecordStore`] keeps sealed
//! documents under an opaque id, scoped to the owning user. Authorization is
//! the caller's business: the store trusts the owner it is handed.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::document::SealedDocument;
use crate::error::DocsealError;

/// Opaque identifier of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// A random 128-bit identifier.
    pub fn random() -> Result<Self, DocsealError> {
        let bytes: [u8; 16] = crypto::random_bytes()?;
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistence for sealed documents, keyed by owner and id.
pub trait RecordStore: Send + Sync {
    /// Persist a new record and return its id.
    fn insert(&self, owner: &str, doc: SealedDocument) -> Result<DocumentId, DocsealError>;

    /// Fetch a record. Ids belonging to another owner are reported as
    /// not found.
    fn get(&self, owner: &str, id: &DocumentId) -> Result<SealedDocument, DocsealError>;

    /// Change the display name of a record.
    fn rename(&self, owner: &str, id: &DocumentId, name: &str) -> Result<(), DocsealError>;

    /// Remove a record permanently.
    fn delete(&self, owner: &str, id: &DocumentId) -> Result<(), DocsealError>;

    /// Ids of every record held for `owner`.
    fn list(&self, owner: &str) -> Result<Vec<DocumentId>, DocsealError>;
}

type RecordKey = (String, DocumentId);

/// A process-local store, mainly for tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<RecordKey, SealedDocument>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(owner: &str, id: &DocumentId) -> RecordKey {
        (owner.to_string(), id.clone())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, owner: &str, doc: SealedDocument) -> Result<DocumentId, DocsealError> {
        let id = DocumentId::random()?;
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(Self::key(owner, &id), doc);
        Ok(id)
    }

    fn get(&self, owner: &str, id: &DocumentId) -> Result<SealedDocument, DocsealError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .get(&Self::key(owner, id))
            .cloned()
            .ok_or_else(|| DocsealError::DocumentNotFound(id.clone()))
    }

    fn rename(&self, owner: &str, id: &DocumentId, name: &str) -> Result<(), DocsealError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let doc = records
            .get_mut(&Self::key(owner, id))
            .ok_or_else(|| DocsealError::DocumentNotFound(id.clone()))?;
        doc.rename(name);
        Ok(())
    }

    fn delete(&self, owner: &str, id: &DocumentId) -> Result<(), DocsealError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records
            .remove(&Self::key(owner, id))
            .map(|_| ())
            .ok_or_else(|| DocsealError::DocumentNotFound(id.clone()))
    }

    fn list(&self, owner: &str) -> Result<Vec<DocumentId>, DocsealError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<DocumentId> = records
            .keys()
            .filter(|(o, _)| o == owner)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentMetadata, SealedParts};
    use crate::envelope::{Iv, WrappedKey};
    use crate::signing::{KeyFingerprint, Signature};

    fn doc() -> SealedDocument {
        SealedDocument::from_parts(SealedParts {
            ciphertext: vec![0xaa; 20],
            iv: Iv::from_bytes([1u8; 12]),
            wrapped_key: WrappedKey {
                version: 1,
                nonce: [2u8; 12],
                ciphertext: vec![3u8; 48],
            },
            content_digest: crate::digest::digest(b"doc"),
            signature: Signature::from_bytes(vec![4u8; 64]),
            key_fingerprint: KeyFingerprint::from("ff"),
            metadata: DocumentMetadata::new("doc.txt", "text/plain"),
        })
    }

    #[test]
    fn records_are_scoped_by_owner() {
        let store = InMemoryRecordStore::new();
        let id = store.insert("alice", doc()).unwrap();

        assert!(store.get("alice", &id).is_ok());
        assert!(matches!(
            store.get("bob", &id),
            Err(DocsealError::DocumentNotFound(_))
        ));
        assert!(store.delete("bob", &id).is_err());
        assert_eq!(store.list("alice").unwrap(), vec![id.clone()]);
        assert!(store.list("bob").unwrap().is_empty());
    }

    #[test]
    fn rename_then_delete() {
        let store = InMemoryRecordStore::new();
        let id = store.insert("alice", doc()).unwrap();
        store.rename("alice", &id, "renamed.txt").unwrap();
        let got = store.get("alice", &id).unwrap();
        assert_eq!(got.metadata().original_name.as_deref(), Some("renamed.txt"));

        store.delete("alice", &id).unwrap();
        assert!(store.get("alice", &id).is_err());
    }

    #[test]
    fn ids_are_unique() {
        let store = InMemoryRecordStore::new();
        let a = store.insert("alice", doc()).unwrap();
        let b = store.insert("alice", doc()).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }
}
