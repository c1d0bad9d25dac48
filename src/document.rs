//! The sealed, persisted unit.
//!
//! Cryptographic fields are private and have no setters. Only descriptive
//! metadata can change after a document is sealed.

use serde::{Deserialize, Serialize};

use crate::digest::ContentDigest;
use crate::envelope::{Iv, WrappedKey};
use crate::signing::{KeyFingerprint, Signature};

/// Descriptive metadata. Never part of any cryptographic computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub mime_type: Option<String>,
    pub original_name: Option<String>,
}

impl DocumentMetadata {
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            original_name: Some(original_name.into()),
        }
    }
}

/// An encrypted, signed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedDocument {
    ciphertext: Vec<u8>,
    iv: Iv,
    wrapped_key: WrappedKey,
    content_digest: ContentDigest,
    signature: Signature,
    key_fingerprint: KeyFingerprint,
    metadata: DocumentMetadata,
}

/// Every field of a [`SealedDocument`], public, for record stores that
/// persist columns individually.
#[derive(Debug, Clone)]
pub struct SealedParts {
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
    pub wrapped_key: WrappedKey,
    pub content_digest: ContentDigest,
    pub signature: Signature,
    pub key_fingerprint: KeyFingerprint,
    pub metadata: DocumentMetadata,
}

impl SealedDocument {
    /// Rebuild a document from stored parts.
    ///
    /// No verification happens here; a forged record is caught by `open`.
    pub fn from_parts(parts: SealedParts) -> Self {
        Self {
            ciphertext: parts.ciphertext,
            iv: parts.iv,
            wrapped_key: parts.wrapped_key,
            content_digest: parts.content_digest,
            signature: parts.signature,
            key_fingerprint: parts.key_fingerprint,
            metadata: parts.metadata,
        }
    }

    pub fn into_parts(self) -> SealedParts {
        SealedParts {
            ciphertext: self.ciphertext,
            iv: self.iv,
            wrapped_key: self.wrapped_key,
            content_digest: self.content_digest,
            signature: self.signature,
            key_fingerprint: self.key_fingerprint,
            metadata: self.metadata,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn iv(&self) -> &Iv {
        &self.iv
    }

    pub fn wrapped_key(&self) -> &WrappedKey {
        &self.wrapped_key
    }

    pub fn content_digest(&self) -> &ContentDigest {
        &self.content_digest
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn key_fingerprint(&self) -> &KeyFingerprint {
        &self.key_fingerprint
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Change the display name. Leaves every cryptographic field untouched.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.metadata.original_name = Some(name.into());
    }

    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) {
        self.metadata.mime_type = Some(mime_type.into());
    }
}
