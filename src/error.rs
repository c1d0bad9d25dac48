//! Error types for docseal.
//!
//! Every variant is a distinct failure mode of the sealing pipeline. Messages
//! are intentionally minimal. They signal *what* failed without revealing
//! key material or plaintext.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::DocumentId;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, DocsealError>;

/// The single error type for all docseal operations.
#[derive(Debug, Error)]
pub enum DocsealError {
    /// Seal was called with no bytes to protect.
    #[error("input error: plaintext is empty")]
    EmptyPlaintext,

    /// A cryptographic key was invalid (wrong length, malformed, etc.).
    #[error("invalid key")]
    InvalidKey,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// Encryption failed. The underlying `ring` operation returned an error.
    #[error("encryption failed")]
    EncryptionFailure,

    /// The signing key could not be generated, parsed or used.
    #[error("signing failed")]
    SigningFailure,

    /// The wrapped document key could not be recovered under the master key
    /// of the recorded version.
    #[error("key unwrap failed for document {} (key version {version})", display_id(.document))]
    KeyUnwrapFailure {
        document: Option<DocumentId>,
        version: u32,
    },

    /// The key ring holds no master key for the requested version.
    #[error("no master key for version {0}")]
    UnknownKeyVersion(u32),

    /// The ciphertext, IV and key were rejected by the AEAD primitive.
    #[error("decryption failed for document {}", display_id(.document))]
    DecryptionFailure { document: Option<DocumentId> },

    /// Decryption succeeded but the recomputed digest does not match the
    /// stored one. The plaintext is discarded.
    #[error(
        "integrity violation for document {}: expected digest {expected}, got {actual}",
        display_id(.document)
    )]
    IntegrityViolation {
        document: Option<DocumentId>,
        expected: String,
        actual: String,
    },

    /// The signature does not verify although integrity passed. Only raised
    /// when a caller asks for authenticity to be enforced.
    #[error(
        "authenticity failure for document {}: signature does not verify under key {fingerprint}",
        display_id(.document)
    )]
    AuthenticityFailure {
        document: Option<DocumentId>,
        fingerprint: String,
    },

    /// No record with this identifier exists for the requesting owner.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn display_id(id: &Option<DocumentId>) -> &str {
    id.as_ref().map(DocumentId::as_str).unwrap_or("<unsaved>")
}

/// Outcome classes reported to audit sinks.
///
/// Coarser than [`DocsealError`]: it carries no context, only the kind, so it
/// can be serialized into audit records without leaking detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InputError,
    KeyUnwrapFailure,
    DecryptionFailure,
    IntegrityViolation,
    AuthenticityFailure,
    NotFound,
    Internal,
}

impl DocsealError {
    /// Classify this error for audit reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EmptyPlaintext => FailureKind::InputError,
            Self::KeyUnwrapFailure { .. } | Self::UnknownKeyVersion(_) => {
                FailureKind::KeyUnwrapFailure
            }
            Self::DecryptionFailure { .. } => FailureKind::DecryptionFailure,
            Self::IntegrityViolation { .. } => FailureKind::IntegrityViolation,
            Self::AuthenticityFailure { .. } => FailureKind::AuthenticityFailure,
            Self::DocumentNotFound(_) => FailureKind::NotFound,
            Self::InvalidKey
            | Self::RandomnessFailure
            | Self::EncryptionFailure
            | Self::SigningFailure
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_) => FailureKind::Internal,
        }
    }

    /// Attach a document id to a failure raised by the stateless pipeline.
    ///
    /// Ids already present are kept. Variants without a document slot are
    /// returned unchanged.
    pub fn for_document(mut self, id: &DocumentId) -> Self {
        match &mut self {
            Self::KeyUnwrapFailure { document, .. }
            | Self::DecryptionFailure { document }
            | Self::IntegrityViolation { document, .. }
            | Self::AuthenticityFailure { document, .. } => {
                if document.is_none() {
                    *document = Some(id.clone());
                }
            }
            _ => {}
        }
        self
    }
}
