//! Seal and open.
//!
//! ```text
//! seal: plaintext -> digest -> sign -> encrypt(fresh key, fresh iv) -> wrap key
//! open: unwrap key -> decrypt -> recompute digest -> verify signature
//! ```
//!
//! The pipeline holds no per-call state. Its key ring and signer are
//! immutable after construction and shared behind `Arc`, so any number of
//! threads may seal and open concurrently through clones of one pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use zeroize::Zeroizing;

use crate::digest::{self, ContentDigest};
use crate::document::{DocumentMetadata, SealedDocument, SealedParts};
use crate::envelope;
use crate::error::DocsealError;
use crate::keys::{DocumentKey, KeyRing};
use crate::signing::{KeyFingerprint, SignatureEngine};

/// Outcome of the two post-decryption checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    /// The recomputed digest matches the stored one.
    pub integrity: bool,
    /// The stored signature verifies under the pipeline's signing key.
    pub authenticity: bool,
}

impl VerificationVerdict {
    pub fn is_verified(&self) -> bool {
        self.integrity && self.authenticity
    }
}

/// Plaintext released by [`DocumentPipeline::open`].
///
/// Only produced when integrity passed. Authenticity may still be false.
#[derive(Debug)]
pub struct OpenedDocument {
    pub plaintext: Vec<u8>,
    pub verdict: VerificationVerdict,
    pub key_fingerprint: KeyFingerprint,
}

impl OpenedDocument {
    /// Release the plaintext only if the signature also verified.
    pub fn into_authentic(self) -> Result<Vec<u8>, DocsealError> {
        if self.verdict.authenticity {
            Ok(self.plaintext)
        } else {
            Err(DocsealError::AuthenticityFailure {
                document: None,
                fingerprint: self.key_fingerprint.to_string(),
            })
        }
    }
}

/// Result of [`DocumentPipeline::verify_only`]: proof without payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verdict: VerificationVerdict,
    pub key_fingerprint: KeyFingerprint,
    pub content_digest: String,
    pub metadata: DocumentMetadata,
}

/// The document confidentiality-and-integrity pipeline.
#[derive(Clone)]
pub struct DocumentPipeline {
    keys: Arc<KeyRing>,
    signer: Arc<SignatureEngine>,
}

impl std::fmt::Debug for DocumentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPipeline")
            .field("active_key_version", &self.keys.active().version())
            .field("signer", &self.signer)
            .finish()
    }
}

impl DocumentPipeline {
    pub fn new(keys: Arc<KeyRing>, signer: Arc<SignatureEngine>) -> Self {
        Self { keys, signer }
    }

    pub fn signer(&self) -> &SignatureEngine {
        &self.signer
    }

    pub fn key_ring(&self) -> &KeyRing {
        &self.keys
    }

    /// Seal plaintext with empty metadata.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedDocument, DocsealError> {
        self.seal_with_metadata(plaintext, DocumentMetadata::default())
    }

    /// Seal plaintext into a new [`SealedDocument`].
    ///
    /// Either every cryptographic field is produced or an error is
    /// returned; there is no partially sealed output.
    pub fn seal_with_metadata(
        &self,
        plaintext: &[u8],
        metadata: DocumentMetadata,
    ) -> Result<SealedDocument, DocsealError> {
        if plaintext.is_empty() {
            return Err(DocsealError::EmptyPlaintext);
        }

        let content_digest = digest::digest(plaintext);
        let (signature, key_fingerprint) = self.signer.sign(plaintext);

        let key = DocumentKey::generate()?;
        let (ciphertext, iv) = envelope::encrypt(plaintext, &key)?;
        let master = self.keys.active();
        let wrapped_key = envelope::wrap_key(&key, master)?;

        debug!(
            bytes = plaintext.len(),
            key_version = master.version(),
            fingerprint = %key_fingerprint,
            "sealed document"
        );

        Ok(SealedDocument::from_parts(SealedParts {
            ciphertext,
            iv,
            wrapped_key,
            content_digest,
            signature,
            key_fingerprint,
            metadata,
        }))
    }

    /// Decrypt and verify a sealed document.
    ///
    /// Integrity failure aborts and discards the plaintext. Authenticity
    /// failure does not abort; it is reported in the verdict.
    pub fn open(&self, sealed: &SealedDocument) -> Result<OpenedDocument, DocsealError> {
        let wrapped = sealed.wrapped_key();
        let key = envelope::unwrap_with_ring(wrapped, &self.keys).map_err(|e| {
            error!(key_version = wrapped.version, error = %e, "key unwrap failed");
            match e {
                DocsealError::UnknownKeyVersion(version) => DocsealError::KeyUnwrapFailure {
                    document: None,
                    version,
                },
                other => other,
            }
        })?;

        // Wiped on drop if a later check rejects it.
        let mut plaintext = Zeroizing::new(
            envelope::decrypt(sealed.ciphertext(), &key, sealed.iv()).map_err(|e| {
                error!(error = %e, "document decryption rejected");
                e
            })?,
        );

        let recomputed = digest::digest(&plaintext);
        check_integrity(sealed.content_digest(), &recomputed)?;

        let authenticity = self.signer.verify(&plaintext, sealed.signature());
        if !authenticity {
            warn!(
                recorded_fingerprint = %sealed.key_fingerprint(),
                signer_fingerprint = %self.signer.fingerprint(),
                "signature does not verify"
            );
        }
        debug!(bytes = plaintext.len(), authenticity, "opened document");

        Ok(OpenedDocument {
            plaintext: std::mem::take(&mut *plaintext),
            verdict: VerificationVerdict {
                integrity: true,
                authenticity,
            },
            key_fingerprint: sealed.key_fingerprint().clone(),
        })
    }

    /// Run every open check without handing the plaintext back.
    pub fn verify_only(&self, sealed: &SealedDocument) -> Result<VerificationReport, DocsealError> {
        let opened = self.open(sealed)?;
        Ok(VerificationReport {
            verdict: opened.verdict,
            key_fingerprint: opened.key_fingerprint,
            content_digest: sealed.content_digest().to_hex(),
            metadata: sealed.metadata().clone(),
        })
    }
}

fn check_integrity(stored: &ContentDigest, recomputed: &ContentDigest) -> Result<(), DocsealError> {
    if stored.matches(recomputed) {
        return Ok(());
    }
    error!(
        expected = %stored,
        actual = %recomputed,
        "integrity violation: digest mismatch after decryption"
    );
    Err(DocsealError::IntegrityViolation {
        document: None,
        expected: stored.to_hex(),
        actual: recomputed.to_hex(),
    })
}
