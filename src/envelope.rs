//! Envelope encryption.
//!
//! Two nested, logically independent uses of the same AEAD primitive:
//!
//! ```text
//! document bytes --AES-256-GCM(document_key, iv)--> ciphertext
//! document_key   --AES-256-GCM(wrap_key(master), nonce, aad=version)--> wrapped key
//! ```
//!
//! A leaked document key exposes one document. A leaked master key exposes
//! the ability to unwrap document keys, but is never itself a document key.

use serde::{Deserialize, Serialize};

use crate::crypto::{self, IV_LEN, KEY_LEN};
use crate::error::DocsealError;
use crate::keys::{self, DocumentKey, KeyRing, KeyVersion, MasterKey};

/// Initialization vector of a document encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Iv([u8; IV_LEN]);

impl Iv {
    pub fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// A document key encrypted under a versioned master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    /// Version of the master key that wrapped this key.
    pub version: KeyVersion,
    /// Nonce of the wrapping operation.
    pub nonce: [u8; IV_LEN],
    /// Encrypted key bytes followed by the GCM tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypt document bytes under a per-document key with a fresh IV.
pub fn encrypt(plaintext: &[u8], key: &DocumentKey) -> Result<(Vec<u8>, Iv), DocsealError> {
    let (ciphertext, iv) = crypto::seal(key.as_bytes(), plaintext, &[])?;
    Ok((ciphertext, Iv(iv)))
}

/// Decrypt document bytes. Any rejection by the primitive is a
/// `DecryptionFailure`; corrupted plaintext is never returned.
pub fn decrypt(ciphertext: &[u8], key: &DocumentKey, iv: &Iv) -> Result<Vec<u8>, DocsealError> {
    crypto::open(key.as_bytes(), &iv.0, ciphertext, &[])
}

/// Wrap a document key under `master`.
///
/// The master key version is bound as AAD so a wrapped key cannot be
/// relabelled to a different version.
pub fn wrap_key(key: &DocumentKey, master: &MasterKey) -> Result<WrappedKey, DocsealError> {
    let wrapping = master.wrapping_key()?;
    let aad = keys::wrap_info(master.version());
    let (ciphertext, nonce) = crypto::seal(wrapping.as_bytes(), key.as_bytes(), aad.as_bytes())?;
    Ok(WrappedKey {
        version: master.version(),
        nonce,
        ciphertext,
    })
}

/// Recover a document key from its wrapped form.
///
/// Fails with `KeyUnwrapFailure` when `master` is not the key that wrapped
/// it, or the wrapped bytes were altered.
pub fn unwrap_key(wrapped: &WrappedKey, master: &MasterKey) -> Result<DocumentKey, DocsealError> {
    let failure = || DocsealError::KeyUnwrapFailure {
        document: None,
        version: wrapped.version,
    };
    if wrapped.version != master.version() {
        return Err(failure());
    }

    let wrapping = master.wrapping_key()?;
    let aad = keys::wrap_info(wrapped.version);
    let raw = zeroize::Zeroizing::new(
        crypto::open(
            wrapping.as_bytes(),
            &wrapped.nonce,
            &wrapped.ciphertext,
            aad.as_bytes(),
        )
        .map_err(|_| failure())?,
    );

    let bytes: [u8; KEY_LEN] = raw.as_slice().try_into().map_err(|_| failure())?;
    Ok(DocumentKey::from_bytes(bytes))
}

/// Unwrap using whichever master key in `ring` matches the recorded version.
pub fn unwrap_with_ring(wrapped: &WrappedKey, ring: &KeyRing) -> Result<DocumentKey, DocsealError> {
    let master = ring.get(wrapped.version)?;
    unwrap_key(wrapped, master)
}
