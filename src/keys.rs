//! Key material and ownership.
//!
//! This module owns three responsibilities:
//! 1. Holding master and per-document keys in types that are opaque,
//!    non-cloneable, and zeroised on drop.
//! 2. Deriving the per-version wrapping key from a master key with
//!    HKDF-SHA256.
//! 3. The versioned [`KeyRing`] that maps a wrapped key's version to the
//!    master key that sealed it.
//!
//! ## Derivation structure
//!
//! ```text
//! master   = SHA-256(operator_secret)          (or 32 random bytes)
//! wrap_key = HKDF-SHA256(
//!     ikm  = master,
//!     salt = None,
//!     info = "docseal:key-wrap:v{version}"
//! )
//! ```

use std::collections::BTreeMap;
use std::fmt;

use ring::hkdf;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, KEY_LEN};
use crate::digest;
use crate::error::DocsealError;

/// Version number of a master key.
pub type KeyVersion = u32;

// ---------------------------------------------------------------------------
// Master key
// ---------------------------------------------------------------------------

/// A long-lived master key. The only secret the operator must manage.
///
/// - Not `Clone`.
/// - Zeroised on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    #[zeroize(skip)]
    version: KeyVersion,
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Derive a master key from an operator-supplied secret.
    ///
    /// The secret is hashed so the key is always 256 bits and unrelated in
    /// form to the secret's encoding.
    pub fn from_secret(version: KeyVersion, secret: &[u8]) -> Result<Self, DocsealError> {
        if secret.is_empty() {
            return Err(DocsealError::InvalidKey);
        }
        Ok(Self {
            version,
            bytes: *digest::digest(secret).as_bytes(),
        })
    }

    /// Construct a master key from raw bytes, e.g. sourced from a KMS.
    pub fn from_bytes(version: KeyVersion, bytes: [u8; KEY_LEN]) -> Self {
        Self { version, bytes }
    }

    /// Generate a random master key.
    pub fn generate(version: KeyVersion) -> Result<Self, DocsealError> {
        Ok(Self::from_bytes(version, crypto::random_bytes()?))
    }

    pub fn version(&self) -> KeyVersion {
        self.version
    }

    /// Derive the AEAD key used to wrap document keys under this master.
    pub(crate) fn wrapping_key(&self) -> Result<WrappingKey, DocsealError> {
        let info = wrap_info(self.version);

        // Empty salt: HKDF treats it as a zero-filled salt of hash length.
        let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, &[]);
        let prk = salt.extract(&self.bytes);

        let info_slices = [info.as_bytes()];
        let okm = prk
            .expand(&info_slices, hkdf::HKDF_SHA256)
            .map_err(|_| DocsealError::InvalidKey)?;

        let mut bytes = [0u8; KEY_LEN];
        okm.fill(&mut bytes).map_err(|_| DocsealError::InvalidKey)?;
        Ok(WrappingKey { bytes })
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// HKDF info string and wrapping AAD for a master key version.
pub(crate) fn wrap_info(version: KeyVersion) -> String {
    format!("docseal:key-wrap:v{}", version)
}

// ---------------------------------------------------------------------------
// Derived and per-document keys
// ---------------------------------------------------------------------------

/// AEAD key derived from a master key. Lives only for one wrap/unwrap.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct WrappingKey {
    bytes: [u8; KEY_LEN],
}

impl WrappingKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// A fresh symmetric key for exactly one document.
///
/// Raw bytes never leave the crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DocumentKey {
    bytes: [u8; KEY_LEN],
}

impl DocumentKey {
    /// Draw a full-entropy 256-bit key from the system CSPRNG.
    pub fn generate() -> Result<Self, DocsealError> {
        Ok(Self {
            bytes: crypto::random_bytes()?,
        })
    }

    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DocumentKey(..)")
    }
}

// ---------------------------------------------------------------------------
// Key ring
// ---------------------------------------------------------------------------

/// Master keys by version, with one active version used for new seals.
///
/// A single-key deployment holds exactly one entry. Additional versions can
/// be registered so records wrapped under an older key still open; nothing
/// here re-wraps existing records.
#[derive(Debug)]
pub struct KeyRing {
    keys: BTreeMap<KeyVersion, MasterKey>,
    active: KeyVersion,
}

impl KeyRing {
    /// A ring holding one master key, which is also the active one.
    pub fn single(master: MasterKey) -> Self {
        let active = master.version();
        let mut keys = BTreeMap::new();
        keys.insert(active, master);
        Self { keys, active }
    }

    /// Register an additional master key.
    ///
    /// Fails if the version is already present; a version always maps to
    /// the same key for the life of the ring.
    pub fn insert(&mut self, master: MasterKey) -> Result<(), DocsealError> {
        let version = master.version();
        if self.keys.contains_key(&version) {
            return Err(DocsealError::Config(format!(
                "master key version {} already registered",
                version
            )));
        }
        self.keys.insert(version, master);
        Ok(())
    }

    /// Make `version` the key used for new seals.
    pub fn set_active(&mut self, version: KeyVersion) -> Result<(), DocsealError> {
        if !self.keys.contains_key(&version) {
            return Err(DocsealError::UnknownKeyVersion(version));
        }
        self.active = version;
        Ok(())
    }

    pub fn active(&self) -> &MasterKey {
        // `active` is only ever set to a version present in `keys`.
        &self.keys[&self.active]
    }

    pub fn get(&self, version: KeyVersion) -> Result<&MasterKey, DocsealError> {
        self.keys
            .get(&version)
            .ok_or(DocsealError::UnknownKeyVersion(version))
    }

    pub fn versions(&self) -> impl Iterator<Item = KeyVersion> + '_ {
        self.keys.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_derivation_is_deterministic() {
        let a = MasterKey::from_secret(1, b"operator secret").unwrap();
        let b = MasterKey::from_secret(1, b"operator secret").unwrap();
        let c = MasterKey::from_secret(1, b"another secret").unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_ne!(a.bytes, c.bytes);
        assert_ne!(&a.bytes[..], b"operator secret");
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(MasterKey::from_secret(1, b"").is_err());
    }

    #[test]
    fn wrapping_key_depends_on_version() {
        let v1 = MasterKey::from_bytes(1, [3u8; KEY_LEN]);
        let v2 = MasterKey::from_bytes(2, [3u8; KEY_LEN]);
        let k1 = v1.wrapping_key().unwrap();
        let k2 = v2.wrapping_key().unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
        assert_ne!(k1.as_bytes(), &[3u8; KEY_LEN]);
    }

    #[test]
    fn document_keys_are_fresh() {
        let a = DocumentKey::generate().unwrap();
        let b = DocumentKey::generate().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn key_ring_lookup_and_activation() {
        let mut ring = KeyRing::single(MasterKey::generate(1).unwrap());
        assert_eq!(ring.active().version(), 1);
        assert!(matches!(ring.get(2), Err(DocsealError::UnknownKeyVersion(2))));
        assert!(ring.set_active(2).is_err());

        ring.insert(MasterKey::generate(2).unwrap()).unwrap();
        assert!(ring.insert(MasterKey::generate(2).unwrap()).is_err());
        ring.set_active(2).unwrap();
        assert_eq!(ring.active().version(), 2);
        assert_eq!(ring.versions().collect::<Vec<_>>(), vec![1, 2]);
    }
}
