//! Detached signatures over document plaintext.
//!
//! Ed25519 via `ring::signature`. The private key is held inside
//! [`SignatureEngine`] and is never serialized into a document record.
//! Verification always runs against the engine's own public key; the
//! fingerprint stored alongside a signature is informational only.

use std::fmt;

use ring::rand::SystemRandom;
use ring::signature::{self, Ed25519KeyPair, KeyPair, UnparsedPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::digest;
use crate::error::DocsealError;

/// Number of public-key digest bytes kept in a fingerprint.
const FINGERPRINT_LEN: usize = 16;

/// A detached Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap raw bytes. No length check is done here: malformed signatures
    /// are rejected by [`SignatureEngine::verify`], not at construction.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0))
    }
}

/// Short identifier of a signing public key: the first 16 bytes of its
/// SHA-256 digest, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyFingerprint(String);

impl KeyFingerprint {
    fn of_public_key(public_key: &[u8]) -> Self {
        let d = digest::digest(public_key);
        Self(hex::encode(&d.as_bytes()[..FINGERPRINT_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyFingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds the signing keypair.
pub struct SignatureEngine {
    key_pair: Ed25519KeyPair,
    fingerprint: KeyFingerprint,
}

impl SignatureEngine {
    /// Generate a fresh keypair.
    ///
    /// Returns the engine and the PKCS#8 document so the operator can persist
    /// it. The document is zeroised when dropped.
    pub fn generate() -> Result<(Self, Zeroizing<Vec<u8>>), DocsealError> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
            .map_err(|_| DocsealError::SigningFailure)?;
        let pkcs8 = Zeroizing::new(pkcs8.as_ref().to_vec());
        let engine = Self::from_pkcs8(&pkcs8)?;
        Ok((engine, pkcs8))
    }

    /// Load a keypair from a PKCS#8 v2 document.
    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Self, DocsealError> {
        let key_pair =
            Ed25519KeyPair::from_pkcs8(pkcs8).map_err(|_| DocsealError::InvalidKey)?;
        let fingerprint = KeyFingerprint::of_public_key(key_pair.public_key().as_ref());
        Ok(Self {
            key_pair,
            fingerprint,
        })
    }

    /// Sign `bytes`, returning the detached signature and this engine's
    /// key fingerprint.
    pub fn sign(&self, bytes: &[u8]) -> (Signature, KeyFingerprint) {
        let sig = self.key_pair.sign(bytes);
        (Signature(sig.as_ref().to_vec()), self.fingerprint.clone())
    }

    /// Check `signature` over `bytes` against the held public key.
    ///
    /// Never panics or errors on malformed input: wrong length, garbage or
    /// empty signatures all yield `false`.
    pub fn verify(&self, bytes: &[u8], signature: &Signature) -> bool {
        let public = UnparsedPublicKey::new(&signature::ED25519, self.public_key());
        public.verify(bytes, signature.as_bytes()).is_ok()
    }

    pub fn public_key(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    pub fn fingerprint(&self) -> &KeyFingerprint {
        &self.fingerprint
    }
}

impl fmt::Debug for SignatureEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureEngine")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let (engine, _) = SignatureEngine::generate().unwrap();
        let (sig, fp) = engine.sign(b"contract.pdf bytes");
        assert_eq!(sig.as_bytes().len(), 64);
        assert_eq!(fp.as_str().len(), FINGERPRINT_LEN * 2);
        assert!(engine.verify(b"contract.pdf bytes", &sig));
        assert!(!engine.verify(b"contract.pdf bytez", &sig));
    }

    #[test]
    fn malformed_signatures_return_false() {
        let (engine, _) = SignatureEngine::generate().unwrap();
        assert!(!engine.verify(b"x", &Signature::from_bytes(Vec::new())));
        assert!(!engine.verify(b"x", &Signature::from_bytes(vec![0xff; 3])));
        assert!(!engine.verify(b"x", &Signature::from_bytes(vec![0u8; 64])));
    }

    #[test]
    fn other_keypair_does_not_verify() {
        let (a, _) = SignatureEngine::generate().unwrap();
        let (b, _) = SignatureEngine::generate().unwrap();
        let (sig, _) = b.sign(b"payload");
        assert!(!a.verify(b"payload", &sig));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn pkcs8_reload_keeps_identity() {
        let (engine, pkcs8) = SignatureEngine::generate().unwrap();
        let reloaded = SignatureEngine::from_pkcs8(&pkcs8).unwrap();
        assert_eq!(engine.fingerprint(), reloaded.fingerprint());
        let (sig, _) = engine.sign(b"payload");
        assert!(reloaded.verify(b"payload", &sig));
    }

    #[test]
    fn garbage_pkcs8_is_rejected() {
        assert!(matches!(
            SignatureEngine::from_pkcs8(b"not a key"),
            Err(DocsealError::InvalidKey)
        ));
    }
}
