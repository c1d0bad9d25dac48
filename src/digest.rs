//! Content hashing.
//!
//! SHA-256 over the plaintext, computed once at seal time and once again
//! after decryption. The two values are compared in constant time.

use std::fmt;

use ring::digest::{self, SHA256};
use serde::{Deserialize, Serialize};

/// Size of a content digest in bytes (256 bits).
pub const DIGEST_LEN: usize = 32;

/// A fixed-length SHA-256 digest of a document's original plaintext.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest([u8; DIGEST_LEN]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex encoding, used in logs and error context.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Compare two digests without short-circuiting on the first
    /// differing byte.
    #[allow(deprecated)]
    pub fn matches(&self, other: &ContentDigest) -> bool {
        ring::constant_time::verify_slices_are_equal(&self.0, &other.0).is_ok()
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash a byte sequence with SHA-256.
pub fn digest(bytes: &[u8]) -> ContentDigest {
    let out = digest::digest(&SHA256, bytes);
    let mut buf = [0u8; DIGEST_LEN];
    buf.copy_from_slice(out.as_ref());
    ContentDigest(buf)
}
