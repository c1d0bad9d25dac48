//! Low-level AEAD operations.
//!
//! This module and `keys` are the only places that touch `ring::aead` and
//! `ring::rand` directly. Everything above works through the functions
//! exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **IV**: 96-bit (12 bytes), generated fresh per operation via `SystemRandom`
//! - **Key size**: 256 bits (32 bytes)

use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::DocsealError;

const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the IV in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Size of a master, wrapping or document key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Fill a fixed-size buffer from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], DocsealError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; N];
    rng.fill(&mut buf).map_err(|_| DocsealError::RandomnessFailure)?;
    Ok(buf)
}

fn aead_key(key_bytes: &[u8; KEY_LEN]) -> Result<LessSafeKey, DocsealError> {
    let unbound = UnboundKey::new(ALGORITHM, key_bytes).map_err(|_| DocsealError::InvalidKey)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key_bytes` with a freshly generated IV.
///
/// Returns `(ciphertext || tag, iv)`. The IV is never cached or derived from
/// a counter; every call draws a new one.
pub fn seal(
    key_bytes: &[u8; KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, [u8; IV_LEN]), DocsealError> {
    let key = aead_key(key_bytes)?;
    let iv: [u8; IV_LEN] = random_bytes()?;

    let mut in_out = Vec::with_capacity(plaintext.len() + TAG_LEN);
    in_out.extend_from_slice(plaintext);

    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(iv),
        Aad::from(aad),
        &mut in_out,
    )
    .map_err(|_| DocsealError::EncryptionFailure)?;

    Ok((in_out, iv))
}

/// Decrypt `ciphertext || tag` under `key_bytes` and `iv`.
///
/// A wrong key, wrong IV, wrong AAD or any modified byte fails the GCM tag
/// check. The caller receives no partial plaintext. The returned error is a
/// bare `DecryptionFailure`; callers reclassify it where the context is known
/// (e.g. key unwrapping).
pub fn open(
    key_bytes: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, DocsealError> {
    if ciphertext.len() < TAG_LEN {
        return Err(DocsealError::DecryptionFailure { document: None });
    }

    let key = aead_key(key_bytes)?;
    let mut payload = ciphertext.to_vec();

    let plaintext = key
        .open_in_place(Nonce::assume_unique_for_key(*iv), Aad::from(aad), &mut payload)
        .map_err(|_| DocsealError::DecryptionFailure { document: None })?;

    Ok(plaintext.to_vec())
}
