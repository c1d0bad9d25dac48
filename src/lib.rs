//! # docseal
//!
//! Confidential, tamper-evident document storage.
//!
//! A document is hashed, signed, and encrypted under a fresh per-document
//! key, which is in turn wrapped under a long-lived master key. Opening a
//! document reverses the envelope, recomputes the digest, and verifies the
//! signature before any plaintext is released.
//!
//! ## Public API
//!
//! - [`DocumentPipeline`]: stateless `seal` / `open` / `verify_only`.
//! - [`DocumentVault`]: the pipeline wired to a [`store::RecordStore`] and an
//!   audit log, with `store` / `retrieve` / `verify` / `rename` / `delete`.
//! - [`MasterKey`], [`KeyRing`], [`SignatureEngine`]: key material, injected
//!   once at process start.

pub(crate) mod crypto;
pub mod audit;
pub mod config;
pub mod digest;
pub mod document;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod pipeline;
pub mod signing;
pub mod store;
pub mod vault;

pub use config::VaultConfig;
pub use document::{DocumentMetadata, SealedDocument, SealedParts};
pub use error::{DocsealError, FailureKind, Result};
pub use keys::{KeyRing, MasterKey};
pub use pipeline::{DocumentPipeline, OpenedDocument, VerificationReport, VerificationVerdict};
pub use signing::SignatureEngine;
pub use store::DocumentId;
pub use vault::DocumentVault;

/// Size of the document IV in bytes.
pub const IV_LEN: usize = crypto::IV_LEN;

/// Generate a random version-1 master key.
///
/// In production, derive it from an operator secret with
/// [`MasterKey::from_secret`] or source the bytes from a KMS.
pub fn generate_master_key() -> Result<MasterKey> {
    MasterKey::generate(1)
}
