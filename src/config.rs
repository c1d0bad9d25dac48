//! Operator configuration.
//!
//! Loaded once at process start, either from a JSON file or from
//! `DOCSEAL_*` environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::audit::DEFAULT_RETENTION;
use crate::error::DocsealError;
use crate::keys::KeyVersion;

pub const ENV_MASTER_SECRET: &str = "DOCSEAL_MASTER_SECRET";
pub const ENV_KEY_VERSION: &str = "DOCSEAL_KEY_VERSION";
pub const ENV_SIGNING_KEY: &str = "DOCSEAL_SIGNING_KEY";
pub const ENV_AUDIT_LOG: &str = "DOCSEAL_AUDIT_LOG";
pub const ENV_AUDIT_RETENTION: &str = "DOCSEAL_AUDIT_RETENTION";
pub const ENV_ALLOW_EPHEMERAL_SIGNER: &str = "DOCSEAL_ALLOW_EPHEMERAL_SIGNER";

#[derive(Clone, Deserialize)]
pub struct VaultConfig {
    /// Secret the master key is hashed from. Wiped on drop.
    pub master_secret: Zeroizing<String>,
    /// Version recorded on every key wrapped under this master key.
    #[serde(default = "default_key_version")]
    pub key_version: KeyVersion,
    /// PKCS#8 Ed25519 signing key.
    #[serde(default)]
    pub signing_key_path: Option<PathBuf>,
    /// JSON-lines audit file.
    #[serde(default)]
    pub audit_log_path: Option<PathBuf>,
    /// Audit events kept in memory by the vault.
    #[serde(default = "default_audit_retention")]
    pub audit_retention: usize,
    /// Start with a throwaway signing key when `signing_key_path` is unset.
    #[serde(default)]
    pub allow_ephemeral_signer: bool,
}

fn default_audit_retention() -> usize {
    DEFAULT_RETENTION
}

fn default_key_version() -> KeyVersion {
    1
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("master_secret", &"<redacted>")
            .field("key_version", &self.key_version)
            .field("signing_key_path", &self.signing_key_path)
            .field("audit_log_path", &self.audit_log_path)
            .field("audit_retention", &self.audit_retention)
            .field("allow_ephemeral_signer", &self.allow_ephemeral_signer)
            .finish()
    }
}

impl VaultConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DocsealError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, DocsealError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value lookup. `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DocsealError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let master_secret = lookup(ENV_MASTER_SECRET)
            .map(Zeroizing::new)
            .ok_or_else(|| DocsealError::Config(format!("{} is not set", ENV_MASTER_SECRET)))?;
        let key_version = match lookup(ENV_KEY_VERSION) {
            Some(v) => v.trim().parse().map_err(|_| {
                DocsealError::Config(format!("{} must be an unsigned integer", ENV_KEY_VERSION))
            })?,
            None => default_key_version(),
        };
        let audit_retention = match lookup(ENV_AUDIT_RETENTION) {
            Some(v) => v.trim().parse().map_err(|_| {
                DocsealError::Config(format!("{} must be an unsigned integer", ENV_AUDIT_RETENTION))
            })?,
            None => default_audit_retention(),
        };
        let allow_ephemeral_signer = match lookup(ENV_ALLOW_EPHEMERAL_SIGNER).as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(_) => {
                return Err(DocsealError::Config(format!(
                    "{} must be true or false",
                    ENV_ALLOW_EPHEMERAL_SIGNER
                )))
            }
        };

        let config = Self {
            master_secret,
            key_version,
            signing_key_path: lookup(ENV_SIGNING_KEY).map(PathBuf::from),
            audit_log_path: lookup(ENV_AUDIT_LOG).map(PathBuf::from),
            audit_retention,
            allow_ephemeral_signer,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DocsealError> {
        if self.master_secret.is_empty() {
            return Err(DocsealError::Config("master secret must not be empty".into()));
        }
        Ok(())
    }
}
