//! The caller-facing façade.
//!
//! Wires the stateless [`DocumentPipeline`] to a [`RecordStore`] and an
//! [`AuditLog`]. Every operation attempt, successful or not, produces exactly
//! one audit event.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::audit::{AuditAction, AuditEvent, AuditLog, AuditOutcome, AuditSink, FileAuditSink};
use crate::config::VaultConfig;
use crate::document::DocumentMetadata;
use crate::error::{DocsealError, FailureKind};
use crate::keys::{KeyRing, MasterKey};
use crate::pipeline::{DocumentPipeline, OpenedDocument, VerificationReport};
use crate::signing::SignatureEngine;
use crate::store::{DocumentId, InMemoryRecordStore, RecordStore};

pub struct DocumentVault {
    pipeline: DocumentPipeline,
    store: Arc<dyn RecordStore>,
    audit: Mutex<AuditLog>,
}

impl DocumentVault {
    pub fn new(pipeline: DocumentPipeline, store: Arc<dyn RecordStore>) -> Self {
        Self {
            pipeline,
            store,
            audit: Mutex::new(AuditLog::new()),
        }
    }

    /// Keep at most `retention` audit events in memory. Zero keeps none, so
    /// events only reach the attached sinks.
    pub fn with_audit_retention(self, retention: usize) -> Self {
        self.log().set_retention(retention);
        self
    }

    /// A vault over a single master key with an in-memory store.
    pub fn with_master_key(master: MasterKey, signer: SignatureEngine) -> Self {
        let pipeline = DocumentPipeline::new(Arc::new(KeyRing::single(master)), Arc::new(signer));
        Self::new(pipeline, Arc::new(InMemoryRecordStore::new()))
    }

    /// Build a vault from operator configuration.
    ///
    /// Without a signing key file the vault refuses to start unless
    /// `allow_ephemeral_signer` is set. An ephemeral keypair dies with the
    /// process, so every document sealed under it reports
    /// `authenticity: false` after a restart.
    pub fn from_config(
        config: &VaultConfig,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, DocsealError> {
        let master = MasterKey::from_secret(config.key_version, config.master_secret.as_bytes())
            .map_err(|_| DocsealError::Config("master secret must not be empty".into()))?;

        let signer = match &config.signing_key_path {
            Some(path) => {
                let pkcs8 = zeroize::Zeroizing::new(std::fs::read(path)?);
                SignatureEngine::from_pkcs8(&pkcs8)?
            }
            None if config.allow_ephemeral_signer => {
                tracing::warn!("no signing key configured, generating an ephemeral keypair");
                SignatureEngine::generate()?.0
            }
            None => {
                return Err(DocsealError::Config(
                    "no signing key configured and ephemeral signer not allowed".into(),
                ))
            }
        };

        let pipeline = DocumentPipeline::new(Arc::new(KeyRing::single(master)), Arc::new(signer));
        let vault = Self::new(pipeline, store).with_audit_retention(config.audit_retention);
        if let Some(path) = &config.audit_log_path {
            vault.add_audit_sink(Box::new(FileAuditSink::new(path)?));
        }
        info!(
            key_version = config.key_version,
            fingerprint = %vault.pipeline.signer().fingerprint(),
            "document vault ready"
        );
        Ok(vault)
    }

    pub fn pipeline(&self) -> &DocumentPipeline {
        &self.pipeline
    }

    pub fn add_audit_sink(&self, sink: Box<dyn AuditSink>) {
        self.log().add_forward_sink(Arc::from(sink));
    }

    /// Snapshot of the audit events still retained in memory.
    pub fn audit_log(&self) -> Vec<AuditEvent> {
        self.log().snapshot()
    }

    fn log(&self) -> MutexGuard<'_, AuditLog> {
        self.audit.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(
        &self,
        actor: &str,
        action: AuditAction,
        target: Option<&DocumentId>,
        outcome: AuditOutcome,
    ) {
        let event = AuditEvent::new(actor, action, target.cloned(), outcome);
        // Forward after the log lock is released so sink I/O never
        // serializes unrelated operations.
        let sinks = self.log().record(&event);
        for sink in sinks {
            sink.append(event.clone());
        }
    }

    fn record_result<T>(
        &self,
        actor: &str,
        action: AuditAction,
        target: Option<&DocumentId>,
        result: &Result<T, DocsealError>,
    ) {
        let outcome = match result {
            Ok(_) => AuditOutcome::Success,
            Err(e) => AuditOutcome::Failure(e.kind()),
        };
        self.record(actor, action, target, outcome);
    }

    /// Seal and persist a new document owned by `actor`.
    pub fn store(
        &self,
        actor: &str,
        plaintext: &[u8],
        metadata: DocumentMetadata,
    ) -> Result<DocumentId, DocsealError> {
        let result = self
            .pipeline
            .seal_with_metadata(plaintext, metadata)
            .and_then(|sealed| self.store.insert(actor, sealed));
        self.record_result(actor, AuditAction::Seal, result.as_ref().ok(), &result);
        result
    }

    /// Fetch, decrypt and verify a document.
    ///
    /// As with `verify`, a bad signature still releases the plaintext but is
    /// audited as an authenticity failure.
    pub fn retrieve(&self, actor: &str, id: &DocumentId) -> Result<OpenedDocument, DocsealError> {
        let result = self
            .store
            .get(actor, id)
            .and_then(|sealed| self.pipeline.open(&sealed))
            .map_err(|e| e.for_document(id));
        let outcome = match &result {
            Ok(opened) if opened.verdict.is_verified() => AuditOutcome::Success,
            Ok(_) => AuditOutcome::Failure(FailureKind::AuthenticityFailure),
            Err(e) => AuditOutcome::Failure(e.kind()),
        };
        self.record(actor, AuditAction::Open, Some(id), outcome);
        result
    }

    /// Verify a document without returning its plaintext.
    ///
    /// A signature that fails to verify is still `Ok`, with
    /// `verdict.authenticity == false`; the audit event records it as an
    /// authenticity failure.
    pub fn verify(&self, actor: &str, id: &DocumentId) -> Result<VerificationReport, DocsealError> {
        let result = self
            .store
            .get(actor, id)
            .and_then(|sealed| self.pipeline.verify_only(&sealed))
            .map_err(|e| e.for_document(id));
        let outcome = match &result {
            Ok(report) if report.verdict.is_verified() => AuditOutcome::Success,
            Ok(_) => AuditOutcome::Failure(FailureKind::AuthenticityFailure),
            Err(e) => AuditOutcome::Failure(e.kind()),
        };
        self.record(actor, AuditAction::Verify, Some(id), outcome);
        result
    }

    /// Change a document's display name. Cryptographic fields are untouched.
    pub fn rename(&self, actor: &str, id: &DocumentId, name: &str) -> Result<(), DocsealError> {
        let result = self.store.rename(actor, id, name);
        self.record_result(actor, AuditAction::Rename, Some(id), &result);
        result
    }

    pub fn delete(&self, actor: &str, id: &DocumentId) -> Result<(), DocsealError> {
        let result = self.store.delete(actor, id);
        self.record_result(actor, AuditAction::Delete, Some(id), &result);
        result
    }

    pub fn list(&self, actor: &str) -> Result<Vec<DocumentId>, DocsealError> {
        self.store.list(actor)
    }
}
