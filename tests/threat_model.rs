use std::sync::Arc;

use docseal::envelope::WrappedKey;
use docseal::{
    DocsealError, DocumentPipeline, KeyRing, MasterKey, SealedDocument, SignatureEngine,
};

fn pipeline_with(master: MasterKey, signer: SignatureEngine) -> DocumentPipeline {
    DocumentPipeline::new(Arc::new(KeyRing::single(master)), Arc::new(signer))
}

fn pipeline() -> DocumentPipeline {
    let (signer, _) = SignatureEngine::generate().unwrap();
    pipeline_with(MasterKey::generate(1).unwrap(), signer)
}

#[test]
fn test_every_ciphertext_bit_flip_is_detected() {
    // Threat: storage corruption or tampering with the encrypted body.
    // Goal: no single-bit change ever yields a successful open.
    let p = pipeline();
    let sealed = p.seal(b"hello world").unwrap();
    let original = sealed.clone().into_parts();

    for byte in 0..original.ciphertext.len() {
        for bit in 0..8 {
            let mut parts = original.clone();
            parts.ciphertext[byte] ^= 1 << bit;
            let tampered = SealedDocument::from_parts(parts);

            match p.open(&tampered) {
                Err(DocsealError::DecryptionFailure { .. })
                | Err(DocsealError::IntegrityViolation { .. }) => {}
                other => panic!("bit {} of byte {} not detected: {:?}", bit, byte, other),
            }
        }
    }
}

#[test]
fn test_resigned_record_fails_authenticity_only() {
    // Threat: identity forgery. Ciphertext and digest are untouched, the
    // signature comes from a different keypair.
    let p = pipeline();
    let (forger, _) = SignatureEngine::generate().unwrap();

    let sealed = p.seal(b"signed by the service").unwrap();
    let mut parts = sealed.into_parts();
    let (sig, fp) = forger.sign(b"signed by the service");
    parts.signature = sig;
    parts.key_fingerprint = fp;
    let resigned = SealedDocument::from_parts(parts);

    let opened = p.open(&resigned).unwrap();
    assert!(opened.verdict.integrity);
    assert!(!opened.verdict.authenticity);
    assert_eq!(opened.plaintext, b"signed by the service");

    // Strict callers get a typed error instead of the bytes.
    assert!(matches!(
        opened.into_authentic(),
        Err(DocsealError::AuthenticityFailure { .. })
    ));
}

#[test]
fn test_malformed_signature_does_not_crash_open() {
    let p = pipeline();
    let mut parts = p.seal(b"payload").unwrap().into_parts();
    parts.signature = docseal::signing::Signature::from_bytes(vec![0xde, 0xad]);

    let opened = p.open(&SealedDocument::from_parts(parts)).unwrap();
    assert!(opened.verdict.integrity);
    assert!(!opened.verdict.authenticity);
}

#[test]
fn test_wrong_master_key_fails_unwrap() {
    let (signer, pkcs8) = SignatureEngine::generate().unwrap();
    let sealer = pipeline_with(MasterKey::from_secret(1, b"production").unwrap(), signer);
    let opener = pipeline_with(
        MasterKey::from_secret(1, b"not production").unwrap(),
        SignatureEngine::from_pkcs8(&pkcs8).unwrap(),
    );

    let sealed = sealer.seal(b"confidential").unwrap();
    assert!(matches!(
        opener.open(&sealed),
        Err(DocsealError::KeyUnwrapFailure { version: 1, .. })
    ));
    assert!(opener.verify_only(&sealed).is_err());
}

#[test]
fn test_master_key_of_unknown_version_fails_unwrap() {
    let (signer, pkcs8) = SignatureEngine::generate().unwrap();
    let sealer = pipeline_with(MasterKey::generate(2).unwrap(), signer);
    let opener = pipeline_with(
        MasterKey::generate(1).unwrap(),
        SignatureEngine::from_pkcs8(&pkcs8).unwrap(),
    );

    let sealed = sealer.seal(b"confidential").unwrap();
    assert!(matches!(
        opener.open(&sealed),
        Err(DocsealError::KeyUnwrapFailure { version: 2, .. })
    ));
}

#[test]
fn test_tampered_wrapped_key_fails_unwrap() {
    let p = pipeline();
    let mut parts = p.seal(b"payload").unwrap().into_parts();
    let WrappedKey { ciphertext, .. } = &mut parts.wrapped_key;
    ciphertext[0] ^= 0x01;

    assert!(matches!(
        p.open(&SealedDocument::from_parts(parts)),
        Err(DocsealError::KeyUnwrapFailure { .. })
    ));
}

#[test]
fn test_swapped_iv_fails_decryption() {
    let p = pipeline();
    let a = p.seal(b"document a").unwrap().into_parts();
    let mut b = p.seal(b"document b").unwrap().into_parts();
    b.iv = a.iv;

    assert!(matches!(
        p.open(&SealedDocument::from_parts(b)),
        Err(DocsealError::DecryptionFailure { .. })
    ));
}

#[test]
fn test_two_seals_share_no_key_material() {
    let p = pipeline();
    let a = p.seal(b"identical plaintext").unwrap();
    let b = p.seal(b"identical plaintext").unwrap();

    assert_ne!(a.iv(), b.iv());
    assert_ne!(a.wrapped_key(), b.wrapped_key());
    assert_ne!(a.ciphertext(), b.ciphertext());
    assert_eq!(a.content_digest(), b.content_digest());

    // Each record's key opens only its own ciphertext.
    let mut crossed = b.clone().into_parts();
    crossed.wrapped_key = a.wrapped_key().clone();
    assert!(p.open(&SealedDocument::from_parts(crossed)).is_err());
}

#[test]
fn test_older_key_version_still_opens_after_activation() {
    let (signer, _) = SignatureEngine::generate().unwrap();
    let signer = Arc::new(signer);

    let mut ring = KeyRing::single(MasterKey::from_secret(1, b"first").unwrap());
    let v1 = DocumentPipeline::new(
        Arc::new(KeyRing::single(MasterKey::from_secret(1, b"first").unwrap())),
        Arc::clone(&signer),
    );
    let old = v1.seal(b"sealed under v1").unwrap();

    ring.insert(MasterKey::from_secret(2, b"second").unwrap()).unwrap();
    ring.set_active(2).unwrap();
    let v2 = DocumentPipeline::new(Arc::new(ring), signer);

    let new = v2.seal(b"sealed under v2").unwrap();
    assert_eq!(new.wrapped_key().version, 2);
    assert_eq!(v2.open(&old).unwrap().plaintext, b"sealed under v1");
    assert_eq!(v2.open(&new).unwrap().plaintext, b"sealed under v2");
}
