use std::sync::Arc;
use std::thread;

use docseal::{DocumentMetadata, DocumentPipeline, DocumentVault, KeyRing, MasterKey, SignatureEngine};

#[test]
fn test_parallel_seal_and_open_share_one_pipeline() {
    let (signer, _) = SignatureEngine::generate().unwrap();
    let pipeline = DocumentPipeline::new(
        Arc::new(KeyRing::single(MasterKey::generate(1).unwrap())),
        Arc::new(signer),
    );
    let shared = pipeline.seal(b"opened by everyone").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let p = pipeline.clone();
            let shared = shared.clone();
            thread::spawn(move || {
                let body = format!("thread {} document", i).into_bytes();
                let sealed = p.seal(&body).unwrap();
                assert_eq!(p.open(&sealed).unwrap().plaintext, body);
                assert_eq!(p.open(&shared).unwrap().plaintext, b"opened by everyone");
                *sealed.iv()
            })
        })
        .collect();

    let ivs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let mut unique = ivs.clone();
    unique.sort_by_key(|iv| *iv.as_bytes());
    unique.dedup();
    assert_eq!(unique.len(), ivs.len());
}

#[test]
fn test_vault_is_shareable_across_threads() {
    let (signer, _) = SignatureEngine::generate().unwrap();
    let vault = Arc::new(DocumentVault::with_master_key(
        MasterKey::generate(1).unwrap(),
        signer,
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let vault = Arc::clone(&vault);
            thread::spawn(move || {
                let actor = format!("user-{}", i);
                let id = vault
                    .store(&actor, b"per-user file", DocumentMetadata::default())
                    .unwrap();
                vault.retrieve(&actor, &id).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(vault.audit_log().len(), 8);
}
