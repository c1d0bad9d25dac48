use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docseal::{generate_master_key, DocumentPipeline, KeyRing, SignatureEngine};

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    let (signer, _) = SignatureEngine::generate().unwrap();
    let pipeline = DocumentPipeline::new(
        Arc::new(KeyRing::single(generate_master_key().unwrap())),
        Arc::new(signer),
    );

    let sizes = [("1KB", 1024), ("64KB", 64 * 1024), ("1MB", 1024 * 1024)];

    for (name, size) in sizes {
        let payload = vec![0x5au8; size];
        let sealed = pipeline.seal(&payload).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("seal", name), &payload, |b, payload| {
            b.iter(|| pipeline.seal(black_box(payload)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("open", name), &sealed, |b, sealed| {
            b.iter(|| pipeline.open(black_box(sealed)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_pipeline);
criterion_main!(benches);
