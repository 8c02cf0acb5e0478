use criterion::{Criterion, criterion_group, criterion_main};
use rag_qa::embeddings::chunking::{ChunkingConfig, chunk_words};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let vocabulary = [
        "vector", "index", "query", "document", "chunk", "embedding", "score", "answer",
    ];
    let text = (0..50_000)
        .map(|i| vocabulary[i % vocabulary.len()])
        .collect::<Vec<_>>()
        .join(" ");
    let config = ChunkingConfig::default();

    c.bench_function("chunk_words", |b| {
        b.iter(|| chunk_words(black_box(&text), black_box(&config)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
