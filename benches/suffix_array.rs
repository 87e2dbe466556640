//! Performance benchmarks for CXI
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cxi::codec::{Codec, Compressor};
use cxi::config::EngineConfig;
use cxi::index::SuffixIndex;
use cxi::tokens::{TokenSource, TokenStore, Tokenization};

/// Source-like text with plenty of repeated substrings
fn sample_text(functions: usize) -> Vec<u8> {
    let mut text = String::new();
    for i in 0..functions {
        text.push_str(&format!(
            "fn function_{i}() {{\n    println!(\"Hello from function {i}\");\n    let x = {i} * 2;\n}}\n\n",
            i = i
        ));
    }
    text.into_bytes()
}

fn built_index(text: &[u8], tokenization: Tokenization) -> SuffixIndex<TokenSource> {
    let store = TokenSource::from_bytes(text.to_vec(), tokenization).expect("Failed to tokenize");
    let mut index =
        SuffixIndex::anonymous(store, EngineConfig::default()).expect("Failed to allocate index");
    index.build_index(2).expect("Failed to build index");
    index
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");
    group.sample_size(10);

    for functions in [50, 500] {
        let text = sample_text(functions);
        for window in [1, 2, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("bytes_{}kb", text.len() / 1024), window),
                &window,
                |b, &window| {
                    let store = TokenSource::from_bytes(text.clone(), Tokenization::Bytes)
                        .expect("Failed to tokenize");
                    let mut index = SuffixIndex::anonymous(store, EngineConfig::default())
                        .expect("Failed to allocate index");
                    b.iter(|| index.build_index(black_box(window)))
                },
            );
        }
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let text = sample_text(500);
    let bytes = built_index(&text, Tokenization::Bytes);
    let words = built_index(&text, Tokenization::Words);

    let mut group = c.benchmark_group("find");
    for query in ["fn", "println!", "Hello from function 42", "missing"] {
        group.bench_with_input(BenchmarkId::new("bytes", query), &query, |b, &q| {
            b.iter(|| bytes.find(black_box(q.as_bytes())))
        });
        group.bench_with_input(BenchmarkId::new("words", query), &query, |b, &q| {
            b.iter(|| words.find(black_box(q.as_bytes())))
        });
    }
    group.finish();
}

fn bench_mine_and_compress(c: &mut Criterion) {
    let text = sample_text(200);
    let index = built_index(&text, Tokenization::Bytes);

    c.bench_function("find_compression_prefixes", |b| {
        b.iter(|| index.find_compression_prefixes(black_box(0), 256))
    });

    let candidates = index
        .find_compression_prefixes(0, 256)
        .expect("Failed to mine");
    let codec = Codec::from_candidates(index.store(), &candidates).expect("Failed to build codec");

    c.bench_function("encode", |b| {
        b.iter(|| Compressor::new(index.store()).encode(black_box(&codec)))
    });

    c.bench_function("word_offsets_scan", |b| {
        b.iter(|| {
            let store = TokenSource::from_bytes(text.clone(), Tokenization::Words)
                .expect("Failed to tokenize");
            black_box(store.token_count())
        })
    });
}

criterion_group!(benches, bench_build, bench_find, bench_mine_and_compress);
criterion_main!(benches);
