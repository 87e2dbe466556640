//! Property-based tests over ordering, repeated reads, search against a
//! naive scan and compression round trips on arbitrary input.

use cxi::codec::{expand, Codec, Compressor};
use cxi::config::EngineConfig;
use cxi::index::SuffixIndex;
use cxi::tokens::{TokenSource, TokenStore, Tokenization};
use proptest::prelude::*;
use std::cmp::Ordering;

fn build(text: &[u8], tokenization: Tokenization, window: usize, small: usize) -> SuffixIndex<TokenSource> {
    let store = TokenSource::from_bytes(text.to_vec(), tokenization).unwrap();
    let config = EngineConfig {
        small_bucket_threshold: small,
        parallel: false,
        ..Default::default()
    };
    let mut index = SuffixIndex::anonymous(store, config).unwrap();
    index.build_index(window).unwrap();
    index
}

/// Positions where `query` starts when reading `text` circularly
fn naive_find(text: &[u8], query: &[u8]) -> Vec<u32> {
    (0..text.len())
        .filter(|&p| (0..query.len()).all(|k| text[(p + k) % text.len()] == query[k]))
        .map(|p| p as u32)
        .collect()
}

/// Small alphabet so repeats are common
fn text_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ab c".to_vec()), 1..120)
}

proptest! {
    #[test]
    fn prop_index_is_sorted_permutation(
        text in text_strategy(),
        window in 1usize..5,
        small in 2usize..12,
    ) {
        let index = build(&text, Tokenization::Bytes, window, small);
        let order = index.array().to_vec();

        let mut seen = order.clone();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..text.len() as u32).collect::<Vec<_>>());

        for pair in order.windows(2) {
            prop_assert_eq!(
                index.store().compare_suffixes(pair[0] as usize, pair[1] as usize, 0),
                Ordering::Less
            );
        }
    }

    #[test]
    fn prop_find_matches_naive_scan(
        text in text_strategy(),
        query in prop::collection::vec(prop::sample::select(b"ab c".to_vec()), 1..6),
    ) {
        let index = build(&text, Tokenization::Bytes, 2, 10);
        prop_assert_eq!(index.find(&query).unwrap(), naive_find(&text, &query));
    }

    #[test]
    fn prop_read_paths_are_idempotent(
        text in text_strategy(),
        query in prop::collection::vec(prop::sample::select(b"ab c".to_vec()), 0..6),
        position in 0usize..200,
        n in 0usize..40,
        skip in 0usize..300,
    ) {
        let index = build(&text, Tokenization::Bytes, 2, 10);
        let store = index.store();
        let position = position % text.len();
        let order = index.array().to_vec();

        let read = store.read_string(position, n, skip);
        let found = index.find(&query).unwrap();
        let mined = index.find_compression_prefixes(-2, 10).unwrap();

        // repeat in a different order; nothing above may have changed state
        prop_assert_eq!(index.find_compression_prefixes(-2, 10).unwrap(), mined);
        prop_assert_eq!(index.find(&query).unwrap(), found);
        prop_assert_eq!(store.read_string(position, n, skip), read);
        prop_assert_eq!(index.array().to_vec(), order);
    }

    #[test]
    fn prop_mined_codec_roundtrips(
        text in text_strategy(),
        threshold in -5i64..5,
        count in 0usize..20,
    ) {
        let index = build(&text, Tokenization::Bytes, 2, 10);
        let candidates = index.find_compression_prefixes(threshold, count).unwrap();
        prop_assert!(candidates.len() <= count);
        for candidate in &candidates {
            prop_assert!(candidate.fitness > threshold);
            prop_assert!(candidate.occurrences >= 2);
        }

        let codec = Codec::from_candidates(index.store(), &candidates).unwrap();
        let ids = Compressor::new(index.store()).encode(&codec).unwrap();

        let covered: usize = ids
            .iter()
            .map(|&id| index.store().split_tokens(codec.get(id).unwrap()).len())
            .sum();
        prop_assert_eq!(covered, index.store().token_count());

        let decoded: Vec<u8> = ids.iter().flat_map(|&id| codec.get(id).unwrap().to_vec()).collect();
        prop_assert_eq!(decoded, text);
    }

    #[test]
    fn prop_word_index_roundtrip(text in "[a-c ]{1,60}") {
        let dir = tempfile::tempdir().unwrap();
        let index = build(text.as_bytes(), Tokenization::Words, 1, 4);
        let candidates = index.find_compression_prefixes(-3, 8).unwrap();
        let codec = Codec::from_candidates(index.store(), &candidates).unwrap();

        let output = Compressor::new(index.store())
            .write_compressed(&codec, &dir.path().join("p.cmp"), &dir.path().join("p.dict"))
            .unwrap();
        prop_assert_eq!(expand(&codec, &output.compressed).unwrap(), text.as_bytes());
    }
}
