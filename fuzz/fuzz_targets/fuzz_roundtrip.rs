#![no_main]

use cxi::codec::{Codec, Compressor};
use cxi::config::EngineConfig;
use cxi::index::SuffixIndex;
use cxi::tokens::{TokenSource, TokenStore, Tokenization};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Index, mine, compress and decode arbitrary input
    if data.is_empty() || data.len() > 4096 {
        return;
    }
    let store = TokenSource::from_bytes(data.to_vec(), Tokenization::Bytes).unwrap();
    let mut index = SuffixIndex::anonymous(store, EngineConfig::default()).unwrap();
    index.build_index(2).unwrap();

    let candidates = index.find_compression_prefixes(0, 64).unwrap();
    let codec = Codec::from_candidates(index.store(), &candidates).unwrap();
    let ids = Compressor::new(index.store()).encode(&codec).unwrap();

    let mut decoded = Vec::with_capacity(data.len());
    for id in ids {
        decoded.extend_from_slice(codec.get(id).unwrap());
    }
    assert_eq!(decoded, data);
    assert_eq!(index.store().token_count(), data.len());
});
