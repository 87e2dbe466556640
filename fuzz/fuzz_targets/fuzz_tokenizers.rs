#![no_main]

use cxi::tokens::{TextEncoding, TokenSource, TokenStore, Tokenization};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Every tokenization must cover the buffer exactly, in order
    let tokenizations = [
        Tokenization::Bytes,
        Tokenization::Words,
        Tokenization::Chars(TextEncoding::Utf8),
        Tokenization::Chars(TextEncoding::Utf16Le),
        Tokenization::Chars(TextEncoding::Utf16Be),
    ];

    for tokenization in tokenizations {
        let Ok(store) = TokenSource::from_bytes(data.to_vec(), tokenization) else {
            assert!(data.is_empty());
            return;
        };
        let joined = store.read_string(0, store.token_count(), 0);
        assert_eq!(joined, data);
        assert_eq!(store.split_tokens(data).len(), store.token_count());
    }
});
