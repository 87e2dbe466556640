//! Dictionary codec construction and token-substitution compression
//!
//! A [`Codec`] is an ordered, duplicate-free list of byte strings; an
//! entry's id is its position. Compression greedily replaces the longest
//! codec entry matching at each token position with its id
//! ([`Compressor`]); expansion maps ids back to entries ([`expand`]).
//!
//! For compression to always make progress the codec must contain every
//! single token of the corpus. [`Codec::from_candidates`] guarantees that by
//! starting from the corpus alphabet.

pub mod compressor;
pub mod trie;

pub use compressor::{expand, expand_into, CompressedOutput, Compressor};

use crate::error::{Error, Result};
use crate::index::suffix_array::Candidate;
use crate::store::{DictionaryStore, DictionaryWriter};
use crate::tokens::TokenStore;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::path::Path;

/// Ordered, duplicate-free dictionary of byte strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    entries: Vec<Vec<u8>>,
}

impl Codec {
    /// Validate and wrap a list of entries
    pub fn new(entries: Vec<Vec<u8>>) -> Result<Self> {
        if entries.len() > u32::MAX as usize {
            return Err(Error::invalid_codec(format!(
                "{} entries exceed the id width",
                entries.len()
            )));
        }

        let mut seen = FxHashSet::default();
        for (id, entry) in entries.iter().enumerate() {
            if entry.is_empty() {
                return Err(Error::invalid_codec(format!("entry {} is empty", id)));
            }
            if !seen.insert(entry.as_slice()) {
                return Err(Error::invalid_codec(format!(
                    "entry {} duplicates an earlier entry",
                    id
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Every distinct single token of the corpus, in byte order
    pub fn alphabet<S: TokenStore>(store: &S) -> Vec<Vec<u8>> {
        let distinct: BTreeSet<&[u8]> = (0..store.token_count()).map(|i| store.token(i)).collect();
        distinct.into_iter().map(<[u8]>::to_vec).collect()
    }

    /// The corpus alphabet followed by each mined candidate not already present
    pub fn from_candidates<S: TokenStore>(store: &S, candidates: &[Candidate]) -> Result<Self> {
        let mut entries = Self::alphabet(store);
        let mut seen: FxHashSet<Vec<u8>> = entries.iter().cloned().collect();

        for candidate in candidates {
            if !candidate.bytes.is_empty() && seen.insert(candidate.bytes.clone()) {
                entries.push(candidate.bytes.clone());
            }
        }

        Self::new(entries)
    }

    /// Rebuild a codec from a stored dictionary
    pub fn from_dictionary(dictionary: &DictionaryStore) -> Result<Self> {
        Self::new(dictionary.read_all())
    }

    /// Write every entry, in id order, to a dictionary file
    pub fn write(&self, path: &Path) -> Result<DictionaryStore> {
        let mut writer = DictionaryWriter::create(path)?;
        for entry in &self.entries {
            writer.append(entry)?;
        }
        writer.finish()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `id`, if present
    pub fn get(&self, id: u32) -> Option<&[u8]> {
        self.entries.get(id as usize).map(Vec::as_slice)
    }

    /// Entry at an index known to be valid
    #[inline]
    pub(crate) fn entry(&self, index: usize) -> &[u8] {
        &self.entries[index]
    }

    pub fn entries(&self) -> &[Vec<u8>] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{TokenSource, Tokenization};
    use tempfile::tempdir;

    fn candidate(bytes: &[u8]) -> Candidate {
        Candidate {
            bytes: bytes.to_vec(),
            tokens: bytes.len(),
            occurrences: 2,
            fitness: 1,
        }
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(matches!(
            Codec::new(vec![b"a".to_vec(), b"b".to_vec(), b"a".to_vec()]),
            Err(Error::InvalidCodec { .. })
        ));
        assert!(matches!(
            Codec::new(vec![Vec::new()]),
            Err(Error::InvalidCodec { .. })
        ));
    }

    #[test]
    fn test_alphabet_is_sorted_and_distinct() {
        let store = TokenSource::from_bytes(b"banana".to_vec(), Tokenization::Bytes).unwrap();
        assert_eq!(
            Codec::alphabet(&store),
            vec![b"a".to_vec(), b"b".to_vec(), b"n".to_vec()]
        );
    }

    #[test]
    fn test_from_candidates_keeps_alphabet_first() {
        let store = TokenSource::from_bytes(b"banana".to_vec(), Tokenization::Bytes).unwrap();
        let codec = Codec::from_candidates(&store, &[candidate(b"ana"), candidate(b"a")]).unwrap();
        assert_eq!(codec.len(), 4);
        assert_eq!(codec.get(3), Some(&b"ana"[..]));
        assert_eq!(codec.get(4), None);
    }

    #[test]
    fn test_dictionary_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codec.dict");
        let codec = Codec::new(vec![b"x".to_vec(), b"yz".to_vec()]).unwrap();

        let dictionary = codec.write(&path).unwrap();
        assert_eq!(Codec::from_dictionary(&dictionary).unwrap(), codec);
    }
}
