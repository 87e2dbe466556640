//! Circular suffix array over a token store
//!
//! The index array is a permutation of `0..token_count` ordered by the
//! circular suffix starting at each position. Because suffixes wrap around
//! they are infinite; comparisons stop after `token_count` equal tokens and
//! fall back to position order, which keeps periodic texts well defined.
//!
//! ## Architecture
//!
//! - `builder`: most-significant-token-first bucket sort (`build_index`)
//! - `reader`: opening, persisting and searching (`find`)
//! - `mining`: LCP-interval walk producing dictionary candidates
//! - `types`: candidate and bucket types
//!
//! ## File Format
//!
//! Next to the source, two files are created:
//! - `<source>.sa`: `token_count` little-endian `u32` positions
//! - `<source>.sa.json`: [`IndexMeta`] sidecar

pub mod builder;
pub mod mining;
pub mod reader;
pub mod types;

pub use types::{BucketCounts, Candidate};

use crate::config::EngineConfig;
use crate::index::types::IndexMeta;
use crate::store::ArrayStore;
use crate::tokens::TokenStore;
use std::path::PathBuf;

/// Suffix array together with the token store it orders
///
/// Built once with [`build_index`](SuffixIndex::build_index), then queried
/// through `&self`.
pub struct SuffixIndex<S: TokenStore> {
    store: S,
    array: ArrayStore,
    meta: IndexMeta,
    /// Sidecar location for file-backed indexes
    meta_path: Option<PathBuf>,
    config: EngineConfig,
}

impl<S: TokenStore> SuffixIndex<S> {
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn array(&self) -> &ArrayStore {
        &self.array
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        self.meta.built
    }

    /// Number of suffixes (equals the token count)
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Give back the token store
    pub fn into_store(self) -> S {
        self.store
    }
}
