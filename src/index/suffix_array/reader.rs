//! Opening, persisting and searching a suffix index
//!
//! Search is two binary searches over the sorted array, O(m log n) token
//! comparisons for an m-token query.

use super::SuffixIndex;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::index::types::{meta_path, IndexMeta, INDEX_VERSION};
use crate::store::ArrayStore;
use crate::tokens::{TokenStore, Tokenization};
use std::cmp::Ordering;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

impl<S: TokenStore> SuffixIndex<S> {
    /// Unbuilt index held in anonymous memory.
    ///
    /// Its metadata is never written, so the recorded tokenization is the
    /// default.
    pub fn anonymous(store: S, config: EngineConfig) -> Result<Self> {
        let array = ArrayStore::anonymous(store.token_count())?;
        let meta = IndexMeta::new(
            store.token_count(),
            store.file_length(),
            Tokenization::default(),
        );
        Ok(Self {
            store,
            array,
            meta,
            meta_path: None,
            config,
        })
    }

    /// Unbuilt index backed by `path`, with its metadata at `<path>.json`
    pub fn create(store: S, path: &Path, meta: IndexMeta, config: EngineConfig) -> Result<Self> {
        let array = ArrayStore::create(path, store.token_count())?;
        let index = Self {
            store,
            array,
            meta,
            meta_path: Some(meta_path(path)),
            config,
        };
        index.save_meta()?;
        Ok(index)
    }

    /// Reopen an index written by [`create`](Self::create) and built.
    ///
    /// The stored token count, file length and array size must all match
    /// `store`.
    pub fn open(store: S, path: &Path, config: EngineConfig) -> Result<Self> {
        let sidecar = meta_path(path);
        let meta = IndexMeta::load(&sidecar)?;

        if meta.version != INDEX_VERSION {
            return Err(Error::corrupt_index(format!(
                "unsupported index version {}",
                meta.version
            )));
        }
        if meta.token_count != store.token_count() as u64 || meta.file_length != store.file_length()
        {
            return Err(Error::corrupt_index(format!(
                "index covers {} tokens / {} bytes, source has {} / {}",
                meta.token_count,
                meta.file_length,
                store.token_count(),
                store.file_length()
            )));
        }
        if !meta.built {
            return Err(Error::IndexNotBuilt);
        }

        let array = ArrayStore::open(path)?;
        if array.len() != store.token_count() {
            return Err(Error::corrupt_index(format!(
                "index array holds {} entries, expected {}",
                array.len(),
                store.token_count()
            )));
        }

        debug!(path = %path.display(), tokens = array.len(), "opened suffix index");
        Ok(Self {
            store,
            array,
            meta,
            meta_path: Some(sidecar),
            config,
        })
    }

    pub(super) fn save_meta(&self) -> Result<()> {
        match &self.meta_path {
            Some(path) => self.meta.save(path),
            None => Ok(()),
        }
    }

    pub(super) fn ensure_built(&self) -> Result<()> {
        if self.meta.built {
            Ok(())
        } else {
            Err(Error::IndexNotBuilt)
        }
    }

    /// Token position stored at `rank`
    pub fn position(&self, rank: usize) -> Result<u32> {
        self.ensure_built()?;
        self.array.get(rank)
    }

    /// First `n` tokens of the suffix at `rank`, concatenated
    pub fn suffix(&self, rank: usize, n: usize) -> Result<Vec<u8>> {
        let position = self.position(rank)?;
        Ok(self.store.read_string(position as usize, n, 0))
    }

    /// Ranks whose suffixes start with `query`
    pub fn rank_range(&self, query: &[u8]) -> Result<Range<usize>> {
        self.ensure_built()?;
        let tokens = self.store.split_tokens(query);
        if tokens.is_empty() {
            return Ok(0..0);
        }

        let lo = self.lower_bound(&tokens);
        let hi = self.upper_bound(&tokens, lo);
        Ok(lo..hi)
    }

    /// Every token position where `query` occurs, ascending
    pub fn find(&self, query: &[u8]) -> Result<Vec<u32>> {
        let range = self.rank_range(query)?;
        let mut positions: Vec<u32> = range.map(|rank| self.array.at(rank)).collect();
        positions.sort_unstable();
        Ok(positions)
    }

    /// Number of occurrences of `query`
    pub fn count(&self, query: &[u8]) -> Result<usize> {
        Ok(self.rank_range(query)?.len())
    }

    pub fn contains(&self, query: &[u8]) -> Result<bool> {
        Ok(!self.rank_range(query)?.is_empty())
    }

    /// First rank whose suffix is not below the query
    fn lower_bound(&self, query: &[&[u8]]) -> usize {
        let mut lo = 0;
        let mut hi = self.array.len();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let position = self.array.at(mid) as usize;
            if self.store.compare_prefix(position, query) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        lo
    }

    /// First rank at or after `start` whose suffix does not start with the query
    fn upper_bound(&self, query: &[&[u8]], start: usize) -> usize {
        let mut lo = start;
        let mut hi = self.array.len();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let position = self.array.at(mid) as usize;
            if self.store.compare_prefix(position, query) == Ordering::Equal {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        lo
    }
}
