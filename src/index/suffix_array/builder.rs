//! Suffix array builder
//!
//! Sorts the index array most-significant-token first:
//! 1. Bucket every position by the `window` tokens at the current depth
//! 2. Scatter positions stably into their bucket's slots
//! 3. Refine each multi-member bucket one window deeper
//!
//! Small buckets, and buckets a deeper window fails to split, are finished
//! with a direct circular comparison that skips the tokens already known to
//! be shared.

use super::types::BucketCounts;
use super::SuffixIndex;
use crate::error::{Error, Result};
use crate::store::Slots;
use crate::tokens::TokenStore;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

impl<S: TokenStore> SuffixIndex<S> {
    /// Sort the index array with a bucket window of `n` tokens.
    ///
    /// Always starts from the identity permutation, so calling it again
    /// rebuilds from scratch.
    ///
    /// Exactly periodic input never subdivides past its period, so every
    /// residue class ends in the direct sort and each comparison walks the
    /// whole corpus: O(N² log N) for N tokens in that case.
    pub fn build_index(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(Error::InvalidWindow);
        }
        let start = Instant::now();

        self.array.fill_identity();
        let len = self.array.len();
        let parallel = self.config.parallel && len >= self.config.parallel_threshold;

        let sorter = BucketSorter::new(&self.store, n, self.config.small_bucket_threshold);
        let slots = self.array.slots();
        if parallel {
            sorter.populate_parallel(slots)?;
        } else {
            sorter.populate_index(slots, 0, 0)?;
        }

        self.array.flush()?;
        self.meta.mark_built(n);
        self.save_meta()?;

        info!(
            tokens = len,
            window = n,
            parallel,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built suffix index"
        );
        Ok(())
    }
}

/// Bucket sort over disjoint ranges of the index array
pub(crate) struct BucketSorter<'s, S: TokenStore> {
    store: &'s S,
    window: usize,
    small_bucket_threshold: usize,
}

impl<'s, S: TokenStore> BucketSorter<'s, S> {
    pub(crate) fn new(store: &'s S, window: usize, small_bucket_threshold: usize) -> Self {
        Self {
            store,
            window,
            small_bucket_threshold,
        }
    }

    /// Bucket the positions in `slots` by their window `skip` tokens ahead,
    /// scattering them stably into bucket order.
    ///
    /// `from` is the offset of `slots` within the whole array, used only for
    /// error reporting. Returns the bucket sizes in key order.
    pub(crate) fn populate_by_scan(
        &self,
        slots: &mut Slots<'_>,
        from: usize,
        skip: usize,
    ) -> Result<BucketCounts<'s>> {
        let len = slots.len();
        let positions = slots.to_vec();
        let keys: Vec<Vec<&'s [u8]>> = positions
            .iter()
            .map(|&p| self.store.window(p as usize, self.window, skip))
            .collect();

        // Sizes first, then rewritten in place as each bucket's next free slot
        let mut next: BTreeMap<&[&'s [u8]], usize> = BTreeMap::new();
        for key in &keys {
            *next.entry(key.as_slice()).or_insert(0) += 1;
        }

        let mut counts = BucketCounts::new();
        let mut total = 0;
        for (key, slot) in next.iter_mut() {
            let size = *slot;
            counts.insert(key.to_vec(), size);
            *slot = total;
            total += size;
        }

        let mut placed = 0;
        for (key, &position) in keys.iter().zip(&positions) {
            if let Some(slot) = next.get_mut(key.as_slice()) {
                if *slot < len {
                    slots.set(*slot, position);
                    *slot += 1;
                    placed += 1;
                }
            }
        }

        if placed != len {
            return Err(Error::ConflictingBucket {
                from,
                to: from + len,
                placed,
            });
        }
        Ok(counts)
    }

    /// Fully sort `slots`, whose members already share `skip` leading tokens
    pub(crate) fn populate_index(&self, mut slots: Slots<'_>, base: usize, skip: usize) -> Result<()> {
        let mut stack = vec![(0, slots.len(), skip)];

        while let Some((from, to, skip)) = stack.pop() {
            let size = to - from;
            if size < 2 {
                continue;
            }

            let mut bucket = slots.range(from, to);
            if size < self.small_bucket_threshold {
                self.sort_direct(&mut bucket, skip);
                continue;
            }

            let counts = self.populate_by_scan(&mut bucket, base + from, skip)?;
            let deeper = skip + self.window;
            if counts.len() == 1 {
                self.sort_direct(&mut bucket, deeper);
                continue;
            }

            let mut start = from;
            for &count in counts.values() {
                stack.push((start, start + count, deeper));
                start += count;
            }
        }

        Ok(())
    }

    /// Split the first level into disjoint slices and refine them on rayon
    fn populate_parallel(&self, mut slots: Slots<'_>) -> Result<()> {
        let counts = self.populate_by_scan(&mut slots, 0, 0)?;
        if counts.len() == 1 {
            self.sort_direct(&mut slots, self.window);
            return Ok(());
        }
        debug!(buckets = counts.len(), "refining top-level buckets in parallel");

        let mut buckets = Vec::with_capacity(counts.len());
        let mut rest = slots;
        let mut base = 0;
        for &count in counts.values() {
            let (bucket, tail) = rest.split_at(count);
            buckets.push((bucket, base));
            rest = tail;
            base += count;
        }

        buckets
            .into_par_iter()
            .try_for_each(|(bucket, base)| self.populate_index(bucket, base, self.window))
    }

    /// Sort by full circular comparison, skipping `shared` known-equal tokens
    fn sort_direct(&self, slots: &mut Slots<'_>, shared: usize) {
        let mut positions = slots.to_vec();
        positions.sort_unstable_by(|&a, &b| {
            self.store.compare_suffixes(a as usize, b as usize, shared)
        });
        slots.write_from(&positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::tokens::{TokenSource, Tokenization};

    fn index(text: &[u8], config: EngineConfig) -> SuffixIndex<TokenSource> {
        let store = TokenSource::from_bytes(text.to_vec(), Tokenization::Bytes).unwrap();
        SuffixIndex::anonymous(store, config).unwrap()
    }

    fn recursive() -> EngineConfig {
        EngineConfig {
            small_bucket_threshold: 2,
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_circular_banana() {
        let mut idx = index(b"banana", EngineConfig::default());
        idx.build_index(1).unwrap();
        // abanan, anaban, ananab, banana, nabana, nanaba
        assert_eq!(idx.array().to_vec(), vec![5, 3, 1, 0, 4, 2]);
    }

    #[test]
    fn test_recursive_buckets_match_direct_sort() {
        let text = b"mississippi river is wide";
        let mut direct = index(text, EngineConfig::default());
        direct.build_index(2).unwrap();

        for window in 1..4 {
            let mut bucketed = index(text, recursive());
            bucketed.build_index(window).unwrap();
            assert_eq!(bucketed.array().to_vec(), direct.array().to_vec());
        }
    }

    #[test]
    fn test_periodic_text_ties_by_position() {
        let mut idx = index(b"abab", recursive());
        idx.build_index(1).unwrap();
        assert_eq!(idx.array().to_vec(), vec![0, 2, 1, 3]);

        let mut same = index(&[b'x'; 40], recursive());
        same.build_index(3).unwrap();
        assert_eq!(same.array().to_vec(), (0..40).collect::<Vec<u32>>());
    }

    #[test]
    fn test_long_periodic_text() {
        let text: Vec<u8> = b"abc".iter().copied().cycle().take(600).collect();
        let mut idx = index(&text, recursive());
        idx.build_index(2).unwrap();

        let expected: Vec<u32> = (0..3)
            .flat_map(|residue| (residue..600).step_by(3))
            .collect();
        assert_eq!(idx.array().to_vec(), expected);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let text: Vec<u8> = (0..3000).map(|i| b"abcab d"[(i * 7 + i / 13) % 7]).collect();

        let mut sequential = index(&text, recursive());
        sequential.build_index(2).unwrap();

        let mut parallel = index(
            &text,
            EngineConfig {
                small_bucket_threshold: 4,
                parallel: true,
                parallel_threshold: 0,
                ..Default::default()
            },
        );
        parallel.build_index(2).unwrap();

        assert_eq!(parallel.array().to_vec(), sequential.array().to_vec());
    }

    #[test]
    fn test_rebuild_starts_over() {
        let mut idx = index(b"to be or not to be", recursive());
        idx.build_index(1).unwrap();
        let first = idx.array().to_vec();
        idx.build_index(5).unwrap();
        assert_eq!(idx.array().to_vec(), first);
        assert_eq!(idx.meta().window, 5);
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut idx = index(b"abc", EngineConfig::default());
        assert!(matches!(idx.build_index(0), Err(Error::InvalidWindow)));
        assert!(!idx.is_built());
    }

    #[test]
    fn test_populate_by_scan_is_stable() {
        let store = TokenSource::from_bytes(b"banana".to_vec(), Tokenization::Bytes).unwrap();
        let mut array = crate::store::ArrayStore::anonymous(6).unwrap();
        let sorter = BucketSorter::new(&store, 1, 10);

        let mut slots = array.slots();
        let counts = sorter.populate_by_scan(&mut slots, 0, 0).unwrap();
        let sizes: Vec<(Vec<u8>, usize)> = counts.iter().map(|(k, &v)| (k.concat(), v)).collect();
        assert_eq!(
            sizes,
            vec![(b"a".to_vec(), 3), (b"b".to_vec(), 1), (b"n".to_vec(), 2)]
        );
        assert_eq!(array.to_vec(), vec![1, 3, 5, 0, 2, 4]);
    }
}
