//! Dictionary candidate mining
//!
//! Adjacent ranks in a built index share their longest common prefix, so a
//! single pass over neighbour LCPs enumerates every repeated substring
//! together with its occurrence count (the size of its rank interval).
//! Each interval is scored with [`EngineConfig::fitness`] and the best
//! non-overlapping ones are returned.
//!
//! [`EngineConfig::fitness`]: crate::config::EngineConfig::fitness

use super::types::Candidate;
use super::SuffixIndex;
use crate::error::Result;
use crate::tokens::TokenStore;
use std::cmp::Reverse;
use tracing::debug;

/// Candidate plus its tokens, kept for overlap checks
struct Scored<'a> {
    candidate: Candidate,
    tokens: Vec<&'a [u8]>,
}

impl<S: TokenStore> SuffixIndex<S> {
    /// Up to `count` repeated substrings whose fitness exceeds `threshold`,
    /// best first.
    ///
    /// No returned candidate is a token prefix of another.
    pub fn find_compression_prefixes(&self, threshold: i64, count: usize) -> Result<Vec<Candidate>> {
        self.ensure_built()?;
        let scored = self.collect_intervals(threshold);
        let total = scored.len();
        let selected = select(scored, count);

        debug!(
            threshold,
            evaluated = total,
            selected = selected.len(),
            "mined compression prefixes"
        );
        Ok(selected)
    }

    /// Walk neighbour LCPs with a stack of open `(length, first rank)`
    /// intervals, scoring each interval as it closes.
    fn collect_intervals(&self, threshold: i64) -> Vec<Scored<'_>> {
        let n = self.array.len();
        let cap = self.config.max_entry_tokens.min(n);
        let mut open: Vec<(usize, usize)> = Vec::new();
        let mut scored = Vec::new();

        for rank in 1..=n {
            let lcp = if rank < n {
                self.store.common_prefix_len(
                    self.array.at(rank - 1) as usize,
                    self.array.at(rank) as usize,
                    cap,
                )
            } else {
                0
            };

            let mut first = rank - 1;
            while let Some(&(length, start)) = open.last() {
                if length <= lcp {
                    break;
                }
                open.pop();
                if let Some(entry) = self.score(start, rank, length, threshold) {
                    scored.push(entry);
                }
                first = start;
            }

            if lcp > 0 && open.last().is_none_or(|&(length, _)| length < lcp) {
                open.push((lcp, first));
            }
        }

        scored
    }

    /// Score the `length`-token prefix shared by ranks `first..end`
    fn score(&self, first: usize, end: usize, length: usize, threshold: i64) -> Option<Scored<'_>> {
        let occurrences = end - first;
        let fitness = self.config.fitness(occurrences, length);
        if fitness <= threshold {
            return None;
        }

        let position = self.array.at(first) as usize;
        let tokens = self.store.window(position, length, 0);
        Some(Scored {
            candidate: Candidate {
                bytes: tokens.concat(),
                tokens: length,
                occurrences,
                fitness,
            },
            tokens,
        })
    }
}

/// Greedy pick by fitness (then length, then bytes), skipping prefix overlaps
fn select(mut scored: Vec<Scored<'_>>, count: usize) -> Vec<Candidate> {
    scored.sort_by(|a, b| {
        let a = &a.candidate;
        let b = &b.candidate;
        (Reverse(a.fitness), Reverse(a.tokens), &a.bytes).cmp(&(
            Reverse(b.fitness),
            Reverse(b.tokens),
            &b.bytes,
        ))
    });

    let mut chosen: Vec<Scored<'_>> = Vec::new();
    for entry in scored {
        if chosen.len() >= count {
            break;
        }
        let overlaps = chosen.iter().any(|kept| {
            is_token_prefix(&kept.tokens, &entry.tokens) || is_token_prefix(&entry.tokens, &kept.tokens)
        });
        if !overlaps {
            chosen.push(entry);
        }
    }

    chosen.into_iter().map(|entry| entry.candidate).collect()
}

fn is_token_prefix(prefix: &[&[u8]], of: &[&[u8]]) -> bool {
    prefix.len() <= of.len() && prefix == &of[..prefix.len()]
}
