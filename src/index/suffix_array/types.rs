//! Types for suffix array building and mining

use crate::tokens::Tokenization;
use serde::Serialize;
use std::collections::BTreeMap;

/// Bucket key (a window of tokens) to bucket size, in key order
pub type BucketCounts<'a> = BTreeMap<Vec<&'a [u8]>, usize>;

/// Repeated substring proposed as a dictionary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Concatenated token bytes
    pub bytes: Vec<u8>,
    /// Length in tokens
    pub tokens: usize,
    /// Number of suffixes starting with this substring
    pub occurrences: usize,
    /// Estimated savings from adding this entry
    pub fitness: i64,
}

impl Candidate {
    /// Bytes decoded as text under `tokenization`, undecodable input replaced
    pub fn text(&self, tokenization: Tokenization) -> String {
        tokenization.decode_lossy(&self.bytes)
    }
}
