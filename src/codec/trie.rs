//! Token trie over codec entries for greedy longest-prefix matching

use super::Codec;
use crate::tokens::TokenStore;
use rustc_hash::FxHashMap;

#[derive(Default)]
struct TrieNode {
    children: FxHashMap<Vec<u8>, usize>,
    /// Codec id of the entry ending at this node
    id: Option<u32>,
}

/// Map-of-maps trie keyed by token bytes
pub struct CodecTrie {
    nodes: Vec<TrieNode>,
    /// Deepest entry, in tokens
    max_depth: usize,
}

impl CodecTrie {
    /// Insert every codec entry, split with the store's tokenizer
    pub fn build<S: TokenStore>(store: &S, codec: &Codec) -> Self {
        let mut trie = Self {
            nodes: vec![TrieNode::default()],
            max_depth: 0,
        };
        for (id, entry) in codec.entries().iter().enumerate() {
            trie.insert(&store.split_tokens(entry), id as u32);
        }
        trie
    }

    fn insert(&mut self, tokens: &[&[u8]], id: u32) {
        let mut node = 0;
        for &token in tokens {
            node = match self.nodes[node].children.get(token) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(token.to_vec(), child);
                    child
                }
            };
        }
        // Entries are unique, so a node is claimed at most once
        self.nodes[node].id.get_or_insert(id);
        self.max_depth = self.max_depth.max(tokens.len());
    }

    /// Deepest entry, in tokens
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Longest entry matching the tokens at `position`, as `(id, tokens)`.
    ///
    /// Matching stops at the end of the stream; it never wraps.
    pub fn longest_match<S: TokenStore>(&self, store: &S, position: usize) -> Option<(u32, usize)> {
        let available = store.token_count().saturating_sub(position);
        let mut node = 0;
        let mut best = None;

        for depth in 0..available.min(self.max_depth) {
            match self.nodes[node].children.get(store.token(position + depth)) {
                Some(&child) => {
                    node = child;
                    if let Some(id) = self.nodes[node].id {
                        best = Some((id, depth + 1));
                    }
                }
                None => break,
            }
        }

        best
    }
}
