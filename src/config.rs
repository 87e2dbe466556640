use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunable parameters for building, mining and compressing.
///
/// Stored as JSON; every field falls back to its default when missing so
/// partial config files keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tokens per bucket key during the scan pass (`build_index(n)`)
    #[serde(default = "default_window")]
    pub window: usize,

    /// Buckets smaller than this are sorted by direct suffix comparison
    #[serde(default = "default_small_bucket_threshold")]
    pub small_bucket_threshold: usize,

    /// Storage cost charged per dictionary entry occurrence when scoring
    /// candidate substrings
    #[serde(default = "default_entry_overhead")]
    pub entry_overhead: i64,

    /// Longest candidate substring considered by the miner, in tokens
    #[serde(default = "default_max_entry_tokens")]
    pub max_entry_tokens: usize,

    /// Refine top-level buckets on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Minimum token count before parallel refinement kicks in
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_window() -> usize {
    2
}

fn default_small_bucket_threshold() -> usize {
    10
}

fn default_entry_overhead() -> i64 {
    2
}

fn default_max_entry_tokens() -> usize {
    64
}

fn default_parallel() -> bool {
    true
}

fn default_parallel_threshold() -> usize {
    100_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            small_bucket_threshold: default_small_bucket_threshold(),
            entry_overhead: default_entry_overhead(),
            max_entry_tokens: default_max_entry_tokens(),
            parallel: default_parallel(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl EngineConfig {
    /// Load config from a JSON file, or return the defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Score a candidate substring: encoded-id savings minus dictionary cost.
    ///
    /// `occurrences * length - occurrences * overhead - length`
    #[inline]
    pub fn fitness(&self, occurrences: usize, length: usize) -> i64 {
        let occ = occurrences as i64;
        let len = length as i64;
        occ * len - occ * self.entry_overhead - len
    }
}
