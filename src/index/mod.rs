pub mod stats;
pub mod suffix_array;
pub mod types;

pub use stats::{show_stats, IndexStats};
pub use suffix_array::{Candidate, SuffixIndex};
pub use types::*;
