//! Durable storage for index and compression artifacts
//!
//! - [`array`] - memory-mapped fixed-width (`u32`) arrays: suffix arrays,
//!   offset tables and compressed id streams
//! - [`blob`] - append-only length-prefixed byte strings (the dictionary)
//!
//! All I/O is synchronous. Nothing here fsyncs or checksums; an interrupted
//! append leaves the file truncated at the last complete entry.

pub mod array;
pub mod blob;

pub use array::{ArrayStore, ArrayWriter, ENTRY_SIZE};
pub(crate) use array::Slots;
pub use blob::{DictionaryStore, DictionaryWriter};
