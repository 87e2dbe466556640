//! Shared helpers for the command-line driver
//!
//! - [`progress`] - spinners, no-op without the `progress` feature

pub mod progress;

pub use progress::{finish, spinner};
