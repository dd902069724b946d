//! Content fingerprints for incremental build change detection.
//!
//! [`hashing`] holds the core: a file's content plus its length folded into one
//! 64-bit value, and normalized paths folded under a case policy. [`stamps`]
//! records those fingerprints between builds and reports what changed.

pub mod config;
pub mod hashing;
pub mod stamps;
pub mod utils;
