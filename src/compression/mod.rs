//! Compression method implementations
//!
//! Only the -lh5- method is implemented, and only in the decode direction;
//! the legacy archives this crate targets never carry anything else.

pub mod lh5;

pub use lh5::{decompress, decompress_into};
