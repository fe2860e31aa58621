//! # Formats
//!
//! Serialization formats for stored blobs and exported snapshots.
//! File I/O operations are in the app layer.

mod persistence;

pub use persistence::*;
