//! Capture decoding and the in-memory capture model.
//!
//! This module handles:
//! - Little-endian reading with bounds checks (`cursor`)
//! - The four historical header layouts (`header`)
//! - Descriptor, thread and bookmark sections (`decoder`)
//! - The decoded model (`schema`)

pub mod cursor;
pub mod decoder;
pub mod header;
pub mod options;
pub mod schema;

// Re-export main types
pub use cursor::ByteCursor;
pub use decoder::{decode, decode_file};
pub use header::FormatTier;
pub use options::ReadOptions;
pub use schema::{
    format_version, Block, BlockKind, Bookmark, Capture, ContextSwitch, Descriptor, Header, Thread,
};
