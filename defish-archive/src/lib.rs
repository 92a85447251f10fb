//! # defish Archive
//!
//! The `.defish` container format and the engine that drives the per-file
//! compression pipeline.
//!
//! Archive layout (multi-byte integers big-endian):
//!
//! ```text
//! offset 0      : flags (1B) - bit0 cipher, bit1 LZ77
//! offset 1..4   : tree_pointer (4B, absolute offset of the tree region)
//! offset 5..N   : concatenated per-file regions (Huffman block sequences)
//! offset N..end : tree_byte_length(4B) + serialized directory tree
//! ```
//!
//! The tree pointer is a forward reference: a placeholder is written
//! first, the per-file regions stream out while their offsets and lengths
//! are recorded, and the placeholder is patched once the tree region's
//! true offset is known.
//!
//! ## Example
//!
//! ```no_run
//! use defish_archive::Engine;
//!
//! let engine = Engine::new("data/reports", "data").with_lz77(true);
//! let report = engine.compress().unwrap();
//! println!("{} bytes written", report.bytes_written);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod flags;
pub mod io;
pub mod pipeline;
pub mod tree;

// Re-exports
pub use engine::{
    ARCHIVE_EXTENSION, CompressReport, DecompressReport, DEFAULT_WRITE_LIMIT, Engine,
};
pub use flags::Flags;
pub use pipeline::PipelineConfig;
pub use tree::{DirNode, FileNode};
