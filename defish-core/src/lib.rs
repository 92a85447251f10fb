//! # defish Core
//!
//! Core components for the defish streaming compressor.
//!
//! This crate provides the building blocks shared by every pipeline stage:
//!
//! - [`bitbuf`]: dual-granularity byte/bit buffer for variable-length codes
//! - [`window`]: bounded history window for LZ77 match search and replay
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! defish is a stack of pull-based stages, each an `Iterator` that advances
//! only when its consumer asks for the next element:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container (defish-archive)                          │
//! │     flags, tree region, per-file offset bookkeeping     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codecs (defish-cipher, defish-lz77, defish-huffman) │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitBuffer / HistoryWindow (this crate)              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use defish_core::BitBuffer;
//!
//! let mut buf = BitBuffer::new();
//! buf.push_bit(true);
//! buf.push_bit(false);
//! buf.push_bit(true);
//! let significant = buf.flush_bits();
//! assert_eq!(significant, 3);
//! assert_eq!(buf.pop_byte().unwrap(), 0b101);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitbuf;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use bitbuf::BitBuffer;
pub use error::{DefishError, Result};
pub use window::HistoryWindow;
