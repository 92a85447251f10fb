//! # defish Huffman
//!
//! Per-block adaptive Huffman coding for the defish pipeline.
//!
//! Input is partitioned into fixed-size blocks (the final block may be
//! short); each block gets its own prefix code built from its own symbol
//! frequencies, so no external context is needed to decode it. Blocks
//! travel as self-describing byte sections via [`BlockEncoder`] /
//! [`BlockDecoder`]: a length-prefixed code table followed by a
//! length-prefixed bit-packed data section with a declared filler-bit
//! count.
//!
//! ## Example
//!
//! ```rust
//! use defish_huffman::{BlockDecoder, BlockEncoder, HuffmanDecoder, HuffmanEncoder};
//!
//! let input = b"abracadabra";
//! let blocks = HuffmanEncoder::new(input.iter().copied().map(Ok), 8).unwrap();
//! let bytes = BlockEncoder::new(blocks);
//! let restored: Vec<u8> = HuffmanDecoder::new(BlockDecoder::new(bytes))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(restored, input);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod tree;
pub mod wire;

// Re-exports
pub use block::{Code, HuffmanBlock, HuffmanDecoder, HuffmanEncoder, MAX_CODE_BITS};
pub use wire::{BlockDecoder, BlockEncoder};
