//! # defish LZ77
//!
//! Bounded sliding-window LZ77 for the defish pipeline.
//!
//! The encoder walks a lazy byte stream with a search window and an equally
//! sized look-ahead window, emitting [`Lz77Record`]s: literals for
//! unmatched bytes and back-references (distance, length) for repeated
//! runs. The decoder replays records against a single history window;
//! copies with distance smaller than length repeat a pattern.
//!
//! Records travel as bytes via [`RecordEncoder`]/[`RecordDecoder`]:
//! a literal is `[0x00][item]`, a copy is `[distance][length]` with
//! distance never zero. Window width and maximum match length are capped
//! at 255 so both fields fit one byte.
//!
//! ## Example
//!
//! ```rust
//! use defish_lz77::{Lz77Decoder, Lz77Encoder};
//!
//! let input = b"abababab";
//! let records = Lz77Encoder::new(input.iter().copied().map(Ok), 50, 50)
//!     .unwrap()
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! let restored = Lz77Decoder::new(records.into_iter().map(Ok), 50)
//!     .unwrap()
//!     .collect::<Result<Vec<u8>, _>>()
//!     .unwrap();
//! assert_eq!(restored, input);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod encode;
pub mod record;

// Re-exports
pub use decode::Lz77Decoder;
pub use encode::Lz77Encoder;
pub use record::{Lz77Record, RecordDecoder, RecordEncoder};
