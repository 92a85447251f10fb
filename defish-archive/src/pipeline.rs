//! Per-file pipeline assembly.
//!
//! A file region is produced by chaining the optional stages onto the raw
//! byte stream in a fixed order and is undone by the mirror-image chain:
//!
//! ```text
//! compress:   bytes -> [cipher] -> [LZ77 records -> record bytes] -> Huffman blocks
//! decompress: Huffman blocks -> [record bytes -> LZ77 replay] -> [decipher] -> bytes
//! ```
//!
//! Stage selection is recorded in the archive [`Flags`] byte, so the
//! decompressor reconstructs the exact chain the compressor used. Every
//! stage is a pull-based iterator; composing them never buffers more than
//! one Huffman block.

use crate::flags::Flags;
use defish_cipher::{CipherDecoder, CipherEncoder};
use defish_core::error::{DefishError, Result};
use defish_huffman::{BlockDecoder, BlockEncoder, HuffmanDecoder, HuffmanEncoder};
use defish_lz77::{Lz77Decoder, Lz77Encoder, RecordDecoder, RecordEncoder};

/// A boxed lazy byte stream, the unit every pipeline stage consumes and
/// produces.
pub type ByteIter<'a> = Box<dyn Iterator<Item = Result<u8>> + 'a>;

/// Tuning knobs for the transform stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// LZ77 search window width in bytes (1..=255).
    pub window_width: u8,
    /// Longest copy the LZ77 encoder will emit (1..=255).
    pub max_match: u8,
    /// Input bytes gathered per Huffman block.
    pub block_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_width: 50,
            max_match: 50,
            block_len: 10_000,
        }
    }
}

/// Chain the configured compression stages onto `input`.
///
/// # Errors
///
/// Returns [`DefishError::PasswordRequired`] when `flags` enables the
/// cipher but no seed is supplied, and [`DefishError::InvalidConfig`] for
/// out-of-range pipeline parameters.
pub fn compress_stream<'a>(
    input: impl Iterator<Item = Result<u8>> + 'a,
    flags: Flags,
    seed: Option<u64>,
    config: PipelineConfig,
) -> Result<ByteIter<'a>> {
    let mut stream: ByteIter<'a> = Box::new(input);
    if flags.cipher() {
        let seed = seed.ok_or(DefishError::PasswordRequired)?;
        stream = Box::new(CipherEncoder::new(stream, seed));
    }
    if flags.lz77() {
        let encoder = Lz77Encoder::new(
            stream,
            usize::from(config.window_width),
            usize::from(config.max_match),
        )?;
        stream = Box::new(RecordEncoder::new(encoder));
    }
    let huffman = HuffmanEncoder::new(stream, config.block_len)?;
    Ok(Box::new(BlockEncoder::new(huffman)))
}

/// Chain the decompression stages matching `flags` onto `input`.
///
/// # Errors
///
/// Returns [`DefishError::PasswordRequired`] when the archive was
/// enciphered but no seed is supplied.
pub fn decompress_stream<'a>(
    input: impl Iterator<Item = Result<u8>> + 'a,
    flags: Flags,
    seed: Option<u64>,
    config: PipelineConfig,
) -> Result<ByteIter<'a>> {
    let blocks = BlockDecoder::new(input);
    let mut stream: ByteIter<'a> = Box::new(HuffmanDecoder::new(blocks));
    if flags.lz77() {
        let records = RecordDecoder::new(stream);
        stream = Box::new(Lz77Decoder::new(records, usize::from(config.window_width))?);
    }
    if flags.cipher() {
        let seed = seed.ok_or(DefishError::PasswordRequired)?;
        stream = Box::new(CipherDecoder::new(stream, seed));
    }
    Ok(stream)
}
