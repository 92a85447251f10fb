//! Dual-granularity byte/bit buffer.
//!
//! [`BitBuffer`] bridges byte-oriented and bit-oriented pipeline stages: it
//! accepts whole bytes or individual bits on the input side and hands out
//! whole bytes or individual bits on the output side. Variable-length codes
//! are appended bit by bit and leave the buffer as framed bytes; framed
//! bytes read from an archive are split back into bits on demand.
//!
//! # Bit Ordering
//!
//! LSB-first within a byte: the first bit appended becomes the least
//! significant bit of its byte, and `pop_bit` returns bits in the same
//! order they were appended.
//!
//! # Granularity rule
//!
//! Byte appends and bit appends cannot mix mid-byte: while a partial group
//! of 1-7 input bits is pending, `push_byte` is rejected. A completed group
//! of 8 bits becomes a byte automatically; [`BitBuffer::flush_bits`] forces
//! out a partial group, zero-padded, and reports how many of its bits are
//! significant so writers can record exact filler counts.

use crate::error::{DefishError, Result};
use std::collections::VecDeque;

/// A buffer accepting and producing data at byte or bit granularity.
#[derive(Debug, Default)]
pub struct BitBuffer {
    /// Completed bytes, oldest first.
    bytes: VecDeque<u8>,
    /// Pending input bits, LSB-first (always fewer than 8).
    in_bits: Vec<bool>,
    /// Bits split off the oldest byte for bit-granularity reads.
    out_bits: VecDeque<bool>,
}

impl BitBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a byte can currently be appended (no input bits pending).
    pub fn can_push_byte(&self) -> bool {
        self.in_bits.is_empty()
    }

    /// Append one whole byte.
    ///
    /// # Errors
    ///
    /// Fails with [`DefishError::BitsPending`] while a partial bit group
    /// is pending; granularities cannot mix mid-byte.
    pub fn push_byte(&mut self, byte: u8) -> Result<()> {
        if !self.can_push_byte() {
            return Err(DefishError::bits_pending(self.in_bits.len()));
        }
        self.bytes.push_back(byte);
        Ok(())
    }

    /// Append a run of whole bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.push_byte(byte)?;
        }
        Ok(())
    }

    /// Append a single bit.
    ///
    /// Bits accumulate LSB-first; a completed group of 8 becomes a byte
    /// automatically.
    pub fn push_bit(&mut self, bit: bool) {
        self.in_bits.push(bit);
        if self.in_bits.len() == 8 {
            self.flush_bits();
        }
    }

    /// Pad and emit the pending input bit group regardless of its size.
    ///
    /// Returns the number of *significant* bits flushed (0 for an empty
    /// group, in which case nothing is mutated). Writers use this count to
    /// record exact filler-bit counts in framed sections.
    pub fn flush_bits(&mut self) -> usize {
        let significant = self.in_bits.len();
        if significant == 0 {
            return 0;
        }
        let mut byte = 0u8;
        for (position, &bit) in self.in_bits.iter().enumerate() {
            if bit {
                byte |= 1 << position;
            }
        }
        self.in_bits.clear();
        self.bytes.push_back(byte);
        significant
    }

    /// Whether any byte is available (pending input bits count: they flush
    /// into a byte on demand).
    pub fn has_bytes(&self) -> bool {
        !self.bytes.is_empty() || !self.in_bits.is_empty()
    }

    /// Whether more bits remain beyond `threshold` trailing bits.
    ///
    /// A reader that knows a section ends with `threshold` declared filler
    /// bits uses this to distinguish genuine remaining data from padding:
    /// once only the filler is left in the final partial byte, this returns
    /// `false`. `threshold` must be in `0..=7`.
    pub fn has_bits(&self, threshold: usize) -> bool {
        debug_assert!(threshold <= 7, "filler threshold must be below 8");
        self.has_bytes() || self.out_bits.len() > threshold
    }

    /// Pop the oldest byte.
    ///
    /// A pending partial input bit group is flushed first if it is the only
    /// content left.
    ///
    /// # Errors
    ///
    /// Fails with [`DefishError::BufferEmpty`] when nothing is buffered.
    /// An empty buffer is caller misuse, not an end-of-stream signal.
    pub fn pop_byte(&mut self) -> Result<u8> {
        if !self.has_bytes() {
            return Err(DefishError::BufferEmpty);
        }
        if self.bytes.is_empty() {
            self.flush_bits();
        }
        // Non-empty by the checks above.
        self.bytes.pop_front().ok_or(DefishError::BufferEmpty)
    }

    /// Pop `n` bytes, oldest first.
    pub fn pop_n_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(n);
        for _ in 0..n {
            result.push(self.pop_byte()?);
        }
        Ok(result)
    }

    /// Pop the next bit, lazily splitting the oldest byte into 8 bits.
    ///
    /// # Errors
    ///
    /// Fails with [`DefishError::BufferEmpty`] when no byte is left to
    /// split and no split bits remain.
    pub fn pop_bit(&mut self) -> Result<bool> {
        if self.out_bits.is_empty() {
            let byte = self.pop_byte()?;
            for position in 0..8 {
                self.out_bits.push_back(byte & (1 << position) != 0);
            }
        }
        self.out_bits.pop_front().ok_or(DefishError::BufferEmpty)
    }

    /// Drop any bits already split off for bit-granularity reads.
    ///
    /// Readers call this after consuming a bit-packed field that is padded
    /// to a byte boundary, discarding the padding.
    pub fn discard_out_bits(&mut self) {
        self.out_bits.clear();
    }

    /// Number of complete bytes currently buffered (pending input bits and
    /// split output bits excluded).
    pub fn full_byte_len(&self) -> usize {
        self.bytes.len()
    }
}
