//! LZ77 records and their byte-level wire format.
//!
//! Wire layout, one record at a time:
//!
//! ```text
//! Literal: [0x00][item]
//! Copy:    [distance][length]     distance in 1..=255, length in 1..=255
//! ```
//!
//! A first byte of zero announces a literal; any other value is the copy
//! distance. The stream ends cleanly only on a record boundary; input
//! exhausted mid-record is a fatal framing error.

use defish_core::error::{DefishError, Result};

/// One LZ77 token: an unmatched byte or a backward copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Record {
    /// A single unmatched byte, emitted verbatim.
    Literal(u8),
    /// A repeated run located `distance` bytes back in the history.
    Copy {
        /// Backward distance, 1-based; never zero (zero marks a literal on
        /// the wire).
        distance: u8,
        /// Run length; may exceed `distance`, repeating a pattern.
        length: u8,
    },
}

impl Lz77Record {
    /// Construct a copy record, rejecting the zero distance reserved for
    /// literals and zero lengths that would encode nothing.
    pub fn copy(distance: u8, length: u8) -> Result<Self> {
        if distance == 0 {
            return Err(DefishError::invalid_record(
                "copy distance 0 is reserved for literals",
            ));
        }
        if length == 0 {
            return Err(DefishError::invalid_record("copy length must not be 0"));
        }
        Ok(Self::Copy { distance, length })
    }

    /// How many positions the encoder advances after emitting this record.
    pub fn advance(&self) -> usize {
        match self {
            Self::Literal(_) => 1,
            Self::Copy { length, .. } => *length as usize,
        }
    }
}

/// Streaming stage turning records into wire bytes.
#[derive(Debug)]
pub struct RecordEncoder<I> {
    input: I,
    pending: Option<u8>,
    done: bool,
}

impl<I> RecordEncoder<I>
where
    I: Iterator<Item = Result<Lz77Record>>,
{
    /// Wrap a record stream.
    pub fn new(input: I) -> Self {
        Self {
            input,
            pending: None,
            done: false,
        }
    }
}

impl<I> Iterator for RecordEncoder<I>
where
    I: Iterator<Item = Result<Lz77Record>>,
{
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(byte) = self.pending.take() {
            return Some(Ok(byte));
        }
        if self.done {
            return None;
        }
        match self.input.next()? {
            Ok(Lz77Record::Literal(item)) => {
                self.pending = Some(item);
                Some(Ok(0x00))
            }
            Ok(Lz77Record::Copy { distance, length }) => {
                self.pending = Some(length);
                Some(Ok(distance))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Streaming stage parsing wire bytes back into records.
#[derive(Debug)]
pub struct RecordDecoder<I> {
    input: I,
    done: bool,
}

impl<I> RecordDecoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// Wrap a byte stream positioned at a record boundary.
    pub fn new(input: I) -> Self {
        Self { input, done: false }
    }

    /// Read the second byte of a record; its absence is a framing error.
    fn second_byte(&mut self) -> Result<u8> {
        match self.input.next() {
            Some(Ok(byte)) => Ok(byte),
            Some(Err(err)) => Err(err),
            None => Err(DefishError::unexpected_eof(1)),
        }
    }
}

impl<I> Iterator for RecordDecoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    type Item = Result<Lz77Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let first = match self.input.next() {
            Some(Ok(byte)) => byte,
            Some(Err(err)) => {
                self.done = true;
                return Some(Err(err));
            }
            // Exhaustion on a record boundary is a clean end.
            None => return None,
        };
        let result = match self.second_byte() {
            Ok(second) if first == 0 => Ok(Lz77Record::Literal(second)),
            Ok(0) => Err(DefishError::corrupted("copy record with zero length")),
            Ok(second) => Ok(Lz77Record::Copy {
                distance: first,
                length: second,
            }),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
