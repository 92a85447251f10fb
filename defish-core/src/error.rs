//! Error types for defish operations.
//!
//! One error enum covers the whole pipeline: format violations found while
//! decoding an archive, precondition violations signalling caller misuse,
//! and resource limits. End-of-stream is never an error here; exhaustion is
//! signalled by iterators returning `None` and only a *premature* end of
//! input maps to [`DefishError::UnexpectedEof`].

use std::io;
use thiserror::Error;

/// The main error type for defish operations.
#[derive(Debug, Error)]
pub enum DefishError {
    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Byte-granularity append attempted while 1-7 input bits are pending.
    #[error("cannot append a byte: {pending} input bits pending")]
    BitsPending {
        /// Number of pending input bits (1-7).
        pending: usize,
    },

    /// Pop attempted on an empty buffer.
    ///
    /// This is caller misuse, not an end-of-stream signal; stream
    /// exhaustion is the caller's responsibility.
    #[error("pop on empty buffer")]
    BufferEmpty,

    /// Inconsistent LZ77 record construction.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the inconsistency.
        message: String,
    },

    /// Input ended in the middle of a framed section.
    #[error("unexpected end of input: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// Malformed data that cannot be decoded.
    #[error("corrupted data: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// A Huffman code with no entry in the block's table.
    #[error("unknown Huffman code of {bits} bits")]
    UnknownCode {
        /// Bit length of the unmatched candidate.
        bits: usize,
    },

    /// A candidate Huffman code grew past the codec's maximum length.
    #[error("Huffman code too long: {bits} bits exceeds maximum {max}")]
    CodeTooLong {
        /// Bit length reached by the candidate.
        bits: usize,
        /// Maximum code length supported by the format.
        max: usize,
    },

    /// LZ77 back-reference distance exceeds the current history.
    #[error("invalid back-reference distance {distance}: history holds {history} bytes")]
    InvalidDistance {
        /// The offending distance.
        distance: usize,
        /// Current history occupancy.
        history: usize,
    },

    /// Invalid codec configuration (window width, block length, ...).
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration problem.
        message: String,
    },

    /// The write quota was exhausted while producing output that must be
    /// complete to be useful (e.g. the archive itself during compression).
    #[error("write limit of {limit} bytes reached")]
    WriteLimitReached {
        /// The configured limit in bytes.
        limit: u64,
    },

    /// The archive was written with the cipher enabled but no password
    /// (and hence no seed) was supplied for decompression.
    #[error("archive is password protected; a password is required")]
    PasswordRequired,
}

/// Result type alias for defish operations.
pub type Result<T> = std::result::Result<T, DefishError>;

impl DefishError {
    /// Create a bits-pending error.
    pub fn bits_pending(pending: usize) -> Self {
        Self::BitsPending { pending }
    }

    /// Create an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create a corrupted data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Create an unknown code error.
    pub fn unknown_code(bits: usize) -> Self {
        Self::UnknownCode { bits }
    }

    /// Create a code-too-long error.
    pub fn code_too_long(bits: usize, max: usize) -> Self {
        Self::CodeTooLong { bits, max }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history: usize) -> Self {
        Self::InvalidDistance { distance, history }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a write-limit error.
    pub fn write_limit_reached(limit: u64) -> Self {
        Self::WriteLimitReached { limit }
    }
}
