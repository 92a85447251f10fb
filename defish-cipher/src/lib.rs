//! # defish Cipher
//!
//! Keyed byte-shift obfuscation for the defish pipeline. **Not
//! cryptography**: it deters casual inspection, nothing more.
//!
//! A numeric seed (derived outside this crate, e.g. by hashing a password)
//! seeds a deterministic keystream generator once. Encoding adds the next
//! keystream byte to each input byte modulo 256; decoding subtracts it.
//! Both directions consume the generator in lockstep, so identical seeds
//! reproduce identical shift sequences. The stream is strictly 1:1 and
//! must start from position 0 with a freshly seeded generator; there is
//! no mid-stream re-entry.
//!
//! The generator is SplitMix64, written out below as part of the archive
//! format: stability cannot depend on any library's PRNG internals.
//!
//! ## Example
//!
//! ```rust
//! use defish_cipher::{CipherDecoder, CipherEncoder};
//!
//! let secret = b"attack at dawn";
//! let shifted: Vec<u8> = CipherEncoder::new(secret.iter().copied().map(Ok), 42)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! let restored: Vec<u8> = CipherDecoder::new(shifted.into_iter().map(Ok), 42)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(restored, secret);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use defish_core::error::Result;

/// Deterministic keystream generator (SplitMix64).
///
/// The constants below are part of the archive format; changing them
/// breaks every existing ciphered archive.
#[derive(Debug, Clone)]
pub struct KeyStream {
    state: u64,
}

impl KeyStream {
    /// Seed a fresh generator at position 0.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Draw the next shift value.
    pub fn next_byte(&mut self) -> u8 {
        (self.next_u64() & 0xFF) as u8
    }
}

/// Streaming stage shifting each byte forward by the keystream.
#[derive(Debug)]
pub struct CipherEncoder<I> {
    input: I,
    keys: KeyStream,
}

impl<I> CipherEncoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// Wrap a byte stream at position 0 with a freshly seeded generator.
    pub fn new(input: I, seed: u64) -> Self {
        Self {
            input,
            keys: KeyStream::new(seed),
        }
    }
}

impl<I> Iterator for CipherEncoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let byte = match self.input.next()? {
            Ok(byte) => byte,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(byte.wrapping_add(self.keys.next_byte())))
    }
}

/// Streaming stage shifting each byte back by the keystream.
#[derive(Debug)]
pub struct CipherDecoder<I> {
    input: I,
    keys: KeyStream,
}

impl<I> CipherDecoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// Wrap a byte stream at position 0 with a freshly seeded generator.
    pub fn new(input: I, seed: u64) -> Self {
        Self {
            input,
            keys: KeyStream::new(seed),
        }
    }
}

impl<I> Iterator for CipherDecoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let byte = match self.input.next()? {
            Ok(byte) => byte,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(byte.wrapping_sub(self.keys.next_byte())))
    }
}
