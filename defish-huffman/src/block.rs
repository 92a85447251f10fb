//! Huffman blocks, codes, and the streaming block encoder/decoder.
//!
//! A [`HuffmanBlock`] is self-contained: its table maps every symbol the
//! block uses to a prefix-free [`Code`], and its data is one code per
//! original symbol occurrence, in order. Blocks decode independently and
//! concatenate.

use crate::tree::build_codes;
use defish_core::error::{DefishError, Result};
use std::collections::HashMap;
use std::collections::VecDeque;

/// Maximum code length in bits representable by the wire format's one-byte
/// code-length field.
pub const MAX_CODE_BITS: usize = 255;

/// An exact bit string; bit order is preserved end to end, so the order
/// bits are pushed here is the order they appear on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Code {
    bits: Vec<bool>,
}

impl Code {
    /// An empty code.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one bit.
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Remove the last bit.
    pub fn pop(&mut self) -> Option<bool> {
        self.bits.pop()
    }

    /// Drop all bits.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the code has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Iterate the bits in wire order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Whether `self` is a proper or improper prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.bits.len() <= other.bits.len() && other.bits[..self.bits.len()] == self.bits[..]
    }
}

impl FromIterator<bool> for Code {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

/// One self-contained block: symbol→code table plus per-occurrence codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanBlock {
    /// Symbol→code pairs, prefix-free within the block.
    pub table: Vec<(u8, Code)>,
    /// The block's content as one code per original symbol, in order.
    pub data: Vec<Code>,
}

/// Streaming encoder: pumps fixed-size blocks of symbols from a lazy input
/// and emits one [`HuffmanBlock`] per pump.
#[derive(Debug)]
pub struct HuffmanEncoder<I> {
    input: I,
    block_len: usize,
    done: bool,
}

impl<I> HuffmanEncoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// Create an encoder cutting blocks of `block_len` symbols.
    pub fn new(input: I, block_len: usize) -> Result<Self> {
        if block_len == 0 {
            return Err(DefishError::invalid_config("block length must not be 0"));
        }
        Ok(Self {
            input,
            block_len,
            done: false,
        })
    }

    /// Pull up to one block's worth of symbols.
    fn pump(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(self.block_len);
        for _ in 0..self.block_len {
            match self.input.next().transpose()? {
                Some(byte) => buffer.push(byte),
                None => break,
            }
        }
        Ok(buffer)
    }

    fn encode_buffer(buffer: &[u8]) -> HuffmanBlock {
        // Count frequencies, remembering first-occurrence order: that
        // order seeds the tree builder's tie-break sequence.
        let mut counts = [0u64; 256];
        let mut order = Vec::new();
        for &byte in buffer {
            if counts[byte as usize] == 0 {
                order.push(byte);
            }
            counts[byte as usize] += 1;
        }
        let weights: Vec<(u8, u64)> = order
            .iter()
            .map(|&symbol| (symbol, counts[symbol as usize]))
            .collect();
        let table = build_codes(&weights);

        let mut code_index = [usize::MAX; 256];
        for (i, (symbol, _)) in table.iter().enumerate() {
            code_index[*symbol as usize] = i;
        }
        // Every buffer byte was counted above, so its table entry exists;
        // a missing entry is a logic error and must not be skipped over.
        let data: Vec<Code> = buffer
            .iter()
            .map(|&byte| table[code_index[byte as usize]].1.clone())
            .collect();
        HuffmanBlock { table, data }
    }
}

impl<I> Iterator for HuffmanEncoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    type Item = Result<HuffmanBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.pump() {
            Ok(buffer) if buffer.is_empty() => {
                self.done = true;
                None
            }
            Ok(buffer) => Some(Ok(Self::encode_buffer(&buffer))),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Streaming decoder: inverts each block's table and maps its data codes
/// back to symbols in order.
#[derive(Debug)]
pub struct HuffmanDecoder<I> {
    input: I,
    out: VecDeque<u8>,
    done: bool,
}

impl<I> HuffmanDecoder<I>
where
    I: Iterator<Item = Result<HuffmanBlock>>,
{
    /// Wrap a block stream.
    pub fn new(input: I) -> Self {
        Self {
            input,
            out: VecDeque::new(),
            done: false,
        }
    }

    fn decode_block(&mut self, block: &HuffmanBlock) -> Result<()> {
        let mut symbol_of: HashMap<&Code, u8> = HashMap::with_capacity(block.table.len());
        for (symbol, code) in &block.table {
            if symbol_of.insert(code, *symbol).is_some() {
                return Err(DefishError::corrupted(
                    "duplicate code in block table",
                ));
            }
        }
        for code in &block.data {
            match symbol_of.get(code) {
                Some(&symbol) => self.out.push_back(symbol),
                None => return Err(DefishError::unknown_code(code.len())),
            }
        }
        Ok(())
    }
}

impl<I> Iterator for HuffmanDecoder<I>
where
    I: Iterator<Item = Result<HuffmanBlock>>,
{
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(byte) = self.out.pop_front() {
                return Some(Ok(byte));
            }
            if self.done {
                return None;
            }
            match self.input.next() {
                Some(Ok(block)) => {
                    if let Err(err) = self.decode_block(&block) {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(bits: &[u8]) -> Code {
        bits.iter().map(|&b| b != 0).collect()
    }

    fn roundtrip(data: &[u8], block_len: usize) -> Vec<u8> {
        let encoder = HuffmanEncoder::new(data.iter().copied().map(Ok), block_len).unwrap();
        HuffmanDecoder::new(encoder)
            .collect::<Result<Vec<u8>>>()
            .unwrap()
    }

    #[test]
    fn test_roundtrip_various_block_sizes() {
        let data = b"she sells sea shells by the sea shore".to_vec();
        for block_len in [1, 2, 5, 16, 64, 10000] {
            assert_eq!(roundtrip(&data, block_len), data, "block_len {}", block_len);
        }
    }

    #[test]
    fn test_every_input_byte_gets_a_code() {
        let data: Vec<u8> = (0..=255u8).chain(b"mixed tail".iter().copied()).collect();
        let mut encoder =
            HuffmanEncoder::new(data.iter().copied().map(Ok), 10000).unwrap();
        let block = encoder.next().unwrap().unwrap();
        assert_eq!(block.data.len(), data.len());
        assert_eq!(block.table.len(), 256);
    }

    #[test]
    fn test_single_symbol_alphabet_roundtrips_with_one_bit_code() {
        let data = vec![b'q'; 23];
        let mut encoder =
            HuffmanEncoder::new(data.iter().copied().map(Ok), 10000).unwrap();
        let block = encoder.next().unwrap().unwrap();
        assert!(encoder.next().is_none());
        assert_eq!(block.table.len(), 1);
        assert_eq!(block.table[0].1.len(), 1);
        assert_eq!(block.data.len(), 23);
        let decoded: Vec<u8> = HuffmanDecoder::new(std::iter::once(Ok(block)))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        let mut encoder =
            HuffmanEncoder::new(std::iter::empty::<Result<u8>>(), 100).unwrap();
        assert!(encoder.next().is_none());
    }

    #[test]
    fn test_short_final_block() {
        let data = b"aaaabbbbc".to_vec();
        let encoder = HuffmanEncoder::new(data.iter().copied().map(Ok), 4).unwrap();
        let blocks: Vec<HuffmanBlock> = encoder.collect::<Result<_>>().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2].data.len(), 1);
    }

    #[test]
    fn test_data_preserves_occurrence_order() {
        let data = b"abca".to_vec();
        let encoder = HuffmanEncoder::new(data.iter().copied().map(Ok), 100).unwrap();
        let block = encoder.collect::<Result<Vec<_>>>().unwrap().remove(0);
        let first = block
            .table
            .iter()
            .find(|(s, _)| *s == b'a')
            .map(|(_, c)| c.clone())
            .unwrap();
        assert_eq!(block.data[0], first);
        assert_eq!(block.data[3], first);
    }

    #[test]
    fn test_unknown_code_is_fatal() {
        let block = HuffmanBlock {
            table: vec![(b'a', code(&[0]))],
            data: vec![code(&[1])],
        };
        let mut decoder = HuffmanDecoder::new(std::iter::once(Ok(block)));
        assert!(matches!(
            decoder.next(),
            Some(Err(DefishError::UnknownCode { bits: 1 }))
        ));
    }

    #[test]
    fn test_blocks_decode_independently_and_concatenate() {
        // Two blocks with conflicting tables for the same code.
        let first = HuffmanBlock {
            table: vec![(b'x', code(&[0]))],
            data: vec![code(&[0]); 2],
        };
        let second = HuffmanBlock {
            table: vec![(b'y', code(&[0]))],
            data: vec![code(&[0]); 3],
        };
        let decoded: Vec<u8> = HuffmanDecoder::new(vec![Ok(first), Ok(second)].into_iter())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(decoded, b"xxyyy");
    }
}
