//! Byte-level wire format for Huffman blocks.
//!
//! Per block, two length-prefixed sections (all multi-byte integers
//! big-endian):
//!
//! ```text
//! code table : table_length(4B)
//!              repeated { symbol(1B), code_bits(1B), code(ceil(bits/8)B) }
//!              - each record's code is zero-padded to its own byte boundary
//! data       : data_length(4B), filler_bits(1B)
//!              contiguous bit-packed codes, zero-padded only at the very end
//! ```
//!
//! Data decoding grows a candidate bit string one bit at a time and checks
//! it against the block's codes after every bit; the table is validated as
//! prefix-free on load, so the first match is unambiguous and consumed
//! greedily. A candidate passing [`MAX_CODE_BITS`], or significant bits
//! remaining that never complete a code, is a decode error.

use crate::block::{Code, HuffmanBlock, MAX_CODE_BITS};
use defish_core::bitbuf::BitBuffer;
use defish_core::error::{DefishError, Result};
use std::collections::HashSet;

/// Streaming stage turning blocks into framed wire bytes.
#[derive(Debug)]
pub struct BlockEncoder<I> {
    input: I,
    buffer: BitBuffer,
    done: bool,
}

impl<I> BlockEncoder<I>
where
    I: Iterator<Item = Result<HuffmanBlock>>,
{
    /// Wrap a block stream.
    pub fn new(input: I) -> Self {
        Self {
            input,
            buffer: BitBuffer::new(),
            done: false,
        }
    }

    fn check_block(block: &HuffmanBlock) -> Result<()> {
        for (symbol, code) in &block.table {
            if code.is_empty() {
                return Err(DefishError::invalid_record(format!(
                    "symbol {:#04x} has a zero-length code",
                    symbol
                )));
            }
            if code.len() > MAX_CODE_BITS {
                return Err(DefishError::code_too_long(code.len(), MAX_CODE_BITS));
            }
        }
        Ok(())
    }

    fn encode_block(&mut self, block: &HuffmanBlock) -> Result<()> {
        Self::check_block(block)?;
        self.write_code_table(block)?;
        self.write_data(block)
    }

    fn write_code_table(&mut self, block: &HuffmanBlock) -> Result<()> {
        let mut section = BitBuffer::new();
        for (symbol, code) in &block.table {
            section.push_byte(*symbol)?;
            section.push_byte(code.len() as u8)?;
            for bit in code.bits() {
                section.push_bit(bit);
            }
            // Pad each record's code to its own byte boundary.
            section.flush_bits();
        }
        let length = section.full_byte_len() as u32;
        self.buffer.push_bytes(&length.to_be_bytes())?;
        while section.has_bytes() {
            self.buffer.push_byte(section.pop_byte()?)?;
        }
        Ok(())
    }

    fn write_data(&mut self, block: &HuffmanBlock) -> Result<()> {
        let mut section = BitBuffer::new();
        for code in &block.data {
            for bit in code.bits() {
                section.push_bit(bit);
            }
        }
        let filler = (8 - section.flush_bits()) % 8;
        let length = section.full_byte_len() as u32;
        self.buffer.push_bytes(&length.to_be_bytes())?;
        self.buffer.push_byte(filler as u8)?;
        while section.has_bytes() {
            self.buffer.push_byte(section.pop_byte()?)?;
        }
        Ok(())
    }
}

impl<I> Iterator for BlockEncoder<I>
where
    I: Iterator<Item = Result<HuffmanBlock>>,
{
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.buffer.has_bytes() {
                return Some(self.buffer.pop_byte());
            }
            if self.done {
                return None;
            }
            match self.input.next() {
                Some(Ok(block)) => {
                    if let Err(err) = self.encode_block(&block) {
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

/// Streaming stage parsing framed wire bytes back into blocks.
#[derive(Debug)]
pub struct BlockDecoder<I> {
    input: I,
    buffer: BitBuffer,
    done: bool,
}

impl<I> BlockDecoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// Wrap a byte stream positioned at a block boundary.
    pub fn new(input: I) -> Self {
        Self {
            input,
            buffer: BitBuffer::new(),
            done: false,
        }
    }

    fn next_input_byte(&mut self) -> Result<Option<u8>> {
        self.input.next().transpose()
    }

    /// Read a 4-byte big-endian length. `None` only when the stream ends
    /// exactly on the boundary before the first byte.
    fn read_u32(&mut self, at_block_start: bool) -> Result<Option<u32>> {
        let mut raw = [0u8; 4];
        for (index, slot) in raw.iter_mut().enumerate() {
            match self.next_input_byte()? {
                Some(byte) => *slot = byte,
                None if index == 0 && at_block_start => return Ok(None),
                None => return Err(DefishError::unexpected_eof(4 - index)),
            }
        }
        Ok(Some(u32::from_be_bytes(raw)))
    }

    fn fill_buffer(&mut self, count: usize) -> Result<()> {
        debug_assert!(!self.buffer.has_bytes(), "section buffer must start empty");
        for remaining in (1..=count).rev() {
            match self.next_input_byte()? {
                Some(byte) => self.buffer.push_byte(byte)?,
                None => return Err(DefishError::unexpected_eof(remaining)),
            }
        }
        Ok(())
    }

    fn read_code_table(&mut self, length: usize) -> Result<Vec<(u8, Code)>> {
        self.fill_buffer(length)?;
        let mut table = Vec::new();
        while self.buffer.has_bytes() {
            let symbol = self.buffer.pop_byte()?;
            if !self.buffer.has_bytes() {
                return Err(DefishError::corrupted("truncated code table record"));
            }
            let code_bits = self.buffer.pop_byte()? as usize;
            if code_bits == 0 {
                return Err(DefishError::corrupted("zero-length code in table"));
            }
            let mut code = Code::new();
            for _ in 0..code_bits {
                match self.buffer.pop_bit() {
                    Ok(bit) => code.push(bit),
                    Err(_) => {
                        return Err(DefishError::corrupted("truncated code table record"));
                    }
                }
            }
            // Drop the record's padding bits.
            self.buffer.discard_out_bits();
            table.push((symbol, code));
        }
        Self::validate_table(&table)?;
        Ok(table)
    }

    /// Reject tables the greedy data decoder cannot resolve unambiguously.
    fn validate_table(table: &[(u8, Code)]) -> Result<()> {
        let mut seen_symbols = HashSet::new();
        for (symbol, _) in table {
            if !seen_symbols.insert(*symbol) {
                return Err(DefishError::corrupted("duplicate symbol in code table"));
            }
        }
        for (i, (_, a)) in table.iter().enumerate() {
            for (_, b) in table.iter().skip(i + 1) {
                if a.is_prefix_of(b) || b.is_prefix_of(a) {
                    return Err(DefishError::corrupted("code table is not prefix-free"));
                }
            }
        }
        Ok(())
    }

    fn read_data(&mut self, codes: &HashSet<Code>) -> Result<Vec<Code>> {
        let length = match self.read_u32(false)? {
            Some(length) => length as usize,
            None => return Err(DefishError::unexpected_eof(4)),
        };
        let filler = match self.next_input_byte()? {
            Some(byte) => byte as usize,
            None => return Err(DefishError::unexpected_eof(1)),
        };
        if filler > 7 {
            return Err(DefishError::corrupted(format!(
                "filler bit count {} out of range",
                filler
            )));
        }
        self.fill_buffer(length)?;

        let mut data = Vec::new();
        let mut candidate = Code::new();
        while self.buffer.has_bits(filler) {
            candidate.push(self.buffer.pop_bit()?);
            if candidate.len() > MAX_CODE_BITS {
                return Err(DefishError::code_too_long(candidate.len(), MAX_CODE_BITS));
            }
            if codes.contains(&candidate) {
                data.push(candidate.clone());
                candidate.clear();
            }
        }
        if !candidate.is_empty() {
            return Err(DefishError::corrupted(
                "data section ends in the middle of a code",
            ));
        }
        self.buffer.discard_out_bits();
        Ok(data)
    }

    fn read_block(&mut self) -> Result<Option<HuffmanBlock>> {
        let table_length = match self.read_u32(true)? {
            Some(length) => length as usize,
            None => return Ok(None),
        };
        let table = self.read_code_table(table_length)?;
        let codes: HashSet<Code> = table.iter().map(|(_, code)| code.clone()).collect();
        let data = self.read_data(&codes)?;
        Ok(Some(HuffmanBlock { table, data }))
    }
}

impl<I> Iterator for BlockDecoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    type Item = Result<HuffmanBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{HuffmanDecoder, HuffmanEncoder};

    fn code(bits: &[u8]) -> Code {
        bits.iter().map(|&b| b != 0).collect()
    }

    fn encode_to_bytes(blocks: Vec<HuffmanBlock>) -> Vec<u8> {
        BlockEncoder::new(blocks.into_iter().map(Ok))
            .collect::<Result<_>>()
            .unwrap()
    }

    fn full_roundtrip(data: &[u8], block_len: usize) -> Vec<u8> {
        let encoder = HuffmanEncoder::new(data.iter().copied().map(Ok), block_len).unwrap();
        let bytes = BlockEncoder::new(encoder);
        HuffmanDecoder::new(BlockDecoder::new(bytes))
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_single_symbol_block_layout() {
        // One 'a' with the forced one-bit code 0.
        let block = HuffmanBlock {
            table: vec![(b'a', code(&[0]))],
            data: vec![code(&[0])],
        };
        let bytes = encode_to_bytes(vec![block]);
        assert_eq!(
            bytes,
            vec![
                0, 0, 0, 3, // table length
                b'a', 1, 0x00, // symbol, code bits, padded code
                0, 0, 0, 1, // data length
                7,    // filler bits
                0x00, // one 0 bit + 7 filler
            ]
        );
    }

    #[test]
    fn test_code_record_padding_is_per_record() {
        // Two symbols with 1-bit codes: each table record is 3 bytes.
        let block = HuffmanBlock {
            table: vec![(b'a', code(&[0])), (b'b', code(&[1]))],
            data: vec![code(&[0]), code(&[1])],
        };
        let bytes = encode_to_bytes(vec![block]);
        assert_eq!(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 6);
        assert_eq!(&bytes[4..7], &[b'a', 1, 0x00]);
        assert_eq!(&bytes[7..10], &[b'b', 1, 0x01]);
    }

    #[test]
    fn test_wire_roundtrip_preserves_blocks() {
        let data = b"mississippi river mississippi delta".to_vec();
        let blocks: Vec<HuffmanBlock> =
            HuffmanEncoder::new(data.iter().copied().map(Ok), 8)
                .unwrap()
                .collect::<Result<_>>()
                .unwrap();
        let bytes = encode_to_bytes(blocks.clone());
        let parsed: Vec<HuffmanBlock> =
            BlockDecoder::new(bytes.iter().copied().map(Ok))
                .collect::<Result<_>>()
                .unwrap();
        assert_eq!(parsed, blocks);
    }

    #[test]
    fn test_full_roundtrip() {
        let data: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        for block_len in [1, 7, 256, 10000] {
            assert_eq!(full_roundtrip(&data, block_len), data, "block {}", block_len);
        }
    }

    #[test]
    fn test_empty_stream_yields_no_blocks() {
        let mut decoder = BlockDecoder::new(std::iter::empty::<Result<u8>>());
        assert!(decoder.next().is_none());
    }

    #[test]
    fn test_truncated_table_length_is_eof() {
        let mut decoder = BlockDecoder::new([0u8, 0].into_iter().map(Ok));
        assert!(matches!(
            decoder.next(),
            Some(Err(DefishError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_truncated_table_body_is_eof() {
        // Table claims 3 bytes but only 1 follows.
        let mut decoder = BlockDecoder::new([0u8, 0, 0, 3, b'a'].into_iter().map(Ok));
        assert!(matches!(
            decoder.next(),
            Some(Err(DefishError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_non_prefix_free_table_rejected() {
        // Codes 0 and 01: the first prefixes the second.
        let block = HuffmanBlock {
            table: vec![(b'a', code(&[0])), (b'b', code(&[0, 1]))],
            data: vec![code(&[0])],
        };
        let bytes = encode_to_bytes(vec![block]);
        let mut decoder = BlockDecoder::new(bytes.into_iter().map(Ok));
        assert!(matches!(
            decoder.next(),
            Some(Err(DefishError::Corrupted { .. }))
        ));
    }

    #[test]
    fn test_zero_length_code_rejected_by_decoder() {
        // Hand-built table record with code_bits = 0.
        let bytes = vec![0, 0, 0, 2, b'a', 0];
        let mut decoder = BlockDecoder::new(bytes.into_iter().map(Ok));
        assert!(matches!(
            decoder.next(),
            Some(Err(DefishError::Corrupted { .. }))
        ));
    }

    #[test]
    fn test_unresolvable_data_bits_rejected() {
        // Valid table {a: 1x0...}, data bits that never complete a code.
        let block = HuffmanBlock {
            table: vec![(b'a', code(&[1, 0])), (b'b', code(&[1, 1]))],
            data: vec![code(&[1, 0])],
        };
        let mut bytes = encode_to_bytes(vec![block]);
        // Flip the data byte so it starts with a 0 bit: candidates grow
        // 0, 00, 000... and never match.
        let data_byte = bytes.len() - 1;
        bytes[data_byte] = 0x00;
        let mut decoder = BlockDecoder::new(bytes.into_iter().map(Ok));
        assert!(matches!(
            decoder.next(),
            Some(Err(DefishError::Corrupted { .. }))
        ));
    }

    #[test]
    fn test_filler_out_of_range_rejected() {
        let bytes = vec![
            0, 0, 0, 3, b'a', 1, 0x00, // table
            0, 0, 0, 1, 9, 0x00, // filler 9 is invalid
        ];
        let mut decoder = BlockDecoder::new(bytes.into_iter().map(Ok));
        assert!(matches!(
            decoder.next(),
            Some(Err(DefishError::Corrupted { .. }))
        ));
    }
}
