//! On-disk container format and the encode/decode entry points (C4).
//!
//! Layout: `"HUF\0"` magic, `u32` original size, `u16` frequency table
//! length, that many `(u8 symbol, u32 freq)` pairs, then the MSB-first
//! bitstream padded with zero bits to a whole byte.

use crate::error::{HuffmanError, Result};
use crate::huffman::{assign_codes, build_tree, BinKey, Node};

const MAGIC: [u8; 4] = *b"HUF\0";

/// Encodes `data` into the container format. Empty input encodes to a
/// header-only stream (no frequency table, no bitstream).
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());

    if data.is_empty() {
        out.extend_from_slice(&0u16.to_le_bytes());
        return out;
    }

    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let entries: Vec<(u8, u32)> = freq
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(symbol, &count)| (symbol as u8, count))
        .collect();

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (symbol, count) in &entries {
        out.push(*symbol);
        out.extend_from_slice(&count.to_le_bytes());
    }

    let tree = build_tree(&freq).expect("non-empty input yields a non-empty frequency table");
    let codes = assign_codes(&tree);

    let mut writer = BitWriter::new();
    for &byte in data {
        let key = codes[byte as usize].expect("every input byte has an assigned code");
        writer.write_code(&key);
    }
    out.extend_from_slice(&writer.finish());

    out
}

/// Decodes a container produced by [`encode`], walking the rebuilt tree bit
/// by bit until `original_size` bytes have been emitted.
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    if input.len() < 10 {
        return Err(HuffmanError::TruncatedHeader);
    }
    if input[0..4] != MAGIC {
        return Err(HuffmanError::BadMagic);
    }
    let original_size = u32::from_le_bytes(input[4..8].try_into().unwrap());
    let entry_count = u16::from_le_bytes(input[8..10].try_into().unwrap()) as usize;

    if original_size == 0 {
        return Ok(Vec::new());
    }
    if entry_count == 0 {
        return Err(HuffmanError::EmptyFrequencyTable);
    }

    let mut offset = 10usize;
    let mut freq = [0u32; 256];
    for _ in 0..entry_count {
        let entry = input
            .get(offset..offset + 5)
            .ok_or(HuffmanError::TruncatedHeader)?;
        let symbol = entry[0];
        let count = u32::from_le_bytes(entry[1..5].try_into().unwrap());
        freq[symbol as usize] = count;
        offset += 5;
    }

    let tree = build_tree(&freq).ok_or(HuffmanError::EmptyFrequencyTable)?;
    let bitstream = &input[offset..];

    let mut out = Vec::with_capacity(original_size as usize);
    let mut reader = BitReader::new(bitstream);

    if let Node::Leaf(symbol) = &tree {
        // Sole-symbol stream: every emitted bit (by construction, always 0)
        // decodes straight back to that one symbol.
        for _ in 0..original_size {
            reader.next_bit().ok_or(HuffmanError::CorruptEncoding {
                expected: original_size,
                actual: out.len() as u32,
            })?;
            out.push(*symbol);
        }
        return Ok(out);
    }

    while out.len() < original_size as usize {
        let mut node = &tree;
        loop {
            match node {
                Node::Leaf(symbol) => {
                    out.push(*symbol);
                    break;
                }
                Node::Internal(left, right) => {
                    let bit = reader.next_bit().ok_or(HuffmanError::CorruptEncoding {
                        expected: original_size,
                        actual: out.len() as u32,
                    })?;
                    node = if bit == 0 { left } else { right };
                }
            }
        }
    }

    Ok(out)
}

struct BitWriter {
    bytes: Vec<u8>,
    bit_pos: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_pos: 0,
        }
    }

    fn write_bit(&mut self, bit: u8) {
        if self.bit_pos == 0 {
            self.bytes.push(0);
        }
        if bit != 0 {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - self.bit_pos);
        }
        self.bit_pos = (self.bit_pos + 1) % 8;
    }

    /// Emits a code's significant bits, most significant first.
    fn write_code(&mut self, key: &BinKey) {
        for i in (0..key.used_bits).rev() {
            let byte_index = (i / 8) as usize;
            let bit_index = i % 8;
            let byte = key.bytes[key.bytes.len() - 1 - byte_index];
            let bit = (byte >> bit_index) & 1;
            self.write_bit(bit);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    byte_index: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            byte_index: 0,
            bit_pos: 0,
        }
    }

    fn next_bit(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.byte_index)?;
        let bit = (byte >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_index += 1;
        }
        Some(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_round_trips() {
        let encoded = encode(&[]);
        assert_eq!(decode(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_byte_round_trips() {
        let encoded = encode(&[0x41]);
        assert_eq!(decode(&encoded).unwrap(), vec![0x41]);
    }

    #[test]
    fn repeated_single_symbol_round_trips() {
        let data = vec![0x41u8; 1000];
        let encoded = encode(&data);
        // Header: 4 magic + 4 size + 2 entry count + 5 for one entry = 15,
        // then 1000 one-bit codes packed 8-to-a-byte = 125 bytes.
        assert_eq!(encoded.len(), 15 + 125);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn mixed_frequency_data_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog, repeatedly, many times over.";
        let encoded = encode(data);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut encoded = encode(b"hello");
        encoded[0] = b'X';
        assert!(matches!(decode(&encoded), Err(HuffmanError::BadMagic)));
    }

    #[test]
    fn decode_rejects_truncated_stream() {
        let encoded = encode(b"hello world");
        let truncated = &encoded[..encoded.len() - 2];
        assert!(matches!(
            decode(truncated),
            Err(HuffmanError::CorruptEncoding { .. })
        ));
    }
}
