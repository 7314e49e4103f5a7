//! Error taxonomy for the Huffman codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HuffmanError {
    #[error("huffman stream is shorter than its header")]
    TruncatedHeader,
    #[error("huffman stream is missing `HUF\\0` magic")]
    BadMagic,
    #[error("huffman frequency table is empty but original size is non-zero")]
    EmptyFrequencyTable,
    #[error("huffman bitstream ended before {expected} bytes were decoded (got {actual})")]
    CorruptEncoding { expected: u32, actual: u32 },
}

pub type Result<T> = std::result::Result<T, HuffmanError>;
