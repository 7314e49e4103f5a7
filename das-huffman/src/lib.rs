//! Frequency-tabled Huffman codec (C4): the DAS container's optional
//! compression layer for buffer payloads.

mod bitshift;
mod codec;
mod error;
mod huffman;

pub use codec::{decode, encode};
pub use error::{HuffmanError, Result};
pub use huffman::{assign_codes, build_tree, BinKey, Node, MAX_KEY_BYTES};
