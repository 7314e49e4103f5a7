//! Error taxonomy for the DAS container writer/reader (C6/C7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DasError {
    #[error(transparent)]
    Core(#[from] das_core::Error),

    #[error(transparent)]
    Huffman(#[from] das_huffman::HuffmanError),

    #[error("not a DAS file: bad magic signature")]
    InvalidSignature,

    #[error("file length {actual} does not match the expected {expected}")]
    InvalidDataLength { expected: usize, actual: usize },

    #[error("invalid value for `{slot}`")]
    InvalidValue { slot: String },

    #[error("unknown scope or value keyword `{0}`")]
    InvalidKeyword(String),

    #[error("scope `{0}` ended before all required values were read")]
    IncompleteScope(String),

    #[error("expected ENDSCOPE, found `{0}`")]
    UnexpectedEndStatement(String),

    #[error("scope `{0}` was closed more than once")]
    ScopeAlreadyClosed(String),

    #[error("buffer id {0} is out of range")]
    InvalidBufferId(u32),
}

pub type Result<T> = std::result::Result<T, DasError>;
