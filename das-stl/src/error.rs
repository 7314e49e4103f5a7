//! Error taxonomy for the STL parser and compiler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StlError {
    #[error("{path}:{line}: unknown keyword `{keyword}`")]
    InvalidKeyword { path: String, line: usize, keyword: String },

    #[error("{path}:{line}: not enough attributes for `{keyword}` (got {got}, need {need})")]
    NotEnoughAttributes {
        path: String,
        line: usize,
        keyword: String,
        got: usize,
        need: usize,
    },

    #[error("{path}:{line}: too many attributes for `{keyword}` (got {got}, expected {max})")]
    TooManyAttributes {
        path: String,
        line: usize,
        keyword: String,
        got: usize,
        max: usize,
    },

    #[error("{path}:{line}: invalid argument `{value}` for `{keyword}`")]
    InvalidArgument {
        path: String,
        line: usize,
        keyword: String,
        value: String,
    },

    #[error("{path}: facet has {got} vertices, expected exactly 3")]
    FacetVertexCount { path: String, got: usize },

    #[error("{path}: binary STL length {actual} does not match expected {expected} for {facet_count} facets")]
    InvalidDataLength {
        path: String,
        expected: usize,
        actual: usize,
        facet_count: u32,
    },
}

pub type Result<T> = std::result::Result<T, StlError>;
