//! Error taxonomy for the OBJ parser and compiler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("{path}:{line}: unknown keyword `{keyword}`")]
    InvalidKeyword { path: String, line: usize, keyword: String },

    #[error("{path}:{line}: not enough attributes for `{keyword}` (got {got}, need at least {need})")]
    NotEnoughAttributes {
        path: String,
        line: usize,
        keyword: String,
        got: usize,
        need: usize,
    },

    #[error("{path}:{line}: too many attributes for `{keyword}` (got {got}, expected at most {max})")]
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

    #[error("{path}:{line}: statement continues past end of file")]
    IncompleteNewline { path: String, line: usize },

    #[error("face at {path}:{line} references {kind} index {index} but only {seen} have been seen")]
    InvalidValue {
        path: String,
        line: usize,
        kind: &'static str,
        index: i64,
        seen: usize,
    },
}

pub type Result<T> = std::result::Result<T, ObjError>;
