//! CLI-level error wrapping: maps every pipeline error kind to the numeric
//! exit code the spec's external interface contracts on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] das_core::Error),
    #[error(transparent)]
    Format(#[from] das_format::DasError),
    #[error(transparent)]
    Obj(#[from] das_obj::ObjError),
    #[error(transparent)]
    Stl(#[from] das_stl::StlError),
    #[error(transparent)]
    Gltf(#[from] das_gltf::GltfError),
    #[error("unsupported input extension `{0}`")]
    UnsupportedExtension(String),
    #[error("{0}")]
    Io(String),
}

impl CliError {
    /// Exit codes are the 1-based position of the error's kind inside the
    /// taxonomy table (see spec §7); unmapped "generic I/O" and
    /// CLI-only failures get the highest reserved code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(err) => core_exit_code(err),
            CliError::Format(err) => format_exit_code(err),
            CliError::Obj(_) => 10,
            CliError::Stl(_) => 11,
            CliError::Gltf(_) => 12,
            CliError::UnsupportedExtension(_) => 20,
            CliError::Io(_) => 21,
        }
    }
}

fn core_exit_code(err: &das_core::Error) -> i32 {
    use das_core::Error::*;
    match err {
        InvalidFile { .. } => 21,
        UnexpectedEof => 1,
        UnresolvedUri { .. } => 2,
        MalformedUri { .. } => 3,
        InvalidBase64 { .. } => 4,
        _ => 1,
    }
}

fn format_exit_code(err: &das_format::DasError) -> i32 {
    use das_format::DasError::*;
    match err {
        InvalidSignature => 5,
        InvalidDataLength { .. } => 6,
        InvalidValue { .. } => 7,
        InvalidKeyword(_) => 8,
        IncompleteScope(_) => 9,
        UnexpectedEndStatement(_) => 9,
        ScopeAlreadyClosed(_) => 9,
        InvalidBufferId(_) => 7,
        Core(inner) => core_exit_code(inner),
        Huffman(_) => 13,
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
