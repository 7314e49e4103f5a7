use thiserror::Error;

/// Severity requested by a caller for a URI that cannot be resolved.
///
/// Mirrors the `UnresolvedUriSeverity` knob from the original resolver: a
/// warning degrades to an empty buffer, an error aborts the whole parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Errors shared by the chunked line reader, URI resolver and base64 decoder.
///
/// Format-specific crates (`das-format`, `das-obj`, `das-stl`, `das-gltf`)
/// wrap this with `#[from]` rather than duplicating the I/O-adjacent
/// variants.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("reached end of input before the current scope/statement was complete")]
    UnexpectedEof,

    #[error("could not resolve URI `{uri}`")]
    UnresolvedUri { uri: String },

    #[error("malformed URI `{uri}`: {reason}")]
    MalformedUri { uri: String, reason: String },

    #[error("invalid base64 byte {byte:#04x} at index {index}")]
    InvalidBase64 { index: usize, byte: u8 },

    #[error("could not open file `{path}`")]
    InvalidFile { path: String },
}

pub type Result<T> = std::result::Result<T, Error>;
