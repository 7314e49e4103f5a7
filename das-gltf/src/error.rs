//! Error taxonomy for glTF JSON parsing and glTF→DAS compilation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GltfError {
    #[error("{path}:{offset}: invalid JSON ({reason})")]
    InvalidJson { path: String, offset: usize, reason: String },

    #[error("{path}: required extension `{name}` is not supported")]
    UnsupportedExtension { path: String, name: String },

    #[error("{path}: invalid accessor {index} ({reason})")]
    InvalidAccessor { path: String, index: usize, reason: String },

    #[error("{path}: missing required field `{field}` on {context}")]
    MissingField { path: String, context: String, field: String },

    #[error("{path}: node graph contains a cycle at node {node}")]
    CyclicGraph { path: String, node: usize },

    #[error("{path}: mesh primitive {mesh}/{primitive} has no index accessor")]
    NonIndexedPrimitive { path: String, mesh: usize, primitive: usize },

    #[error(transparent)]
    Core(#[from] das_core::Error),

    #[error(transparent)]
    Format(#[from] das_format::DasError),
}

pub type Result<T> = std::result::Result<T, GltfError>;
