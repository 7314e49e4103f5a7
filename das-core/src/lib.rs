//! Shared primitives for the DAS asset pipeline: the chunked ASCII line
//! reader (C1), the URI resolver (C2) and the base64 decoder (C3), plus the
//! error taxonomy that format-specific crates build on.

mod base64;
mod error;
mod kmp;
mod line_reader;
mod uri;

pub use base64::Base64Decoder;
pub use error::{Error, Result, Severity};
pub use kmp::find as kmp_find;
pub use line_reader::{LineBounds, LineReader};
pub use uri::{ExtensionHint, ResolvedUri, UriResolver};
