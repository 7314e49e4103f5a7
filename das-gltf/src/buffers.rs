//! Resolves every glTF `buffers[]` entry to its raw bytes via the shared
//! URI resolver (C2): `file://`, `data:...;base64,`, or a plain relative
//! path rooted at the document's directory.

use std::path::Path;

use das_core::{Severity, UriResolver};

use crate::error::{GltfError, Result};
use crate::root::GLTFRoot;

pub fn resolve_buffers(path: &str, root: &GLTFRoot, root_dir: &Path) -> Result<Vec<Vec<u8>>> {
    let resolver = UriResolver::new();
    let mut out = Vec::with_capacity(root.buffers.len());
    for (index, buffer) in root.buffers.iter().enumerate() {
        let uri = buffer.uri.as_deref().ok_or_else(|| GltfError::MissingField {
            path: path.into(),
            context: format!("buffer {index}"),
            field: "uri".into(),
        })?;
        let resolved = resolver.resolve(uri, root_dir, Severity::Error)?;
        out.push(resolved.bytes);
    }
    Ok(out)
}
