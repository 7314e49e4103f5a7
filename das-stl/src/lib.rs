//! STL parser (ASCII and binary) and STL→DAS compiler (C8/C9 §4.9.2).

mod ascii;
mod binary;
mod compiler;
mod error;
pub mod model;

pub use compiler::compile;
pub use error::{Result, StlError};
pub use model::StlModel;

/// Binary STL files may legally begin with the ASCII bytes `"solid"` in
/// their 80-byte header, so the reliable discriminant is whether the
/// declared binary facet count at byte 80 matches the file's actual
/// length; ASCII STL is the fallback when it plainly does not.
pub fn parse(path: &str, bytes: &[u8]) -> Result<StlModel> {
    if looks_binary(bytes) {
        return binary::parse(path, bytes);
    }
    let text = String::from_utf8_lossy(bytes);
    ascii::parse(path, &text)
}

fn looks_binary(bytes: &[u8]) -> bool {
    const HEADER_LEN: usize = 80;
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    if !bytes.starts_with(b"solid") {
        return true;
    }
    let facet_count = u32::from_le_bytes(bytes[HEADER_LEN..HEADER_LEN + 4].try_into().unwrap());
    let expected = HEADER_LEN + 4 + 50 * facet_count as usize;
    bytes.len() == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ascii_stl_even_with_solid_prefix() {
        let text = b"solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n";
        assert!(!looks_binary(text));
    }
}
