//! URI resolver (C2): fetches bytes from `file://`, `data:...;base64,`,
//! percent-encoded, or flat relative-path URIs.

use std::path::{Path, PathBuf};

use crate::base64::Base64Decoder;
use crate::error::{Error, Result, Severity};

/// Coarse classification used to pick an image codec buffer-type tag once
/// bytes have been fetched; unknown extensions resolve to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionHint {
    Png,
    Jpeg,
    Bmp,
    Tga,
    Ppm,
    Unknown,
}

pub struct ResolvedUri {
    pub bytes: Vec<u8>,
    pub extension_hint: ExtensionHint,
    /// Present only for `data:` URIs, used by callers that want to honour
    /// an explicit MIME type over an extension guess (e.g. glTF images).
    pub mime_type: Option<String>,
}

pub struct UriResolver {
    decoder: Base64Decoder,
}

impl Default for UriResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl UriResolver {
    pub fn new() -> Self {
        Self {
            decoder: Base64Decoder::new(),
        }
    }

    pub fn resolve(&self, uri: &str, root_path: &Path, severity: Severity) -> Result<ResolvedUri> {
        let result = if let Some(rest) = uri.strip_prefix("data:") {
            self.resolve_data_uri(rest)
        } else if let Some(rest) = uri.strip_prefix("file://") {
            self.resolve_file_uri(rest, root_path)
        } else {
            self.resolve_plain_path(uri, root_path)
        };

        match result {
            Ok(resolved) => Ok(resolved),
            Err(err) => match severity {
                Severity::Warning => {
                    log::warn!("unresolved URI `{uri}`: {err}");
                    Ok(ResolvedUri {
                        bytes: Vec::new(),
                        extension_hint: ExtensionHint::Unknown,
                        mime_type: None,
                    })
                }
                Severity::Error => Err(Error::UnresolvedUri { uri: uri.to_string() }),
            },
        }
    }

    fn resolve_data_uri(&self, rest: &str) -> Result<ResolvedUri> {
        let (header, payload) = rest.split_once(',').ok_or_else(|| Error::MalformedUri {
            uri: format!("data:{rest}"),
            reason: "missing comma separating header from payload".into(),
        })?;

        let is_base64 = header.ends_with(";base64");
        let mime_type = header
            .strip_suffix(";base64")
            .unwrap_or(header)
            .to_string();

        let bytes = if is_base64 {
            self.decoder.decode(payload)?
        } else {
            percent_decode(payload)?
        };

        Ok(ResolvedUri {
            bytes,
            extension_hint: mime_extension_hint(&mime_type),
            mime_type: Some(mime_type),
        })
    }

    fn resolve_file_uri(&self, rest: &str, root_path: &Path) -> Result<ResolvedUri> {
        let decoded = percent_decode_path(rest)?;
        let path = if Path::new(&decoded).is_absolute() {
            PathBuf::from(decoded)
        } else {
            root_path.join(decoded)
        };
        self.read_path(&path)
    }

    fn resolve_plain_path(&self, uri: &str, root_path: &Path) -> Result<ResolvedUri> {
        let decoded = percent_decode_path(uri)?;
        let path = if Path::new(&decoded).is_absolute() {
            PathBuf::from(decoded)
        } else {
            root_path.join(decoded)
        };
        self.read_path(&path)
    }

    fn read_path(&self, path: &Path) -> Result<ResolvedUri> {
        let bytes = std::fs::read(path).map_err(|_| Error::InvalidFile {
            path: path.display().to_string(),
        })?;
        Ok(ResolvedUri {
            extension_hint: extension_hint(path),
            bytes,
            mime_type: None,
        })
    }
}

/// Decodes `%XX` percent-encoded sequences that may appear anywhere in a
/// path-like URI fragment. Non-percent bytes pass through unchanged.
fn percent_decode(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3).ok_or_else(|| Error::MalformedUri {
                uri: text.to_string(),
                reason: "truncated percent-encoded sequence".into(),
            })?;
            let value = u8::from_str_radix(std::str::from_utf8(hex).unwrap_or(""), 16)
                .map_err(|_| Error::MalformedUri {
                    uri: text.to_string(),
                    reason: format!("invalid percent-encoded byte `%{}`", String::from_utf8_lossy(hex)),
                })?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn percent_decode_path(text: &str) -> Result<String> {
    let bytes = percent_decode(text)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn extension_hint(path: &Path) -> ExtensionHint {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ref e) if e == "png" => ExtensionHint::Png,
        Some(ref e) if e == "jpg" || e == "jpeg" => ExtensionHint::Jpeg,
        Some(ref e) if e == "bmp" => ExtensionHint::Bmp,
        Some(ref e) if e == "tga" => ExtensionHint::Tga,
        Some(ref e) if e == "ppm" => ExtensionHint::Ppm,
        _ => ExtensionHint::Unknown,
    }
}

fn mime_extension_hint(mime: &str) -> ExtensionHint {
    match mime {
        "image/png" => ExtensionHint::Png,
        "image/jpeg" => ExtensionHint::Jpeg,
        "image/bmp" => ExtensionHint::Bmp,
        _ => ExtensionHint::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_base64_data_uri() {
        let resolver = UriResolver::new();
        let resolved = resolver
            .resolve(
                "data:application/octet-stream;base64,SGVsbG8=",
                Path::new("."),
                Severity::Error,
            )
            .unwrap();
        assert_eq!(resolved.bytes, b"Hello");
        assert_eq!(resolved.extension_hint, ExtensionHint::Unknown);
    }

    #[test]
    fn warning_severity_yields_empty_buffer() {
        let resolver = UriResolver::new();
        let resolved = resolver
            .resolve("file:///does/not/exist.bin", Path::new("."), Severity::Warning)
            .unwrap();
        assert!(resolved.bytes.is_empty());
    }

    #[test]
    fn error_severity_fails() {
        let resolver = UriResolver::new();
        let result = resolver.resolve("file:///does/not/exist.bin", Path::new("."), Severity::Error);
        assert!(result.is_err());
    }

    #[test]
    fn percent_encoded_path_decodes() {
        let decoded = percent_decode_path("a%20b.txt").unwrap();
        assert_eq!(decoded, "a b.txt");
    }

    #[test]
    fn malformed_percent_sequence_errors() {
        assert!(percent_decode_path("a%2").is_err());
        assert!(percent_decode_path("a%zz").is_err());
    }
}
