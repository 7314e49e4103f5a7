//! Texture probe (C5): classifies image bytes by signature, falling back to
//! a filename extension or MIME string when the signature is inconclusive.

/// Codec tag a probed texture resolves to. `Raw` covers anything the probe
/// can't identify, matching the original's fallback to an undecoded blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Jpeg,
    Png,
    Bmp,
    Ppm,
    Tga,
    Raw,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
const BMP_SIGNATURE: [u8; 2] = *b"BM";

/// Classifies `bytes` by magic signature first (JPEG/PNG/BMP/PPM), then
/// falls back to `extension`. TGA has no reliable signature in the formats
/// this engine cares about, so it is recognised by extension only.
pub fn probe_bytes(bytes: &[u8], extension: Option<&str>) -> TextureKind {
    if bytes.starts_with(&PNG_SIGNATURE) {
        return TextureKind::Png;
    }
    if bytes.starts_with(&JPEG_SIGNATURE) {
        return TextureKind::Jpeg;
    }
    if bytes.starts_with(&BMP_SIGNATURE) {
        return TextureKind::Bmp;
    }
    if is_ppm_signature(bytes) {
        return TextureKind::Ppm;
    }
    match extension.map(|e| e.trim_start_matches('.').to_ascii_lowercase()) {
        Some(ref e) if e == "tga" => TextureKind::Tga,
        Some(ref e) if e == "ppm" || e == "pnm" => TextureKind::Ppm,
        _ => {
            log::debug!("texture probe found no recognised signature or extension, tagging as raw");
            TextureKind::Raw
        }
    }
}

/// Classifies an inline (e.g. glTF `data:`) image by its declared MIME type.
pub fn probe_mime(mime: &str) -> TextureKind {
    match mime {
        "image/jpeg" => TextureKind::Jpeg,
        "image/png" => TextureKind::Png,
        "image/bmp" => TextureKind::Bmp,
        _ => {
            log::debug!("texture probe saw unrecognised MIME type `{mime}`, tagging as raw");
            TextureKind::Raw
        }
    }
}

/// PPM/PGM/PBM headers start with `P` followed by an ASCII digit `1`-`6`.
fn is_ppm_signature(bytes: &[u8]) -> bool {
    matches!(bytes, [b'P', digit, ..] if (b'1'..=b'6').contains(digit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_png_signature() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"...");
        assert_eq!(probe_bytes(&bytes, None), TextureKind::Png);
    }

    #[test]
    fn recognises_jpeg_signature() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0];
        assert_eq!(probe_bytes(&bytes, None), TextureKind::Jpeg);
    }

    #[test]
    fn recognises_bmp_signature() {
        let bytes = b"BM\x46\x00\x00\x00";
        assert_eq!(probe_bytes(bytes, None), TextureKind::Bmp);
    }

    #[test]
    fn recognises_ppm_signature() {
        let bytes = b"P6\n4 4\n255\n";
        assert_eq!(probe_bytes(bytes, None), TextureKind::Ppm);
    }

    #[test]
    fn falls_back_to_tga_extension() {
        let bytes = [0u8; 18];
        assert_eq!(probe_bytes(&bytes, Some("tga")), TextureKind::Tga);
    }

    #[test]
    fn unrecognised_bytes_without_extension_are_raw() {
        let bytes = [1, 2, 3, 4];
        assert_eq!(probe_bytes(&bytes, None), TextureKind::Raw);
    }

    #[test]
    fn mime_type_maps_to_codec_tag() {
        assert_eq!(probe_mime("image/png"), TextureKind::Png);
        assert_eq!(probe_mime("image/jpeg"), TextureKind::Jpeg);
        assert_eq!(probe_mime("application/octet-stream"), TextureKind::Raw);
    }
}
