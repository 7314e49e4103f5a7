//! The `BUFFERTYPE` bitset tag carried by every [`crate::model::Buffer`].
//!
//! The original format has no bitset type of its own; this is modelled the
//! way `gfx-rs`'s `hal::buffer::Usage`/`hal::image` flags are, as a
//! `bitflags!`-generated newtype over the on-disk `u16`.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufferType: u16 {
        const VERTEX         = 1 << 0;
        const TEXTURE_UV     = 1 << 1;
        const VERTEX_NORMAL  = 1 << 2;
        const VERTEX_TANGENT = 1 << 3;
        const INDICES        = 1 << 4;
        const JOINTS         = 1 << 5;
        const WEIGHTS        = 1 << 6;
        const KEYFRAME       = 1 << 7;
        const TIMESTAMPS     = 1 << 8;
        const PNG            = 1 << 9;
        const JPEG           = 1 << 10;
        const TGA            = 1 << 11;
        const BMP            = 1 << 12;
        const PPM            = 1 << 13;
        const RAW            = 1 << 14;
    }
}

impl From<das_texture::TextureKind> for BufferType {
    fn from(kind: das_texture::TextureKind) -> Self {
        match kind {
            das_texture::TextureKind::Png => BufferType::PNG,
            das_texture::TextureKind::Jpeg => BufferType::JPEG,
            das_texture::TextureKind::Bmp => BufferType::BMP,
            das_texture::TextureKind::Ppm => BufferType::PPM,
            das_texture::TextureKind::Tga => BufferType::TGA,
            das_texture::TextureKind::Raw => BufferType::RAW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_query() {
        let ty = BufferType::VERTEX | BufferType::VERTEX_NORMAL;
        assert!(ty.contains(BufferType::VERTEX));
        assert!(ty.contains(BufferType::VERTEX_NORMAL));
        assert!(!ty.contains(BufferType::INDICES));
    }

    #[test]
    fn texture_kind_maps_to_one_flag() {
        let ty: BufferType = das_texture::TextureKind::Png.into();
        assert_eq!(ty, BufferType::PNG);
    }
}
