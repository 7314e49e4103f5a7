//! Binary STL: 80-byte header, `u32` facet count (LE), then `facet_count`
//! fixed 50-byte records (12-byte normal + 3×12-byte vertex + 2-byte
//! attribute byte count, ignored).

use glam::Vec3;

use crate::error::{Result, StlError};
use crate::model::{Facet, Solid, StlModel};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

pub fn parse(path: &str, bytes: &[u8]) -> Result<StlModel> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(StlError::InvalidDataLength {
            path: path.into(),
            expected: HEADER_LEN + 4,
            actual: bytes.len(),
            facet_count: 0,
        });
    }

    let facet_count = u32::from_le_bytes(bytes[HEADER_LEN..HEADER_LEN + 4].try_into().unwrap());
    let expected = HEADER_LEN + 4 + RECORD_LEN * facet_count as usize;
    if bytes.len() != expected {
        return Err(StlError::InvalidDataLength {
            path: path.into(),
            expected,
            actual: bytes.len(),
            facet_count,
        });
    }

    let mut facets = Vec::with_capacity(facet_count as usize);
    let mut offset = HEADER_LEN + 4;
    for _ in 0..facet_count {
        let normal = read_vec3(&bytes[offset..offset + 12]);
        let v0 = read_vec3(&bytes[offset + 12..offset + 24]);
        let v1 = read_vec3(&bytes[offset + 24..offset + 36]);
        let v2 = read_vec3(&bytes[offset + 36..offset + 48]);
        facets.push(Facet {
            normal,
            vertices: [v0, v1, v2],
        });
        offset += RECORD_LEN;
    }

    Ok(StlModel {
        solids: vec![Solid {
            name: String::new(),
            facets,
        }],
    })
}

fn read_vec3(bytes: &[u8]) -> Vec3 {
    let x = f32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let y = f32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let z = f32::from_le_bytes(bytes[8..12].try_into().unwrap());
    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let mut out = vec![0u8; HEADER_LEN];
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&[0.0f32, 0.0, 1.0].map(f32::to_le_bytes).concat());
        out.extend_from_slice(&[0.0f32, 0.0, 0.0].map(f32::to_le_bytes).concat());
        out.extend_from_slice(&[1.0f32, 0.0, 0.0].map(f32::to_le_bytes).concat());
        out.extend_from_slice(&[0.0f32, 1.0, 0.0].map(f32::to_le_bytes).concat());
        out.extend_from_slice(&[0u8; 2]);
        out
    }

    #[test]
    fn parses_single_facet() {
        let bytes = sample_bytes();
        let model = parse("t.stl", &bytes).unwrap();
        assert_eq!(model.solids.len(), 1);
        assert_eq!(model.solids[0].facets.len(), 1);
        assert_eq!(model.solids[0].facets[0].normal, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut bytes = sample_bytes();
        bytes.push(0);
        assert!(matches!(
            parse("t.stl", &bytes),
            Err(StlError::InvalidDataLength { .. })
        ));
    }
}
