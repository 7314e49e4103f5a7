//! Per-vertex attribute gathering shared by primitive attributes (§4.9.3
//! Step 4) and morph target deltas (Step 6): casts every accessor to the
//! canonical DAS type and assembles one [`GenericVertexAttribute`] per
//! vertex.

use std::collections::BTreeMap;

use das_format::model::GenericVertexAttribute;
use glam::{Vec2, Vec3, Vec4};

use crate::accessor::read_floats;
use crate::error::Result;
use crate::root::GLTFRoot;

/// Parallel per-vertex streams for one attribute set (a primitive's
/// `attributes` or one of its `targets[]` entries).
#[derive(Debug, Clone, Default)]
pub struct AttributeStreams {
    pub count: usize,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tangents: Option<Vec<Vec4>>,
    pub uv_sets: Vec<Vec<Vec2>>,
    pub color_sets: Vec<Vec<Vec4>>,
    pub joint_sets: Vec<Vec<[u16; 4]>>,
    pub weight_sets: Vec<Vec<Vec4>>,
}

pub fn extract_streams(path: &str, root: &GLTFRoot, buffers: &[Vec<u8>], attributes: &BTreeMap<String, usize>) -> Result<AttributeStreams> {
    let position_accessor = *attributes.get("POSITION").unwrap_or(&usize::MAX);
    let positions = if position_accessor != usize::MAX {
        to_vec3(read_floats(path, root, buffers, position_accessor)?)
    } else {
        Vec::new()
    };
    let count = positions.len();

    let normals = attributes
        .get("NORMAL")
        .map(|&i| read_floats(path, root, buffers, i).map(to_vec3))
        .transpose()?;
    let tangents = attributes
        .get("TANGENT")
        .map(|&i| read_floats(path, root, buffers, i).map(to_vec4))
        .transpose()?;

    let uv_sets = numbered_sets(attributes, "TEXCOORD_")
        .map(|i| read_floats(path, root, buffers, i).map(to_vec2))
        .collect::<Result<Vec<_>>>()?;
    let color_sets = numbered_sets(attributes, "COLOR_")
        .map(|i| read_floats(path, root, buffers, i).map(to_vec4))
        .collect::<Result<Vec<_>>>()?;
    let joint_sets = numbered_sets(attributes, "JOINTS_")
        .map(|i| read_floats(path, root, buffers, i).map(to_joint_indices))
        .collect::<Result<Vec<_>>>()?;
    let weight_sets = numbered_sets(attributes, "WEIGHTS_")
        .map(|i| read_floats(path, root, buffers, i).map(to_vec4))
        .collect::<Result<Vec<_>>>()?;

    Ok(AttributeStreams {
        count,
        positions,
        normals,
        tangents,
        uv_sets,
        color_sets,
        joint_sets,
        weight_sets,
    })
}

/// Collects the accessor index for each `PREFIX{n}` attribute, sorted by
/// `n` so set 0 is always first.
fn numbered_sets<'a>(attributes: &'a BTreeMap<String, usize>, prefix: &'a str) -> impl Iterator<Item = usize> + 'a {
    let mut matches: Vec<(u32, usize)> = attributes
        .iter()
        .filter_map(|(k, &v)| {
            k.strip_prefix(prefix)
                .and_then(|n| n.parse::<u32>().ok())
                .map(|n| (n, v))
        })
        .collect();
    matches.sort_by_key(|(n, _)| *n);
    matches.into_iter().map(|(_, v)| v)
}

fn to_vec2(floats: Vec<f32>) -> Vec<Vec2> {
    floats.chunks_exact(2).map(|c| Vec2::new(c[0], c[1])).collect()
}

fn to_vec3(floats: Vec<f32>) -> Vec<Vec3> {
    floats.chunks_exact(3).map(|c| Vec3::new(c[0], c[1], c[2])).collect()
}

fn to_vec4(floats: Vec<f32>) -> Vec<Vec4> {
    floats.chunks_exact(4).map(|c| Vec4::new(c[0], c[1], c[2], c[3])).collect()
}

fn to_joint_indices(floats: Vec<f32>) -> Vec<[u16; 4]> {
    floats
        .chunks_exact(4)
        .map(|c| [c[0] as u16, c[1] as u16, c[2] as u16, c[3] as u16])
        .collect()
}

impl AttributeStreams {
    pub fn vertex_at(&self, i: usize) -> GenericVertexAttribute {
        GenericVertexAttribute {
            pos: self.positions.get(i).copied().unwrap_or(Vec3::ZERO),
            normal: self.normals.as_ref().and_then(|v| v.get(i).copied()),
            tangent: self.tangents.as_ref().and_then(|v| v.get(i).copied()),
            uvs: self.uv_sets.iter().map(|set| set[i]).collect(),
            colors: self.color_sets.iter().map(|set| set[i]).collect(),
            joint_indices: self.joint_sets.iter().map(|set| set[i]).collect(),
            joint_weights: self.weight_sets.iter().map(|set| set[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::{Accessor, BufferView};

    fn root_with_position_accessor() -> (GLTFRoot, Vec<Vec<u8>>) {
        let mut data = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let root = GLTFRoot {
            accessors: vec![Accessor {
                buffer_view: Some(0),
                component_type: 5126,
                count: 2,
                accessor_type: "VEC3".into(),
                ..Default::default()
            }],
            buffer_views: vec![BufferView {
                buffer: 0,
                byte_length: data.len(),
                ..Default::default()
            }],
            ..Default::default()
        };
        (root, vec![data])
    }

    #[test]
    fn extracts_position_only_streams() {
        let (root, buffers) = root_with_position_accessor();
        let mut attrs = BTreeMap::new();
        attrs.insert("POSITION".to_string(), 0);
        let streams = extract_streams("t.gltf", &root, &buffers, &attrs).unwrap();
        assert_eq!(streams.count, 2);
        assert_eq!(streams.positions[1], Vec3::new(1.0, 0.0, 0.0));
        let vertex = streams.vertex_at(0);
        assert_eq!(vertex.normal, None);
    }
}
