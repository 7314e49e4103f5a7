//! OBJ→DAS compiler (C9 §4.9.1): trivial lowering, one `Mesh` with one
//! `MeshPrimitive` per OBJ group, built from four parallel re-indexed
//! buffers (positions, UVs, normals, indices).

use std::collections::HashMap;

use das_format::model::{BufferRef, DasModel, Mesh, MeshPrimitive, Node, Properties, Scene, UvSet};
use das_format::BufferType;

use crate::error::{ObjError, Result};
use crate::model::{Face, FaceVertex, ObjModel};

/// A unique, re-indexed combination of position/uv/normal indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

pub fn compile(obj: &ObjModel, path: &str, properties: Properties) -> Result<DasModel> {
    let mut model = DasModel::new(properties);
    let mut mesh_ids = Vec::new();

    for group in &obj.groups {
        if group.faces.is_empty() {
            continue;
        }

        let dominant = dominant_kind(path, group.faces.last().unwrap())?;

        let mut unique: HashMap<VertexKey, u32> = HashMap::new();
        let mut order: Vec<VertexKey> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for face in &group.faces {
            for vertex in &face.vertices {
                let key = resolve_vertex(path, vertex, dominant)?;
                let index = *unique.entry(key).or_insert_with(|| {
                    let id = order.len() as u32;
                    order.push(key);
                    id
                });
                indices.push(index);
            }
        }

        let mut positions = Vec::with_capacity(order.len() * 4 * 4);
        let mut uvs = Vec::with_capacity(order.len() * 3 * 4);
        let mut normals = Vec::with_capacity(order.len() * 3 * 4);

        for key in &order {
            let p = obj.positions[key.position];
            positions.extend_from_slice(&p.x.to_le_bytes());
            positions.extend_from_slice(&p.y.to_le_bytes());
            positions.extend_from_slice(&p.z.to_le_bytes());
            positions.extend_from_slice(&p.w.to_le_bytes());

            if let Some(uv_index) = key.uv {
                let uv = obj.uvs[uv_index];
                uvs.extend_from_slice(&uv.x.to_le_bytes());
                uvs.extend_from_slice(&uv.y.to_le_bytes());
            }
            if let Some(normal_index) = key.normal {
                let n = obj.normals[normal_index];
                normals.extend_from_slice(&n.x.to_le_bytes());
                normals.extend_from_slice(&n.y.to_le_bytes());
                normals.extend_from_slice(&n.z.to_le_bytes());
            }
        }

        let index_bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();

        let position_buffer_id = model.push_buffer(BufferType::VERTEX, positions);
        let index_buffer_id = model.push_buffer(BufferType::INDICES, index_bytes);

        let mut primitive = MeshPrimitive {
            index_buffer: Some(BufferRef {
                buffer_id: index_buffer_id,
                byte_offset: 0,
            }),
            indices_count: indices.len() as u32,
            vertex_buffer: BufferRef {
                buffer_id: position_buffer_id,
                byte_offset: 0,
            },
            ..Default::default()
        };

        if dominant.uv {
            let uv_buffer_id = model.push_buffer(BufferType::TEXTURE_UV, uvs);
            primitive.uv_sets.push(UvSet {
                buffer: BufferRef {
                    buffer_id: uv_buffer_id,
                    byte_offset: 0,
                },
                texture_id: u32::MAX,
            });
        }
        if dominant.normal {
            let normal_buffer_id = model.push_buffer(BufferType::VERTEX_NORMAL, normals);
            primitive.vertex_normal_buffer = Some(BufferRef {
                buffer_id: normal_buffer_id,
                byte_offset: 0,
            });
        }

        let primitive_id = model.mesh_primitives.len() as u32;
        model.mesh_primitives.push(primitive);

        let mesh_id = model.meshes.len() as u32;
        model.meshes.push(Mesh {
            name: group.name.clone(),
            primitive_ids: vec![primitive_id],
        });
        mesh_ids.push(mesh_id);
    }

    let mut node_ids = Vec::new();
    for mesh_id in mesh_ids {
        let node_id = model.nodes.len() as u32;
        model.nodes.push(Node {
            mesh_id: Some(mesh_id),
            ..Default::default()
        });
        node_ids.push(node_id);
    }

    model.scenes.push(Scene {
        name: "default".into(),
        node_ids,
        roots: Vec::new(),
    });
    model.derive_all_scene_roots();

    Ok(model)
}

#[derive(Debug, Clone, Copy)]
struct DominantKind {
    uv: bool,
    normal: bool,
}

/// A face's dominant index kind is read off its first vertex; OBJ faces are
/// expected to use one consistent block form (`p`, `p/t`, `p//n`, `p/t/n`)
/// across all their vertices.
fn dominant_kind(path: &str, face: &Face) -> Result<DominantKind> {
    let first = face.vertices.first().ok_or_else(|| ObjError::NotEnoughAttributes {
        path: path.into(),
        line: 0,
        keyword: "f".into(),
        got: 0,
        need: 1,
    })?;
    Ok(DominantKind {
        uv: first.uv.is_some(),
        normal: first.normal.is_some(),
    })
}

fn resolve_vertex(path: &str, vertex: &FaceVertex, dominant: DominantKind) -> Result<VertexKey> {
    if dominant.uv && vertex.uv.is_none() {
        return Err(ObjError::InvalidValue {
            path: path.into(),
            line: 0,
            kind: "uv",
            index: -1,
            seen: 0,
        });
    }
    if dominant.normal && vertex.normal.is_none() {
        return Err(ObjError::InvalidValue {
            path: path.into(),
            line: 0,
            kind: "normal",
            index: -1,
            seen: 0,
        });
    }
    Ok(VertexKey {
        position: vertex.position,
        uv: if dominant.uv { vertex.uv } else { None },
        normal: if dominant.normal { vertex.normal } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn compiles_single_triangle_with_reindexed_buffers() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let obj = parse("t.obj", text).unwrap();
        let model = compile(&obj, "t.obj", Properties::default()).unwrap();

        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.mesh_primitives.len(), 1);
        assert_eq!(model.mesh_primitives[0].indices_count, 3);

        let position_buffer_id = model.mesh_primitives[0].vertex_buffer.buffer_id;
        assert_eq!(model.buffers[position_buffer_id as usize].data.len(), 3 * 4 * 4);

        assert_eq!(model.scenes.len(), 1);
        assert_eq!(model.scenes[0].roots.len(), 1);
    }

    #[test]
    fn shared_vertices_deduplicate_into_one_entry() {
        // A quad made of two triangles sharing an edge: 4 unique positions,
        // 6 indices.
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";
        let obj = parse("t.obj", text).unwrap();
        let model = compile(&obj, "t.obj", Properties::default()).unwrap();
        assert_eq!(model.mesh_primitives[0].indices_count, 6);

        let index_buffer_id = model.mesh_primitives[0].index_buffer.unwrap().buffer_id;
        assert_eq!(model.buffers[index_buffer_id as usize].data.len(), 6 * 4);

        let position_buffer_id = model.mesh_primitives[0].vertex_buffer.buffer_id;
        assert_eq!(model.buffers[position_buffer_id as usize].data.len(), 4 * 4 * 4);
    }
}
