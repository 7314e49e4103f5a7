//! STL→DAS compiler (C9 §4.9.2): one `MeshPrimitive` per solid, vertex
//! positions and normals deduplicated by raw bit pattern into a single
//! 32-bit index stream.

use std::collections::HashMap;

use das_format::model::{BufferRef, DasModel, Mesh, MeshPrimitive, Node, Properties, Scene};
use das_format::BufferType;
use glam::Vec3;

use crate::error::Result;
use crate::model::{Facet, Solid, StlModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: [u32; 3],
    normal: [u32; 3],
}

fn key_of(position: Vec3, normal: Vec3) -> VertexKey {
    VertexKey {
        position: [position.x.to_bits(), position.y.to_bits(), position.z.to_bits()],
        normal: [normal.x.to_bits(), normal.y.to_bits(), normal.z.to_bits()],
    }
}

pub fn compile(stl: &StlModel, _path: &str, properties: Properties) -> Result<DasModel> {
    let mut model = DasModel::new(properties);
    let mut node_ids = Vec::new();

    for solid in &stl.solids {
        let primitive_id = compile_solid(&mut model, solid);
        let mesh_id = model.meshes.len() as u32;
        model.meshes.push(Mesh {
            name: solid.name.clone(),
            primitive_ids: vec![primitive_id],
        });
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

fn compile_solid(model: &mut DasModel, solid: &Solid) -> u32 {
    let mut unique: HashMap<VertexKey, u32> = HashMap::new();
    let mut order: Vec<VertexKey> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for facet in &solid.facets {
        for vertex in &facet.vertices {
            let key = key_of(*vertex, facet.normal);
            let index = *unique.entry(key).or_insert_with(|| {
                let id = order.len() as u32;
                order.push(key);
                id
            });
            indices.push(index);
        }
    }

    let mut positions = Vec::with_capacity(order.len() * 3 * 4);
    let mut normals = Vec::with_capacity(order.len() * 3 * 4);
    for key in &order {
        positions.extend_from_slice(&f32::from_bits(key.position[0]).to_le_bytes());
        positions.extend_from_slice(&f32::from_bits(key.position[1]).to_le_bytes());
        positions.extend_from_slice(&f32::from_bits(key.position[2]).to_le_bytes());
        normals.extend_from_slice(&f32::from_bits(key.normal[0]).to_le_bytes());
        normals.extend_from_slice(&f32::from_bits(key.normal[1]).to_le_bytes());
        normals.extend_from_slice(&f32::from_bits(key.normal[2]).to_le_bytes());
    }
    let index_bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();

    let position_buffer_id = model.push_buffer(BufferType::VERTEX, positions);
    let normal_buffer_id = model.push_buffer(BufferType::VERTEX_NORMAL, normals);
    let index_buffer_id = model.push_buffer(BufferType::INDICES, index_bytes);

    let primitive = MeshPrimitive {
        index_buffer: Some(BufferRef {
            buffer_id: index_buffer_id,
            byte_offset: 0,
        }),
        indices_count: indices.len() as u32,
        vertex_buffer: BufferRef {
            buffer_id: position_buffer_id,
            byte_offset: 0,
        },
        vertex_normal_buffer: Some(BufferRef {
            buffer_id: normal_buffer_id,
            byte_offset: 0,
        }),
        ..Default::default()
    };

    let primitive_id = model.mesh_primitives.len() as u32;
    model.mesh_primitives.push(primitive);
    primitive_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::parse;

    #[test]
    fn compiles_single_triangle_solid() {
        let text = "solid t\n\
            facet normal 0 0 1\n\
            outer loop\n\
            vertex 0 0 0\n\
            vertex 1 0 0\n\
            vertex 0 1 0\n\
            endloop\n\
            endfacet\n\
            endsolid t\n";
        let stl = parse("t.stl", text).unwrap();
        let model = compile(&stl, "t.stl", Properties::default()).unwrap();

        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.mesh_primitives.len(), 1);
        assert_eq!(model.mesh_primitives[0].indices_count, 3);

        let position_buffer_id = model.mesh_primitives[0].vertex_buffer.buffer_id;
        assert_eq!(model.buffers[position_buffer_id as usize].data.len(), 3 * 3 * 4);

        let index_buffer_id = model.mesh_primitives[0].index_buffer.unwrap().buffer_id;
        assert_eq!(model.buffers[index_buffer_id as usize].data.len(), 3 * 4);

        let normal_buffer_id = model.mesh_primitives[0].vertex_normal_buffer.unwrap().buffer_id;
        assert_eq!(model.buffers[normal_buffer_id as usize].data.len(), 3 * 3 * 4);

        assert_eq!(model.scenes[0].roots.len(), 1);
    }
}
