//! glTF→DAS compiler (C9 §4.9.3): repacks glTF's shared, strided buffers
//! into DAS's tightly packed per-attribute streams.

use std::collections::HashMap;
use std::path::Path;

use das_format::model::{
    Animation, AnimationChannel, AnimationChannelOwner, AnimationTarget, BufferRef, DasModel, Interpolation, Mesh, MeshPrimitive,
    MorphTarget, MorphTargetRef, Node, Properties, Scene, Skeleton, SkeletonJoint, UvSet,
};
use das_format::BufferType;
use glam::{Mat4, Quat, Vec3};

use crate::accessor::read_indices;
use crate::buffers::resolve_buffers;
use crate::error::{GltfError, Result};
use crate::graph::{check_no_cycles, find_common_root_joint, flag_joint_nodes, parent_map};
use crate::root::{GltfNode, GLTFRoot};
use crate::vertex::{extract_streams, AttributeStreams};

pub fn compile(path: &str, root_dir: &Path, root: &GLTFRoot, mut properties: Properties) -> Result<DasModel> {
    check_no_cycles(path, root)?;

    // Step 1: supplement properties.
    if properties.author.is_empty() {
        if let Some(generator) = &root.asset.generator {
            properties.author = generator.clone();
        }
    }
    if properties.copyright.is_empty() {
        if let Some(copyright) = &root.asset.copyright {
            properties.copyright = copyright.clone();
        }
    }
    properties.default_scene_index = root.scene.unwrap_or(0) as u32;

    let mut model = DasModel::new(properties);

    // Step 2: flag joint nodes and locate each skin's common root joint.
    // The result is threaded into Step 7 below, where it reorders each
    // skeleton's `joint_ids` so the root joint is always first.
    let joint_set = flag_joint_nodes(root);
    let parent = parent_map(root);
    let skin_root_joints: Vec<Option<usize>> = root
        .skins
        .iter()
        .map(|skin| {
            let root_joint = find_common_root_joint(skin, &parent);
            if let Some(root_joint) = root_joint {
                log::debug!("skin `{}` common root joint is node {root_joint}", skin.name.clone().unwrap_or_default());
            }
            root_joint
        })
        .collect();

    // Step 3: resolve every referenced buffer's bytes up front.
    let buffers = resolve_buffers(path, root, root_dir)?;

    // Steps 4-6: meshes, primitives, indexed vertices, morph targets.
    for (mesh_index, gmesh) in root.meshes.iter().enumerate() {
        let mut primitive_ids = Vec::new();
        for (primitive_index, gprim) in gmesh.primitives.iter().enumerate() {
            let indices_accessor = gprim.indices.ok_or(GltfError::NonIndexedPrimitive {
                path: path.into(),
                mesh: mesh_index,
                primitive: primitive_index,
            })?;
            let original_indices = read_indices(path, root, &buffers, indices_accessor)?;
            let streams = extract_streams(path, root, &buffers, &gprim.attributes)?;

            let (order_src, generated_indices) = reindex_vertices(&streams, &original_indices);

            let primitive_id = model.mesh_primitives.len() as u32;
            let mut primitive = build_primitive(&mut model, &streams, &order_src, &generated_indices);

            for (target_index, target_map) in gprim.targets.iter().enumerate() {
                let target_streams = extract_streams(path, root, &buffers, target_map)?;
                let morph_target_id = build_morph_target(&mut model, &target_streams, &order_src);
                let weight = gmesh.weights.get(target_index).copied().unwrap_or(0.0);
                primitive.morph_targets.push(MorphTargetRef {
                    morph_target_id,
                    weight,
                });
            }

            model.mesh_primitives.push(primitive);
            primitive_ids.push(primitive_id);
        }
        model.meshes.push(Mesh {
            name: gmesh.name.clone().unwrap_or_default(),
            primitive_ids,
        });
    }

    // Step 7: skeletons and joints.
    let mut node_to_joint: HashMap<usize, u32> = HashMap::new();
    for (skin_index, skin) in root.skins.iter().enumerate() {
        let inverse_bind = skin
            .inverse_bind_matrices
            .map(|accessor| read_matrices(path, root, &buffers, accessor))
            .transpose()?;

        let mut joint_ids = Vec::with_capacity(skin.joints.len());
        for (i, &joint_node) in skin.joints.iter().enumerate() {
            let gnode = root.nodes.get(joint_node).ok_or_else(|| GltfError::InvalidAccessor {
                path: path.into(),
                index: joint_node,
                reason: "skin joint references an out-of-range node".into(),
            })?;
            let (translation, rotation, scale) = decompose(gnode);
            let joint_id = model.skeleton_joints.len() as u32;
            model.skeleton_joints.push(SkeletonJoint {
                inverse_bind_pose: inverse_bind.as_ref().and_then(|m| m.get(i).copied()).unwrap_or(Mat4::IDENTITY),
                translation,
                rotation,
                scale: scale.x,
                name: gnode.name.clone().unwrap_or_default(),
                children: Vec::new(),
            });
            node_to_joint.insert(joint_node, joint_id);
            joint_ids.push(joint_id);
        }
        // Second pass: wire up each joint's children (filtered to joints
        // belonging to this same skin).
        for &joint_node in &skin.joints {
            let joint_id = node_to_joint[&joint_node];
            let gnode = &root.nodes[joint_node];
            let children: Vec<u32> = gnode.children.iter().filter_map(|c| node_to_joint.get(c).copied()).collect();
            model.skeleton_joints[joint_id as usize].children = children;
        }

        // Move the common root joint (Step 2) to the front so `joint_ids[0]`
        // is always the skeleton's root when one could be determined.
        if let Some(root_id) = skin_root_joints[skin_index].and_then(|node| node_to_joint.get(&node).copied()) {
            if let Some(pos) = joint_ids.iter().position(|&id| id == root_id) {
                joint_ids.swap(0, pos);
            }
        }

        model.skeletons.push(Skeleton {
            name: skin.name.clone().unwrap_or_default(),
            parent_node_id: None,
            joint_ids,
        });
    }

    // Step 9: nodes (joint nodes are represented only as skeleton joints).
    let mut node_to_das: HashMap<usize, u32> = HashMap::new();
    for (i, gnode) in root.nodes.iter().enumerate() {
        if joint_set.contains(&i) {
            continue;
        }
        let das_id = model.nodes.len() as u32;
        node_to_das.insert(i, das_id);
        model.nodes.push(Node {
            name: gnode.name.clone().unwrap_or_default(),
            children: Vec::new(),
            mesh_id: gnode.mesh.map(|m| m as u32),
            skeleton_id: gnode.skin.map(|s| s as u32),
            transform: node_transform(gnode),
        });
        if let Some(skin_index) = gnode.skin {
            if let Some(skeleton) = model.skeletons.get_mut(skin_index) {
                skeleton.parent_node_id = Some(das_id);
            }
        }
    }
    for (i, gnode) in root.nodes.iter().enumerate() {
        if let Some(&das_id) = node_to_das.get(&i) {
            let children: Vec<u32> = gnode.children.iter().filter_map(|c| node_to_das.get(c).copied()).collect();
            model.nodes[das_id as usize].children = children;
        }
    }

    for gscene in &root.scenes {
        let node_ids: Vec<u32> = gscene.nodes.iter().filter_map(|n| node_to_das.get(n).copied()).collect();
        model.scenes.push(Scene {
            name: gscene.name.clone().unwrap_or_default(),
            node_ids,
            roots: Vec::new(),
        });
    }
    model.derive_all_scene_roots();

    // Step 8: animations (built last since it needs both translation tables).
    for ganim in &root.animations {
        let mut channel_ids = Vec::new();
        for gchan in &ganim.channels {
            let sampler = ganim.samplers.get(gchan.sampler).ok_or_else(|| GltfError::MissingField {
                path: path.into(),
                context: "animation channel".into(),
                field: "sampler".into(),
            })?;
            let target_node = gchan.target.node.ok_or_else(|| GltfError::MissingField {
                path: path.into(),
                context: "animation channel target".into(),
                field: "node".into(),
            })?;
            let owner = if let Some(&joint_id) = node_to_joint.get(&target_node) {
                AnimationChannelOwner::Joint(joint_id)
            } else {
                let das_id = *node_to_das.get(&target_node).ok_or_else(|| GltfError::MissingField {
                    path: path.into(),
                    context: "animation channel target".into(),
                    field: "node (unresolved)".into(),
                })?;
                AnimationChannelOwner::Node(das_id)
            };
            let target = match gchan.target.path.as_str() {
                "translation" => AnimationTarget::Translation,
                "rotation" => AnimationTarget::Rotation,
                "scale" => AnimationTarget::Scale,
                "weights" => AnimationTarget::Weights,
                other => {
                    return Err(GltfError::MissingField {
                        path: path.into(),
                        context: "animation channel target".into(),
                        field: format!("unsupported path `{other}`"),
                    })
                }
            };
            let interpolation = match sampler.interpolation.as_str() {
                "LINEAR" => Interpolation::Linear,
                "STEP" => Interpolation::Step,
                "CUBICSPLINE" => Interpolation::CubicSpline,
                _ => Interpolation::Linear,
            };

            let keyframes = crate::accessor::read_floats(path, root, &buffers, sampler.input)?;
            let keyframe_count = keyframes.len() as u32;
            let weight_count = if target == AnimationTarget::Weights {
                morph_target_count(root, target_node)
            } else {
                0
            };
            let stride = target.stride(weight_count);
            let raw_output = crate::accessor::read_floats(path, root, &buffers, sampler.output)?;
            let (tangents, target_values) = if interpolation == Interpolation::CubicSpline {
                split_cubic_spline(&raw_output, stride)
            } else {
                (None, raw_output)
            };

            let channel_id = model.animation_channels.len() as u32;
            model.animation_channels.push(AnimationChannel {
                owner,
                target,
                interpolation,
                keyframe_count,
                weight_count,
                keyframes,
                target_values,
                tangents,
            });
            channel_ids.push(channel_id);
        }
        model.animations.push(Animation {
            name: ganim.name.clone().unwrap_or_default(),
            channel_ids,
        });
    }

    Ok(model)
}

/// Globally reindexes the vertices an indexed primitive actually uses,
/// deduplicating by full attribute value with insertion-order tie-break.
fn reindex_vertices(streams: &AttributeStreams, original_indices: &[u32]) -> (Vec<usize>, Vec<u32>) {
    let mut unique = HashMap::new();
    let mut order_src = Vec::new();
    let mut generated = Vec::with_capacity(original_indices.len());
    for &original in original_indices {
        let vertex = streams.vertex_at(original as usize);
        let new_index = *unique.entry(vertex).or_insert_with(|| {
            let id = order_src.len() as u32;
            order_src.push(original as usize);
            id
        });
        generated.push(new_index);
    }
    (order_src, generated)
}

fn build_primitive(model: &mut DasModel, streams: &AttributeStreams, order_src: &[usize], indices: &[u32]) -> MeshPrimitive {
    let mut positions = Vec::with_capacity(order_src.len() * 12);
    for &src in order_src {
        let p = streams.positions[src];
        positions.extend_from_slice(&p.x.to_le_bytes());
        positions.extend_from_slice(&p.y.to_le_bytes());
        positions.extend_from_slice(&p.z.to_le_bytes());
    }
    let index_bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();

    let position_buffer_id = model.push_buffer(BufferType::VERTEX, pad_to_16(positions));
    let index_buffer_id = model.push_buffer(BufferType::INDICES, pad_to_16(index_bytes));

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

    if let Some(normals) = &streams.normals {
        let mut bytes = Vec::with_capacity(order_src.len() * 12);
        for &src in order_src {
            let n = normals[src];
            bytes.extend_from_slice(&n.x.to_le_bytes());
            bytes.extend_from_slice(&n.y.to_le_bytes());
            bytes.extend_from_slice(&n.z.to_le_bytes());
        }
        let id = model.push_buffer(BufferType::VERTEX_NORMAL, pad_to_16(bytes));
        primitive.vertex_normal_buffer = Some(BufferRef { buffer_id: id, byte_offset: 0 });
    }
    if let Some(tangents) = &streams.tangents {
        let mut bytes = Vec::with_capacity(order_src.len() * 16);
        for &src in order_src {
            let t = tangents[src];
            for v in [t.x, t.y, t.z, t.w] {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        let id = model.push_buffer(BufferType::VERTEX_TANGENT, pad_to_16(bytes));
        primitive.vertex_tangent_buffer = Some(BufferRef { buffer_id: id, byte_offset: 0 });
    }
    for uv_set in &streams.uv_sets {
        let mut bytes = Vec::with_capacity(order_src.len() * 8);
        for &src in order_src {
            let uv = uv_set[src];
            bytes.extend_from_slice(&uv.x.to_le_bytes());
            bytes.extend_from_slice(&uv.y.to_le_bytes());
        }
        let id = model.push_buffer(BufferType::TEXTURE_UV, pad_to_16(bytes));
        primitive.uv_sets.push(UvSet {
            buffer: BufferRef { buffer_id: id, byte_offset: 0 },
            texture_id: u32::MAX,
        });
    }
    for color_set in &streams.color_sets {
        let mut bytes = Vec::with_capacity(order_src.len() * 16);
        for &src in order_src {
            let c = color_set[src];
            for v in [c.x, c.y, c.z, c.w] {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        let id = model.push_buffer(BufferType::RAW, pad_to_16(bytes));
        primitive.color_multiplier_buffers.push(BufferRef { buffer_id: id, byte_offset: 0 });
    }
    for (joint_set, weight_set) in streams.joint_sets.iter().zip(streams.weight_sets.iter()) {
        let mut joint_bytes = Vec::with_capacity(order_src.len() * 8);
        let mut weight_bytes = Vec::with_capacity(order_src.len() * 16);
        for &src in order_src {
            for v in joint_set[src] {
                joint_bytes.extend_from_slice(&v.to_le_bytes());
            }
            let w = weight_set[src];
            for v in [w.x, w.y, w.z, w.w] {
                weight_bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        let joint_buffer_id = model.push_buffer(BufferType::JOINTS, pad_to_16(joint_bytes));
        let weight_buffer_id = model.push_buffer(BufferType::WEIGHTS, pad_to_16(weight_bytes));
        primitive.joint_weight_sets.push(das_format::model::JointWeightSet {
            joint_buffer: BufferRef {
                buffer_id: joint_buffer_id,
                byte_offset: 0,
            },
            weight_buffer: BufferRef {
                buffer_id: weight_buffer_id,
                byte_offset: 0,
            },
        });
    }

    primitive
}

fn build_morph_target(model: &mut DasModel, target_streams: &AttributeStreams, order_src: &[usize]) -> u32 {
    let mut positions = Vec::with_capacity(order_src.len() * 12);
    for &src in order_src {
        let p = target_streams.positions.get(src).copied().unwrap_or(Vec3::ZERO);
        positions.extend_from_slice(&p.x.to_le_bytes());
        positions.extend_from_slice(&p.y.to_le_bytes());
        positions.extend_from_slice(&p.z.to_le_bytes());
    }
    let position_buffer_id = model.push_buffer(BufferType::VERTEX, pad_to_16(positions));

    let mut target = MorphTarget {
        vertex_buffer: BufferRef {
            buffer_id: position_buffer_id,
            byte_offset: 0,
        },
        ..Default::default()
    };

    if let Some(normals) = &target_streams.normals {
        let mut bytes = Vec::with_capacity(order_src.len() * 12);
        for &src in order_src {
            let n = normals[src];
            bytes.extend_from_slice(&n.x.to_le_bytes());
            bytes.extend_from_slice(&n.y.to_le_bytes());
            bytes.extend_from_slice(&n.z.to_le_bytes());
        }
        let id = model.push_buffer(BufferType::VERTEX_NORMAL, pad_to_16(bytes));
        target.vertex_normal_buffer = Some(BufferRef { buffer_id: id, byte_offset: 0 });
    }

    let morph_target_id = model.morph_targets.len() as u32;
    model.morph_targets.push(target);
    morph_target_id
}

fn pad_to_16(mut bytes: Vec<u8>) -> Vec<u8> {
    let remainder = bytes.len() % 16;
    if remainder != 0 {
        bytes.resize(bytes.len() + (16 - remainder), 0);
    }
    bytes
}

fn node_transform(node: &GltfNode) -> Mat4 {
    if let Some(matrix) = node.matrix {
        return Mat4::from_cols_array(&matrix);
    }
    let (translation, rotation, scale) = decompose(node);
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

fn decompose(node: &GltfNode) -> (Vec3, Quat, Vec3) {
    if let Some(matrix) = node.matrix {
        let (scale, rotation, translation) = Mat4::from_cols_array(&matrix).to_scale_rotation_translation();
        return (translation, rotation, scale);
    }
    (
        Vec3::from(node.translation),
        Quat::from_array(node.rotation),
        Vec3::from(node.scale),
    )
}

fn read_matrices(path: &str, root: &GLTFRoot, buffers: &[Vec<u8>], accessor: usize) -> Result<Vec<Mat4>> {
    let floats = crate::accessor::read_floats(path, root, buffers, accessor)?;
    Ok(floats.chunks_exact(16).map(|c| Mat4::from_cols_array(c.try_into().unwrap())).collect())
}

fn morph_target_count(root: &GLTFRoot, node_index: usize) -> u32 {
    root.nodes
        .get(node_index)
        .and_then(|n| n.mesh)
        .and_then(|mesh_index| root.meshes.get(mesh_index))
        .and_then(|mesh| mesh.primitives.first())
        .map(|p| p.targets.len() as u32)
        .unwrap_or(0)
}

/// Splits a CUBICSPLINE sampler output (`in_tangent, value, out_tangent`
/// triples per keyframe) into DAS's separate `tangents[]`/`target_values[]`.
fn split_cubic_spline(raw: &[f32], stride: u32) -> (Option<Vec<f32>>, Vec<f32>) {
    let stride = stride as usize;
    if stride == 0 {
        return (Some(Vec::new()), Vec::new());
    }
    let keyframe_count = raw.len() / (stride * 3);
    let mut tangents = Vec::with_capacity(keyframe_count * stride * 2);
    let mut values = Vec::with_capacity(keyframe_count * stride);
    for k in 0..keyframe_count {
        let base = k * stride * 3;
        tangents.extend_from_slice(&raw[base..base + stride]);
        values.extend_from_slice(&raw[base + stride..base + stride * 2]);
        tangents.extend_from_slice(&raw[base + stride * 2..base + stride * 3]);
    }
    (Some(tangents), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse as parse_json;
    use crate::root::lower;

    fn build_minimal_triangle_gltf() -> (GLTFRoot, Vec<Vec<u8>>) {
        let mut buffer = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            buffer.extend_from_slice(&v.to_le_bytes());
        }
        let position_bytes_len = buffer.len();
        for v in [0u16, 1, 2] {
            buffer.extend_from_slice(&v.to_le_bytes());
        }

        let text = format!(
            r#"{{
                "asset": {{"generator": "test-exporter"}},
                "accessors": [
                    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}},
                    {{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
                ],
                "bufferViews": [
                    {{"buffer": 0, "byteOffset": 0, "byteLength": {pos_len}}},
                    {{"buffer": 0, "byteOffset": {pos_len}, "byteLength": 6}}
                ],
                "buffers": [{{"byteLength": {total_len}}}],
                "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}],
                "nodes": [{{"mesh": 0}}],
                "scenes": [{{"nodes": [0]}}],
                "scene": 0
            }}"#,
            pos_len = position_bytes_len,
            total_len = buffer.len(),
        );
        let json = parse_json("t.gltf", &text).unwrap();
        let root = lower("t.gltf", &json).unwrap();
        (root, vec![buffer])
    }

    #[test]
    fn compiles_indexed_triangle_primitive() {
        let (mut root, buffers) = build_minimal_triangle_gltf();

        let dir = std::env::temp_dir().join("das-gltf-compiler-test");
        std::fs::create_dir_all(&dir).unwrap();
        let bin_path = dir.join("data.bin");
        std::fs::write(&bin_path, &buffers[0]).unwrap();
        root.buffers[0].uri = Some("data.bin".to_string());

        let model = compile("t.gltf", &dir, &root, Properties::default()).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.mesh_primitives.len(), 1);
        assert_eq!(model.mesh_primitives[0].indices_count, 3);
        assert_eq!(model.nodes.len(), 1);
        assert_eq!(model.scenes[0].roots, vec![0]);
    }

    #[test]
    fn skeleton_joint_ids_are_reordered_root_first() {
        // node 0 is the child joint, node 1 is its parent and the skin's
        // common root; `skin.joints` lists the child before the root to
        // make sure reordering, not declaration order, decides joint_ids[0].
        let text = r#"{
            "nodes": [
                {"name": "child"},
                {"name": "root", "children": [0]},
                {"skin": 0}
            ],
            "skins": [{"joints": [0, 1]}],
            "scenes": [{"nodes": [1, 2]}]
        }"#;
        let json = parse_json("t.gltf", text).unwrap();
        let root = lower("t.gltf", &json).unwrap();

        let model = compile("t.gltf", Path::new("."), &root, Properties::default()).unwrap();

        assert_eq!(model.skeletons.len(), 1);
        let joint_ids = &model.skeletons[0].joint_ids;
        assert_eq!(model.skeleton_joints[joint_ids[0] as usize].name, "root");
        assert_eq!(model.skeleton_joints[joint_ids[1] as usize].name, "child");
    }

    #[test]
    fn split_cubic_spline_separates_tangents_and_values() {
        // One keyframe, stride 3: in=[1,1,1], value=[2,2,2], out=[3,3,3].
        let raw = vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0];
        let (tangents, values) = split_cubic_spline(&raw, 3);
        assert_eq!(values, vec![2.0, 2.0, 2.0]);
        assert_eq!(tangents.unwrap(), vec![1.0, 1.0, 1.0, 3.0, 3.0, 3.0]);
    }
}
