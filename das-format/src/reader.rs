//! DAS reader (C7): the inverse of [`crate::writer`]. Dispatches on scope
//! name, then on value name within the scope, populating typed structures
//! in a single forward pass.

use crate::buffer_type::BufferType;
use crate::cursor::Cursor;
use crate::error::{DasError, Result};
use crate::model::*;

const MAGIC: u32 = 0x0053_4144;

/// Verifies the 16-byte file header and returns the bytes after it. The
/// padding must be homogeneous zero, `0x0A`, or `0x20` fill, matching
/// whichever writer produced the file.
fn read_signature(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < 16 {
        return Err(DasError::InvalidSignature);
    }
    let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    if magic != MAGIC {
        return Err(DasError::InvalidSignature);
    }
    let padding = &bytes[4..16];
    let ok = padding.iter().all(|&b| b == 0x00)
        || padding.iter().all(|&b| b == 0x0A)
        || padding.iter().all(|&b| b == 0x20);
    if !ok {
        return Err(DasError::InvalidSignature);
    }
    Ok(&bytes[16..])
}

/// Parses a full DAS file into an in-memory model, transparently decoding a
/// Huffman-compressed body when the `"HUF\0"` magic follows the signature.
pub fn read_model(bytes: &[u8]) -> Result<DasModel> {
    let rest = read_signature(bytes)?;
    let body = if rest.starts_with(b"HUF\0") {
        das_huffman::decode(rest)?
    } else {
        rest.to_vec()
    };

    let mut model = DasModel::default();
    let mut cursor = Cursor::new(&body);

    while !cursor.is_eof() {
        cursor.skip_skippable(true);
        if cursor.is_eof() {
            break;
        }
        let scope_name = cursor.read_word()?;
        cursor.skip_newline();
        match scope_name.as_str() {
            "PROPERTIES" => model.properties = read_properties(&mut cursor)?,
            "BUFFER" => model.buffers.push(read_buffer(&mut cursor)?),
            "MESHPRIMITIVE" => model.mesh_primitives.push(read_mesh_primitive(&mut cursor)?),
            "MORPHTARGET" => model.morph_targets.push(read_morph_target(&mut cursor)?),
            "MESH" => model.meshes.push(read_mesh(&mut cursor)?),
            "NODE" => model.nodes.push(read_node(&mut cursor)?),
            "SKELETONJOINT" => model.skeleton_joints.push(read_skeleton_joint(&mut cursor)?),
            "SKELETON" => model.skeletons.push(read_skeleton(&mut cursor)?),
            "ANIMATIONCHANNEL" => model.animation_channels.push(read_animation_channel(&mut cursor)?),
            "ANIMATION" => model.animations.push(read_animation(&mut cursor)?),
            "SCENE" => model.scenes.push(read_scene(&mut cursor)?),
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }

    model.derive_all_scene_roots();
    Ok(model)
}

fn read_properties(cursor: &mut Cursor) -> Result<Properties> {
    let mut properties = Properties::default();
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "MODEL" => properties.model_name = cursor.read_quoted_string()?,
            "AUTHOR" => properties.author = cursor.read_quoted_string()?,
            "COPYRIGHT" => properties.copyright = cursor.read_quoted_string()?,
            "MODDATE" => {
                properties.modification_timestamp = cursor.read_u64()?;
                cursor.skip_newline();
            }
            "COMPRESSION" => {
                properties.compression_flag = cursor.read_u8()? != 0;
                cursor.skip_newline();
            }
            "DEFAULTSCENE" => {
                properties.default_scene_index = cursor.read_u32()?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(properties)
}

fn read_buffer(cursor: &mut Cursor) -> Result<Buffer> {
    let mut buffer_type = BufferType::empty();
    let mut data_len = None;
    let mut data = Vec::new();
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "BUFFERTYPE" => {
                buffer_type = BufferType::from_bits_truncate(cursor.read_u16()?);
                cursor.skip_newline();
            }
            "DATALEN" => {
                data_len = Some(cursor.read_u32()? as usize);
                cursor.skip_newline();
            }
            "DATA" => {
                let len = data_len.ok_or_else(|| DasError::IncompleteScope("BUFFER".into()))?;
                data = cursor.read_bytes(len)?.to_vec();
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(Buffer::new(buffer_type, data))
}

fn optional_ref(id: u32) -> Option<u32> {
    if id == u32::MAX {
        None
    } else {
        Some(id)
    }
}

fn read_mesh_primitive(cursor: &mut Cursor) -> Result<MeshPrimitive> {
    let mut primitive = MeshPrimitive::default();
    let mut index_id = None;
    let mut index_offset = None;
    let mut normal_id = None;
    let mut normal_offset = None;
    let mut tangent_id = None;
    let mut tangent_offset = None;
    let mut texture_count = 0usize;
    let mut uv_ids = Vec::new();
    let mut uv_offsets = Vec::new();
    let mut texture_ids = Vec::new();
    let mut color_mul_count = 0usize;
    let mut color_ids = Vec::new();
    let mut color_offsets = Vec::new();
    let mut joint_set_count = 0usize;
    let mut joint_ids = Vec::new();
    let mut joint_offsets = Vec::new();
    let mut weight_ids = Vec::new();
    let mut weight_offsets = Vec::new();
    let mut morph_target_count = 0usize;
    let mut morph_ids = Vec::new();
    let mut morph_weights = Vec::new();

    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "INDEXBUFFERID" => {
                index_id = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "INDEXBUFFEROFFSET" => {
                index_offset = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "INDICESCOUNT" => {
                primitive.indices_count = cursor.read_u32()?;
                cursor.skip_newline();
            }
            "VERTEXBUFFERID" => {
                primitive.vertex_buffer.buffer_id = cursor.read_u32()?;
                cursor.skip_newline();
            }
            "VERTEXBUFFEROFFSET" => {
                primitive.vertex_buffer.byte_offset = cursor.read_u32()?;
                cursor.skip_newline();
            }
            "NORMALBUFFERID" => {
                normal_id = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "NORMALBUFFEROFFSET" => {
                normal_offset = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "TANGENTBUFFERID" => {
                tangent_id = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "TANGENTBUFFEROFFSET" => {
                tangent_offset = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "TEXTURECOUNT" => {
                texture_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "UVBUFFERIDS" => {
                uv_ids = cursor.read_u32_array(texture_count)?;
                cursor.skip_newline();
            }
            "UVBUFFEROFFSETS" => {
                uv_offsets = cursor.read_u32_array(texture_count)?;
                cursor.skip_newline();
            }
            "TEXTUREIDS" => {
                texture_ids = cursor.read_u32_array(texture_count)?;
                cursor.skip_newline();
            }
            "COLORMULCOUNT" => {
                color_mul_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "COLORMULBUFFERIDS" => {
                color_ids = cursor.read_u32_array(color_mul_count)?;
                cursor.skip_newline();
            }
            "COLORMULBUFFEROFFSETS" => {
                color_offsets = cursor.read_u32_array(color_mul_count)?;
                cursor.skip_newline();
            }
            "JOINTSETCOUNT" => {
                joint_set_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "JOINTBUFFERIDS" => {
                joint_ids = cursor.read_u32_array(joint_set_count)?;
                cursor.skip_newline();
            }
            "JOINTBUFFEROFFSETS" => {
                joint_offsets = cursor.read_u32_array(joint_set_count)?;
                cursor.skip_newline();
            }
            "WEIGHTBUFFERIDS" => {
                weight_ids = cursor.read_u32_array(joint_set_count)?;
                cursor.skip_newline();
            }
            "WEIGHTBUFFEROFFSETS" => {
                weight_offsets = cursor.read_u32_array(joint_set_count)?;
                cursor.skip_newline();
            }
            "MORPHTARGETCOUNT" => {
                morph_target_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "MORPHTARGETS" => {
                morph_ids = cursor.read_u32_array(morph_target_count)?;
                cursor.skip_newline();
            }
            "MORPHWEIGHTS" => {
                morph_weights = cursor.read_f32_array(morph_target_count)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }

    if let (Some(id), Some(offset)) = (index_id, index_offset) {
        primitive.index_buffer = Some(BufferRef {
            buffer_id: id,
            byte_offset: offset,
        });
    }
    if let (Some(id), Some(offset)) = (normal_id, normal_offset) {
        primitive.vertex_normal_buffer = Some(BufferRef {
            buffer_id: id,
            byte_offset: offset,
        });
    }
    if let (Some(id), Some(offset)) = (tangent_id, tangent_offset) {
        primitive.vertex_tangent_buffer = Some(BufferRef {
            buffer_id: id,
            byte_offset: offset,
        });
    }
    primitive.uv_sets = uv_ids
        .iter()
        .zip(uv_offsets.iter())
        .zip(texture_ids.iter())
        .map(|((&id, &offset), &texture_id)| UvSet {
            buffer: BufferRef {
                buffer_id: id,
                byte_offset: offset,
            },
            texture_id,
        })
        .collect();
    primitive.color_multiplier_buffers = color_ids
        .iter()
        .zip(color_offsets.iter())
        .map(|(&id, &offset)| BufferRef {
            buffer_id: id,
            byte_offset: offset,
        })
        .collect();
    primitive.joint_weight_sets = joint_ids
        .iter()
        .zip(joint_offsets.iter())
        .zip(weight_ids.iter())
        .zip(weight_offsets.iter())
        .map(|(((&jid, &joff), &wid), &woff)| JointWeightSet {
            joint_buffer: BufferRef {
                buffer_id: jid,
                byte_offset: joff,
            },
            weight_buffer: BufferRef {
                buffer_id: wid,
                byte_offset: woff,
            },
        })
        .collect();
    primitive.morph_targets = morph_ids
        .iter()
        .zip(morph_weights.iter())
        .map(|(&id, &weight)| MorphTargetRef {
            morph_target_id: id,
            weight,
        })
        .collect();

    Ok(primitive)
}

fn read_morph_target(cursor: &mut Cursor) -> Result<MorphTarget> {
    let mut morph = MorphTarget::default();
    let mut normal_id = None;
    let mut normal_offset = None;
    let mut tangent_id = None;
    let mut tangent_offset = None;
    let mut texture_count = 0usize;
    let mut uv_ids = Vec::new();
    let mut uv_offsets = Vec::new();
    let mut color_mul_count = 0usize;
    let mut color_ids = Vec::new();

    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "VERTEXBUFFERID" => {
                morph.vertex_buffer.buffer_id = cursor.read_u32()?;
                cursor.skip_newline();
            }
            "VERTEXBUFFEROFFSET" => {
                morph.vertex_buffer.byte_offset = cursor.read_u32()?;
                cursor.skip_newline();
            }
            "NORMALBUFFERID" => {
                normal_id = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "NORMALBUFFEROFFSET" => {
                normal_offset = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "TANGENTBUFFERID" => {
                tangent_id = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "TANGENTBUFFEROFFSET" => {
                tangent_offset = Some(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "TEXTURECOUNT" => {
                texture_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "UVBUFFERIDS" => {
                uv_ids = cursor.read_u32_array(texture_count)?;
                cursor.skip_newline();
            }
            "UVBUFFEROFFSETS" => {
                uv_offsets = cursor.read_u32_array(texture_count)?;
                cursor.skip_newline();
            }
            "COLORMULCOUNT" => {
                color_mul_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "COLORMULBUFFERIDS" => {
                color_ids = cursor.read_u32_array(color_mul_count)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }

    if let (Some(id), Some(offset)) = (normal_id, normal_offset) {
        morph.vertex_normal_buffer = Some(BufferRef {
            buffer_id: id,
            byte_offset: offset,
        });
    }
    if let (Some(id), Some(offset)) = (tangent_id, tangent_offset) {
        morph.vertex_tangent_buffer = Some(BufferRef {
            buffer_id: id,
            byte_offset: offset,
        });
    }
    morph.uv_sets = uv_ids
        .iter()
        .zip(uv_offsets.iter())
        .map(|(&id, &offset)| UvSet {
            buffer: BufferRef {
                buffer_id: id,
                byte_offset: offset,
            },
            texture_id: u32::MAX,
        })
        .collect();
    morph.color_multiplier_buffers = color_ids
        .iter()
        .map(|&id| BufferRef {
            buffer_id: id,
            byte_offset: 0,
        })
        .collect();

    Ok(morph)
}

fn read_mesh(cursor: &mut Cursor) -> Result<Mesh> {
    let mut mesh = Mesh::default();
    let mut primitive_count = 0usize;
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "NAME" => mesh.name = cursor.read_quoted_string()?,
            "PRIMITIVECOUNT" => {
                primitive_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "PRIMITIVES" => {
                mesh.primitive_ids = cursor.read_u32_array(primitive_count)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(mesh)
}

fn read_node(cursor: &mut Cursor) -> Result<Node> {
    let mut node = Node::default();
    let mut children_count = 0usize;
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "NAME" => node.name = cursor.read_quoted_string()?,
            "CHILDRENCOUNT" => {
                children_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "CHILDREN" => {
                node.children = cursor.read_u32_array(children_count)?;
                cursor.skip_newline();
            }
            "MESH" => {
                node.mesh_id = optional_ref(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "SKELETON" => {
                node.skeleton_id = optional_ref(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "TRANSFORM" => {
                let values = cursor.read_f32_array(16)?;
                node.transform = glam::Mat4::from_cols_array(&values.try_into().unwrap());
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(node)
}

fn read_scene(cursor: &mut Cursor) -> Result<Scene> {
    let mut scene = Scene::default();
    let mut node_count = 0usize;
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "NAME" => scene.name = cursor.read_quoted_string()?,
            "NODECOUNT" => {
                node_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "NODES" => {
                scene.node_ids = cursor.read_u32_array(node_count)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(scene)
}

fn read_skeleton(cursor: &mut Cursor) -> Result<Skeleton> {
    let mut skeleton = Skeleton::default();
    let mut joint_count = 0usize;
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "NAME" => skeleton.name = cursor.read_quoted_string()?,
            "PARENT" => {
                skeleton.parent_node_id = optional_ref(cursor.read_u32()?);
                cursor.skip_newline();
            }
            "JOINTCOUNT" => {
                joint_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "JOINTS" => {
                skeleton.joint_ids = cursor.read_u32_array(joint_count)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(skeleton)
}

fn read_skeleton_joint(cursor: &mut Cursor) -> Result<SkeletonJoint> {
    let mut joint = SkeletonJoint::default();
    let mut children_count = 0usize;
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "INVERSEBINDPOS" => {
                let values = cursor.read_f32_array(16)?;
                joint.inverse_bind_pose = glam::Mat4::from_cols_array(&values.try_into().unwrap());
                cursor.skip_newline();
            }
            "SCALE" => {
                joint.scale = cursor.read_f32()?;
                cursor.skip_newline();
            }
            "ROTATION" => {
                let v = cursor.read_f32_array(4)?;
                joint.rotation = glam::Quat::from_xyzw(v[0], v[1], v[2], v[3]);
                cursor.skip_newline();
            }
            "TRANSLATION" => {
                let v = cursor.read_f32_array(3)?;
                joint.translation = glam::Vec3::new(v[0], v[1], v[2]);
                cursor.skip_newline();
            }
            "NAME" => joint.name = cursor.read_quoted_string()?,
            "CHILDRENCOUNT" => {
                children_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "CHILDREN" => {
                joint.children = cursor.read_u32_array(children_count)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(joint)
}

fn read_animation(cursor: &mut Cursor) -> Result<Animation> {
    let mut animation = Animation::default();
    let mut channel_count = 0usize;
    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "NAME" => animation.name = cursor.read_quoted_string()?,
            "CHANNELCOUNT" => {
                channel_count = cursor.read_u32()? as usize;
                cursor.skip_newline();
            }
            "CHANNELS" => {
                animation.channel_ids = cursor.read_u32_array(channel_count)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }
    Ok(animation)
}

fn read_animation_channel(cursor: &mut Cursor) -> Result<AnimationChannel> {
    let mut owner = None;
    let mut target = None;
    let mut interpolation = None;
    let mut keyframe_count = 0u32;
    let mut weight_count = 0u32;
    let mut keyframes = Vec::new();
    let mut tangents = None;
    let mut target_values = Vec::new();
    let mut has_tangents_field = false;

    loop {
        let word = cursor.read_word()?;
        if word == "ENDSCOPE" {
            cursor.skip_newline();
            break;
        }
        cursor.expect_colon()?;
        match word.as_str() {
            "NODEID" => {
                owner = Some(AnimationChannelOwner::Node(cursor.read_u32()?));
                cursor.skip_newline();
            }
            "JOINTID" => {
                owner = Some(AnimationChannelOwner::Joint(cursor.read_u32()?));
                cursor.skip_newline();
            }
            "TARGET" => {
                target = Some(match cursor.read_u8()? {
                    0 => AnimationTarget::Weights,
                    1 => AnimationTarget::Translation,
                    2 => AnimationTarget::Rotation,
                    3 => AnimationTarget::Scale,
                    other => {
                        return Err(DasError::InvalidValue {
                            slot: format!("TARGET={other}"),
                        })
                    }
                });
                cursor.skip_newline();
            }
            "INTERPOLATION" => {
                interpolation = Some(match cursor.read_u8()? {
                    0 => Interpolation::Linear,
                    1 => Interpolation::Step,
                    2 => Interpolation::CubicSpline,
                    other => {
                        return Err(DasError::InvalidValue {
                            slot: format!("INTERPOLATION={other}"),
                        })
                    }
                });
                cursor.skip_newline();
            }
            "KEYFRAMECOUNT" => {
                keyframe_count = cursor.read_u32()?;
                cursor.skip_newline();
            }
            "WEIGHTCOUNT" => {
                weight_count = cursor.read_u32()?;
                cursor.skip_newline();
            }
            "KEYFRAMES" => {
                keyframes = cursor.read_f32_array(keyframe_count as usize)?;
                cursor.skip_newline();
            }
            "TANGENTS" => {
                has_tangents_field = true;
                let target = target.ok_or_else(|| DasError::IncompleteScope("ANIMATIONCHANNEL".into()))?;
                let stride = target.stride(weight_count) as usize;
                tangents = Some(cursor.read_f32_array(keyframe_count as usize * stride * 2)?);
                cursor.skip_newline();
            }
            "TARGETVALUES" => {
                let target = target.ok_or_else(|| DasError::IncompleteScope("ANIMATIONCHANNEL".into()))?;
                let stride = target.stride(weight_count) as usize;
                target_values = cursor.read_f32_array(keyframe_count as usize * stride)?;
                cursor.skip_newline();
            }
            other => return Err(DasError::InvalidKeyword(other.to_string())),
        }
    }

    let target = target.ok_or_else(|| DasError::IncompleteScope("ANIMATIONCHANNEL".into()))?;
    let interpolation = interpolation.ok_or_else(|| DasError::IncompleteScope("ANIMATIONCHANNEL".into()))?;
    if interpolation == Interpolation::CubicSpline && !has_tangents_field {
        return Err(DasError::IncompleteScope("ANIMATIONCHANNEL".into()));
    }

    Ok(AnimationChannel {
        owner: owner.ok_or_else(|| DasError::IncompleteScope("ANIMATIONCHANNEL".into()))?,
        target,
        interpolation,
        keyframe_count,
        weight_count,
        keyframes,
        target_values,
        tangents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_model;

    #[test]
    fn round_trips_empty_scene_properties() {
        let mut model = DasModel::new(Properties {
            model_name: "test".into(),
            author: "me".into(),
            copyright: "".into(),
            modification_timestamp: 0,
            default_scene_index: 0,
            compression_flag: false,
        });
        model.scenes.push(Scene {
            name: "default".into(),
            node_ids: Vec::new(),
            roots: Vec::new(),
        });

        let bytes = write_model(&model);
        let parsed = read_model(&bytes).unwrap();

        assert_eq!(parsed.properties, model.properties);
        assert_eq!(parsed.scenes.len(), 1);
        assert_eq!(parsed.scenes[0].roots, Vec::<u32>::new());
    }

    #[test]
    fn round_trips_buffer_payload() {
        let mut model = DasModel::new(Properties::default());
        model.push_buffer(BufferType::VERTEX, vec![1, 2, 3, 4, 5, 6]);
        let bytes = write_model(&model);
        let parsed = read_model(&bytes).unwrap();
        assert_eq!(parsed.buffers.len(), 1);
        assert_eq!(parsed.buffers[0].data, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(parsed.buffers[0].buffer_type, BufferType::VERTEX);
    }

    #[test]
    fn compressed_round_trip_preserves_buffers() {
        let mut model = DasModel::new(Properties {
            compression_flag: true,
            ..Default::default()
        });
        model.push_buffer(BufferType::INDICES, vec![0u8; 200]);
        let bytes = write_model(&model);
        assert_eq!(&bytes[16..20], b"HUF\0");
        let parsed = read_model(&bytes).unwrap();
        assert_eq!(parsed.buffers[0].data, vec![0u8; 200]);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = write_model(&DasModel::new(Properties::default()));
        bytes[0] = 0xFF;
        assert!(matches!(read_model(&bytes), Err(DasError::InvalidSignature)));
    }

    #[test]
    fn scene_root_derivation_round_trips() {
        let mut model = DasModel::new(Properties::default());
        model.nodes.push(Node {
            children: vec![1],
            ..Default::default()
        });
        model.nodes.push(Node::default());
        model.scenes.push(Scene {
            name: "s".into(),
            node_ids: vec![0, 1],
            roots: Vec::new(),
        });
        let bytes = write_model(&model);
        let parsed = read_model(&bytes).unwrap();
        assert_eq!(parsed.scenes[0].roots, vec![0]);
    }
}
