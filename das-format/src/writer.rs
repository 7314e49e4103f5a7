//! DAS writer (C6): emits scopes, typed values, arrays, matrices and blobs
//! to a byte sink in the grammar fixed by §6 of the container contract.

use crate::error::{DasError, Result};
use crate::model::*;

const MAGIC: u32 = 0x0053_4144;

/// Low-level scope/value emitter. Tracks open scopes in a stack so every
/// `begin_scope` has a matching `end_scope`; dropping a `DasWriter` with
/// scopes still open is a programmer error caught by `finish`.
pub struct DasWriter {
    out: Vec<u8>,
    open_scopes: Vec<String>,
}

impl DasWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            open_scopes: Vec::new(),
        }
    }

    pub fn begin_scope(&mut self, name: &str) {
        self.out.extend_from_slice(name.as_bytes());
        self.out.push(b'\n');
        self.open_scopes.push(name.to_string());
    }

    pub fn end_scope(&mut self) -> Result<()> {
        let name = self
            .open_scopes
            .pop()
            .ok_or_else(|| DasError::ScopeAlreadyClosed("<none open>".into()))?;
        let _ = name;
        self.out.extend_from_slice(b"ENDSCOPE\n");
        Ok(())
    }

    pub fn write_string(&mut self, name: &str, value: &str) {
        self.write_name(name);
        self.out.push(b'"');
        self.out.extend_from_slice(value.replace('"', "\\\"").as_bytes());
        self.out.push(b'"');
        self.out.push(b'\n');
    }

    pub fn write_u8(&mut self, name: &str, value: u8) {
        self.write_name(name);
        self.out.push(value);
        self.out.push(b'\n');
    }

    pub fn write_u16(&mut self, name: &str, value: u16) {
        self.write_name(name);
        self.out.extend_from_slice(&value.to_le_bytes());
        self.out.push(b'\n');
    }

    pub fn write_u32(&mut self, name: &str, value: u32) {
        self.write_name(name);
        self.out.extend_from_slice(&value.to_le_bytes());
        self.out.push(b'\n');
    }

    pub fn write_u64(&mut self, name: &str, value: u64) {
        self.write_name(name);
        self.out.extend_from_slice(&value.to_le_bytes());
        self.out.push(b'\n');
    }

    pub fn write_f32(&mut self, name: &str, value: f32) {
        self.write_name(name);
        self.out.extend_from_slice(&value.to_le_bytes());
        self.out.push(b'\n');
    }

    pub fn write_u32_array(&mut self, name: &str, values: &[u32]) {
        self.write_name(name);
        for v in values {
            self.out.extend_from_slice(&v.to_le_bytes());
        }
        self.out.push(b'\n');
    }

    pub fn write_f32_array(&mut self, name: &str, values: &[f32]) {
        self.write_name(name);
        for v in values {
            self.out.extend_from_slice(&v.to_le_bytes());
        }
        self.out.push(b'\n');
    }

    /// Row-major 4x4 matrix: 16 consecutive `f32`s.
    pub fn write_matrix(&mut self, name: &str, matrix: glam::Mat4) {
        self.write_f32_array(name, &matrix.to_cols_array());
    }

    pub fn write_blob(&mut self, name: &str, bytes: &[u8]) {
        self.write_name(name);
        self.out.extend_from_slice(bytes);
    }

    fn write_name(&mut self, name: &str) {
        self.out.extend_from_slice(name.as_bytes());
        self.out.extend_from_slice(b": ");
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

impl Default for DasWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes a model to its full on-disk byte representation: signature,
/// then every scope in the contractual order properties → buffers → mesh
/// primitives → morph targets → meshes → nodes → skeleton joints →
/// skeletons → animation channels → animations → scenes, optionally
/// Huffman-compressed when `compression_flag` is set.
pub fn write_model(model: &DasModel) -> Vec<u8> {
    let mut w = DasWriter::new();
    write_properties(&mut w, &model.properties);
    for buffer in &model.buffers {
        write_buffer(&mut w, buffer);
    }
    for primitive in &model.mesh_primitives {
        write_mesh_primitive(&mut w, primitive);
    }
    for morph in &model.morph_targets {
        write_morph_target(&mut w, morph);
    }
    for mesh in &model.meshes {
        write_mesh(&mut w, mesh);
    }
    for node in &model.nodes {
        write_node(&mut w, node);
    }
    for joint in &model.skeleton_joints {
        write_skeleton_joint(&mut w, joint);
    }
    for skeleton in &model.skeletons {
        write_skeleton(&mut w, skeleton);
    }
    for channel in &model.animation_channels {
        write_animation_channel(&mut w, channel);
    }
    for animation in &model.animations {
        write_animation(&mut w, animation);
    }
    for scene in &model.scenes {
        write_scene(&mut w, scene);
    }

    let body = w.finish();

    let mut out = Vec::with_capacity(body.len() + 16);
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&[0u8; 12]);

    if model.properties.compression_flag {
        out.extend_from_slice(&das_huffman::encode(&body));
    } else {
        out.extend_from_slice(&body);
    }
    out
}

fn write_properties(w: &mut DasWriter, properties: &Properties) {
    w.begin_scope("PROPERTIES");
    w.write_string("MODEL", &properties.model_name);
    w.write_string("AUTHOR", &properties.author);
    w.write_string("COPYRIGHT", &properties.copyright);
    w.write_u64("MODDATE", properties.modification_timestamp);
    w.write_u8("COMPRESSION", properties.compression_flag as u8);
    w.write_u32("DEFAULTSCENE", properties.default_scene_index);
    let _ = w.end_scope();
}

fn write_buffer(w: &mut DasWriter, buffer: &Buffer) {
    w.begin_scope("BUFFER");
    w.write_u16("BUFFERTYPE", buffer.buffer_type.bits());
    w.write_u32("DATALEN", buffer.byte_length());
    w.write_blob("DATA", &buffer.data);
    let _ = w.end_scope();
}

fn write_mesh_primitive(w: &mut DasWriter, primitive: &MeshPrimitive) {
    w.begin_scope("MESHPRIMITIVE");
    if let Some(index_buffer) = primitive.index_buffer {
        w.write_u32("INDEXBUFFERID", index_buffer.buffer_id);
        w.write_u32("INDEXBUFFEROFFSET", index_buffer.byte_offset);
    }
    w.write_u32("INDICESCOUNT", primitive.indices_count);
    w.write_u32("VERTEXBUFFERID", primitive.vertex_buffer.buffer_id);
    w.write_u32("VERTEXBUFFEROFFSET", primitive.vertex_buffer.byte_offset);
    if let Some(normal) = primitive.vertex_normal_buffer {
        w.write_u32("NORMALBUFFERID", normal.buffer_id);
        w.write_u32("NORMALBUFFEROFFSET", normal.byte_offset);
    }
    if let Some(tangent) = primitive.vertex_tangent_buffer {
        w.write_u32("TANGENTBUFFERID", tangent.buffer_id);
        w.write_u32("TANGENTBUFFEROFFSET", tangent.byte_offset);
    }

    w.write_u32("TEXTURECOUNT", primitive.uv_sets.len() as u32);
    w.write_u32_array(
        "UVBUFFERIDS",
        &primitive.uv_sets.iter().map(|s| s.buffer.buffer_id).collect::<Vec<_>>(),
    );
    w.write_u32_array(
        "UVBUFFEROFFSETS",
        &primitive.uv_sets.iter().map(|s| s.buffer.byte_offset).collect::<Vec<_>>(),
    );
    w.write_u32_array(
        "TEXTUREIDS",
        &primitive.uv_sets.iter().map(|s| s.texture_id).collect::<Vec<_>>(),
    );

    w.write_u32("COLORMULCOUNT", primitive.color_multiplier_buffers.len() as u32);
    w.write_u32_array(
        "COLORMULBUFFERIDS",
        &primitive
            .color_multiplier_buffers
            .iter()
            .map(|b| b.buffer_id)
            .collect::<Vec<_>>(),
    );
    w.write_u32_array(
        "COLORMULBUFFEROFFSETS",
        &primitive
            .color_multiplier_buffers
            .iter()
            .map(|b| b.byte_offset)
            .collect::<Vec<_>>(),
    );

    w.write_u32("JOINTSETCOUNT", primitive.joint_weight_sets.len() as u32);
    w.write_u32_array(
        "JOINTBUFFERIDS",
        &primitive
            .joint_weight_sets
            .iter()
            .map(|s| s.joint_buffer.buffer_id)
            .collect::<Vec<_>>(),
    );
    w.write_u32_array(
        "JOINTBUFFEROFFSETS",
        &primitive
            .joint_weight_sets
            .iter()
            .map(|s| s.joint_buffer.byte_offset)
            .collect::<Vec<_>>(),
    );
    w.write_u32_array(
        "WEIGHTBUFFERIDS",
        &primitive
            .joint_weight_sets
            .iter()
            .map(|s| s.weight_buffer.buffer_id)
            .collect::<Vec<_>>(),
    );
    w.write_u32_array(
        "WEIGHTBUFFEROFFSETS",
        &primitive
            .joint_weight_sets
            .iter()
            .map(|s| s.weight_buffer.byte_offset)
            .collect::<Vec<_>>(),
    );

    w.write_u32("MORPHTARGETCOUNT", primitive.morph_targets.len() as u32);
    w.write_u32_array(
        "MORPHTARGETS",
        &primitive.morph_targets.iter().map(|m| m.morph_target_id).collect::<Vec<_>>(),
    );
    w.write_f32_array(
        "MORPHWEIGHTS",
        &primitive.morph_targets.iter().map(|m| m.weight).collect::<Vec<_>>(),
    );
    let _ = w.end_scope();
}

fn write_morph_target(w: &mut DasWriter, morph: &MorphTarget) {
    w.begin_scope("MORPHTARGET");
    w.write_u32("VERTEXBUFFERID", morph.vertex_buffer.buffer_id);
    w.write_u32("VERTEXBUFFEROFFSET", morph.vertex_buffer.byte_offset);
    if let Some(normal) = morph.vertex_normal_buffer {
        w.write_u32("NORMALBUFFERID", normal.buffer_id);
        w.write_u32("NORMALBUFFEROFFSET", normal.byte_offset);
    }
    if let Some(tangent) = morph.vertex_tangent_buffer {
        w.write_u32("TANGENTBUFFERID", tangent.buffer_id);
        w.write_u32("TANGENTBUFFEROFFSET", tangent.byte_offset);
    }
    w.write_u32("TEXTURECOUNT", morph.uv_sets.len() as u32);
    w.write_u32_array(
        "UVBUFFERIDS",
        &morph.uv_sets.iter().map(|s| s.buffer.buffer_id).collect::<Vec<_>>(),
    );
    w.write_u32_array(
        "UVBUFFEROFFSETS",
        &morph.uv_sets.iter().map(|s| s.buffer.byte_offset).collect::<Vec<_>>(),
    );
    w.write_u32("COLORMULCOUNT", morph.color_multiplier_buffers.len() as u32);
    w.write_u32_array(
        "COLORMULBUFFERIDS",
        &morph.color_multiplier_buffers.iter().map(|b| b.buffer_id).collect::<Vec<_>>(),
    );
    let _ = w.end_scope();
}

fn write_mesh(w: &mut DasWriter, mesh: &Mesh) {
    w.begin_scope("MESH");
    w.write_string("NAME", &mesh.name);
    w.write_u32("PRIMITIVECOUNT", mesh.primitive_ids.len() as u32);
    w.write_u32_array("PRIMITIVES", &mesh.primitive_ids);
    let _ = w.end_scope();
}

fn write_node(w: &mut DasWriter, node: &Node) {
    w.begin_scope("NODE");
    w.write_string("NAME", &node.name);
    w.write_u32("CHILDRENCOUNT", node.children.len() as u32);
    w.write_u32_array("CHILDREN", &node.children);
    w.write_u32("MESH", node.mesh_id.unwrap_or(u32::MAX));
    w.write_u32("SKELETON", node.skeleton_id.unwrap_or(u32::MAX));
    w.write_matrix("TRANSFORM", node.transform);
    let _ = w.end_scope();
}

fn write_scene(w: &mut DasWriter, scene: &Scene) {
    w.begin_scope("SCENE");
    w.write_string("NAME", &scene.name);
    w.write_u32("NODECOUNT", scene.node_ids.len() as u32);
    w.write_u32_array("NODES", &scene.node_ids);
    let _ = w.end_scope();
}

fn write_skeleton(w: &mut DasWriter, skeleton: &Skeleton) {
    w.begin_scope("SKELETON");
    w.write_string("NAME", &skeleton.name);
    w.write_u32("PARENT", skeleton.parent_node_id.unwrap_or(u32::MAX));
    w.write_u32("JOINTCOUNT", skeleton.joint_ids.len() as u32);
    w.write_u32_array("JOINTS", &skeleton.joint_ids);
    let _ = w.end_scope();
}

fn write_skeleton_joint(w: &mut DasWriter, joint: &SkeletonJoint) {
    w.begin_scope("SKELETONJOINT");
    w.write_matrix("INVERSEBINDPOS", joint.inverse_bind_pose);
    w.write_f32("SCALE", joint.scale);
    w.write_f32_array(
        "ROTATION",
        &[joint.rotation.x, joint.rotation.y, joint.rotation.z, joint.rotation.w],
    );
    w.write_f32_array(
        "TRANSLATION",
        &[joint.translation.x, joint.translation.y, joint.translation.z],
    );
    w.write_string("NAME", &joint.name);
    w.write_u32("CHILDRENCOUNT", joint.children.len() as u32);
    w.write_u32_array("CHILDREN", &joint.children);
    let _ = w.end_scope();
}

fn write_animation(w: &mut DasWriter, animation: &Animation) {
    w.begin_scope("ANIMATION");
    w.write_string("NAME", &animation.name);
    w.write_u32("CHANNELCOUNT", animation.channel_ids.len() as u32);
    w.write_u32_array("CHANNELS", &animation.channel_ids);
    let _ = w.end_scope();
}

fn write_animation_channel(w: &mut DasWriter, channel: &AnimationChannel) {
    w.begin_scope("ANIMATIONCHANNEL");
    match channel.owner {
        AnimationChannelOwner::Node(id) => w.write_u32("NODEID", id),
        AnimationChannelOwner::Joint(id) => w.write_u32("JOINTID", id),
    }
    w.write_u8(
        "TARGET",
        match channel.target {
            AnimationTarget::Weights => 0,
            AnimationTarget::Translation => 1,
            AnimationTarget::Rotation => 2,
            AnimationTarget::Scale => 3,
        },
    );
    w.write_u8(
        "INTERPOLATION",
        match channel.interpolation {
            Interpolation::Linear => 0,
            Interpolation::Step => 1,
            Interpolation::CubicSpline => 2,
        },
    );
    w.write_u32("KEYFRAMECOUNT", channel.keyframe_count);
    w.write_u32("WEIGHTCOUNT", channel.weight_count);
    w.write_f32_array("KEYFRAMES", &channel.keyframes);
    if let Some(tangents) = &channel.tangents {
        w.write_f32_array("TANGENTS", tangents);
    }
    w.write_f32_array("TARGETVALUES", &channel.target_values);
    let _ = w.end_scope();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_has_magic_and_zero_padding() {
        let model = DasModel::new(Properties::default());
        let bytes = write_model(&model);
        assert_eq!(&bytes[0..4], &MAGIC.to_le_bytes());
        assert_eq!(&bytes[4..16], &[0u8; 12]);
    }

    #[test]
    fn properties_scope_contains_model_name() {
        let props = Properties {
            model_name: "test".into(),
            ..Default::default()
        };
        let model = DasModel::new(props);
        let bytes = write_model(&model);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("PROPERTIES"));
        assert!(text.contains("MODEL: \"test\""));
        assert!(text.contains("ENDSCOPE"));
    }
}
