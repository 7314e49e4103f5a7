//! The in-memory DAS scene graph (spec §3): properties, buffers, mesh
//! primitives, morph targets, meshes, nodes, skeletons and their joints,
//! animations and scenes.

use glam::{Quat, Vec2, Vec3, Vec4};

use crate::buffer_type::BufferType;

/// File-level metadata, one per model.
#[derive(Debug, Clone, PartialEq)]
pub struct Properties {
    pub model_name: String,
    pub author: String,
    pub copyright: String,
    /// Seconds since epoch.
    pub modification_timestamp: u64,
    pub default_scene_index: u32,
    pub compression_flag: bool,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            model_name: String::new(),
            author: String::new(),
            copyright: String::new(),
            modification_timestamp: 0,
            default_scene_index: 0,
            compression_flag: false,
        }
    }
}

/// An opaque byte payload tagged with a [`BufferType`] bitset.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub buffer_type: BufferType,
    pub data: Vec<u8>,
}

impl Buffer {
    pub fn new(buffer_type: BufferType, data: Vec<u8>) -> Self {
        Self { buffer_type, data }
    }

    pub fn byte_length(&self) -> u32 {
        self.data.len() as u32
    }
}

/// A buffer id plus a byte offset into it, the recurring `(buffer, offset)`
/// pair used throughout mesh primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRef {
    pub buffer_id: u32,
    pub byte_offset: u32,
}

/// One UV set: the attribute stream plus the texture it samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UvSet {
    pub buffer: BufferRef,
    pub texture_id: u32,
}

/// One skinning set: parallel joint-index and joint-weight buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointWeightSet {
    pub joint_buffer: BufferRef,
    pub weight_buffer: BufferRef,
}

/// A morph target contribution with its blend weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphTargetRef {
    pub morph_target_id: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshPrimitive {
    pub index_buffer: Option<BufferRef>,
    pub indices_count: u32,
    pub vertex_buffer: BufferRef,
    pub vertex_normal_buffer: Option<BufferRef>,
    pub vertex_tangent_buffer: Option<BufferRef>,
    pub uv_sets: Vec<UvSet>,
    pub color_multiplier_buffers: Vec<BufferRef>,
    pub joint_weight_sets: Vec<JointWeightSet>,
    pub morph_targets: Vec<MorphTargetRef>,
}

impl Default for BufferRef {
    fn default() -> Self {
        Self {
            buffer_id: 0,
            byte_offset: 0,
        }
    }
}

/// Same shape as [`MeshPrimitive`] minus the index stream and skinning data:
/// a morph target only ever contributes positional/attribute deltas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MorphTarget {
    pub vertex_buffer: BufferRef,
    pub vertex_normal_buffer: Option<BufferRef>,
    pub vertex_tangent_buffer: Option<BufferRef>,
    pub uv_sets: Vec<UvSet>,
    pub color_multiplier_buffers: Vec<BufferRef>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: String,
    pub primitive_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub children: Vec<u32>,
    pub mesh_id: Option<u32>,
    pub skeleton_id: Option<u32>,
    /// Row-major 4x4 transform.
    pub transform: glam::Mat4,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            children: Vec::new(),
            mesh_id: None,
            skeleton_id: None,
            transform: glam::Mat4::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub name: String,
    pub node_ids: Vec<u32>,
    /// Nodes in `node_ids` that no other node in this scene lists as a child.
    pub roots: Vec<u32>,
}

impl Scene {
    /// Recomputes `roots` from `node_ids` against the full node array: a
    /// node is a root unless some other node in the scene claims it as a
    /// child.
    pub fn derive_roots(&mut self, nodes: &[Node]) {
        let mut is_child = std::collections::HashSet::new();
        for &id in &self.node_ids {
            if let Some(node) = nodes.get(id as usize) {
                is_child.extend(node.children.iter().copied());
            }
        }
        self.roots = self
            .node_ids
            .iter()
            .copied()
            .filter(|id| !is_child.contains(id))
            .collect();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonJoint {
    pub inverse_bind_pose: glam::Mat4,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub name: String,
    pub children: Vec<u32>,
}

impl Default for SkeletonJoint {
    fn default() -> Self {
        Self {
            inverse_bind_pose: glam::Mat4::IDENTITY,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            name: String::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skeleton {
    pub name: String,
    pub parent_node_id: Option<u32>,
    pub joint_ids: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTarget {
    Weights,
    Translation,
    Rotation,
    Scale,
}

impl AnimationTarget {
    /// Number of `f32`s per keyframe for this target; channel arrays are
    /// sized `keyframe_count * stride`.
    pub fn stride(self, weight_count: u32) -> u32 {
        match self {
            AnimationTarget::Weights => weight_count,
            AnimationTarget::Translation | AnimationTarget::Scale => 3,
            AnimationTarget::Rotation => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    CubicSpline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationChannelOwner {
    Node(u32),
    Joint(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationChannel {
    pub owner: AnimationChannelOwner,
    pub target: AnimationTarget,
    pub interpolation: Interpolation,
    pub keyframe_count: u32,
    pub weight_count: u32,
    pub keyframes: Vec<f32>,
    pub target_values: Vec<f32>,
    /// Present iff `interpolation == CubicSpline`; carries interleaved
    /// in/out tangent pairs, one pair per keyframe per stride element.
    pub tangents: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Animation {
    pub name: String,
    pub channel_ids: Vec<u32>,
}

/// The full parsed/compiled scene graph. Arrays are owned arenas indexed by
/// 32-bit ids; cross-references (e.g. `Node::mesh_id`) are indices into the
/// matching array here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DasModel {
    pub properties: Properties,
    pub buffers: Vec<Buffer>,
    pub mesh_primitives: Vec<MeshPrimitive>,
    pub morph_targets: Vec<MorphTarget>,
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub skeleton_joints: Vec<SkeletonJoint>,
    pub skeletons: Vec<Skeleton>,
    pub animation_channels: Vec<AnimationChannel>,
    pub animations: Vec<Animation>,
    pub scenes: Vec<Scene>,
}

impl DasModel {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    pub fn push_buffer(&mut self, buffer_type: BufferType, data: Vec<u8>) -> u32 {
        let id = self.buffers.len() as u32;
        self.buffers.push(Buffer::new(buffer_type, data));
        id
    }

    /// Recomputes `roots` for every scene against the current node array.
    pub fn derive_all_scene_roots(&mut self) {
        for scene in &mut self.scenes {
            scene.derive_roots(&self.nodes);
        }
    }
}

/// A fully-resolved, cast-to-canonical-type vertex used by the glTF
/// compiler's reindexing pass (§4.9.3 step 4). Stored as raw bit patterns so
/// two attribute sets with identical values hash and compare equal
/// regardless of any NaN payload (vertex data is never actually NaN in
/// practice, but bit-identity is what the original dedup keys on).
#[derive(Debug, Clone, PartialEq)]
pub struct GenericVertexAttribute {
    pub pos: Vec3,
    pub normal: Option<Vec3>,
    pub tangent: Option<Vec4>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub joint_indices: Vec<[u16; 4]>,
    pub joint_weights: Vec<Vec4>,
}

impl GenericVertexAttribute {
    fn key_bits(&self) -> Vec<u8> {
        let mut bits = Vec::new();
        let push_f32 = |bits: &mut Vec<u8>, v: f32| bits.extend_from_slice(&v.to_bits().to_le_bytes());
        push_f32(&mut bits, self.pos.x);
        push_f32(&mut bits, self.pos.y);
        push_f32(&mut bits, self.pos.z);
        if let Some(n) = self.normal {
            bits.push(1);
            push_f32(&mut bits, n.x);
            push_f32(&mut bits, n.y);
            push_f32(&mut bits, n.z);
        } else {
            bits.push(0);
        }
        if let Some(t) = self.tangent {
            bits.push(1);
            for v in [t.x, t.y, t.z, t.w] {
                push_f32(&mut bits, v);
            }
        } else {
            bits.push(0);
        }
        for uv in &self.uvs {
            push_f32(&mut bits, uv.x);
            push_f32(&mut bits, uv.y);
        }
        for c in &self.colors {
            for v in [c.x, c.y, c.z, c.w] {
                push_f32(&mut bits, v);
            }
        }
        for ji in &self.joint_indices {
            for v in ji {
                bits.extend_from_slice(&v.to_le_bytes());
            }
        }
        for jw in &self.joint_weights {
            for v in [jw.x, jw.y, jw.z, jw.w] {
                push_f32(&mut bits, v);
            }
        }
        bits
    }
}

impl std::hash::Hash for GenericVertexAttribute {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key_bits().hash(state);
    }
}

impl Eq for GenericVertexAttribute {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_root_derivation_excludes_children() {
        let nodes = vec![
            Node {
                children: vec![1, 2],
                ..Default::default()
            },
            Node::default(),
            Node {
                children: vec![3],
                ..Default::default()
            },
            Node::default(),
        ];
        let mut scene = Scene {
            node_ids: vec![0, 1, 2, 3],
            ..Default::default()
        };
        scene.derive_roots(&nodes);
        assert_eq!(scene.roots, vec![0]);
    }

    #[test]
    fn generic_vertex_attribute_equal_values_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = GenericVertexAttribute {
            pos: Vec3::new(1.0, 2.0, 3.0),
            normal: None,
            tangent: None,
            uvs: vec![Vec2::new(0.5, 0.5)],
            colors: Vec::new(),
            joint_indices: Vec::new(),
            joint_weights: Vec::new(),
        };
        let b = a.clone();
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }
}
