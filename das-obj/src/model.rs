//! Parsed Wavefront OBJ intermediate model (C8), before lowering to DAS.

use glam::{Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceVertex {
    pub position: usize,
    pub uv: Option<usize>,
    pub normal: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Face {
    pub vertices: Vec<FaceVertex>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointPrimitive {
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub name: String,
    pub faces: Vec<Face>,
    pub points: Vec<PointPrimitive>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjModel {
    /// `(x, y, z, w)`; `w` always stored, defaulting to `1.0` when absent.
    pub positions: Vec<Vec4>,
    /// `(u, v, w)`; `v`/`w` default to `0.0`.
    pub uvs: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub params: Vec<Vec3>,
    pub groups: Vec<Group>,
}
