//! Parsed STL intermediate model: one or more named solids, each a flat
//! list of triangular facets.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub normal: Vec3,
    pub vertices: [Vec3; 3],
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solid {
    pub name: String,
    pub facets: Vec<Facet>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StlModel {
    pub solids: Vec<Solid>,
}
