//! Typed glTF document model, built by lowering a parsed [`JsonValue`] tree.

use std::collections::BTreeMap;

use crate::error::{GltfError, Result};
use crate::json::JsonValue;

const SUPPORTED_EXTENSIONS: &[&str] = &[];

#[derive(Debug, Clone, Default)]
pub struct Asset {
    pub generator: Option<String>,
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Accessor {
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub component_type: u32,
    pub normalized: bool,
    pub count: usize,
    pub accessor_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct GltfBuffer {
    pub uri: Option<String>,
    pub byte_length: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Image {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub buffer_view: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub source: Option<usize>,
    pub sampler: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Sampler {
    pub mag_filter: Option<u32>,
    pub min_filter: Option<u32>,
    pub wrap_s: u32,
    pub wrap_t: u32,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<usize>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            double_sided: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CameraProjection {
    Perspective { yfov: f32, znear: f32, zfar: Option<f32>, aspect_ratio: Option<f32> },
    Orthographic { xmag: f32, ymag: f32, znear: f32, zfar: f32 },
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub name: Option<String>,
    pub projection: CameraProjection,
}

#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: u32,
    pub targets: Vec<BTreeMap<String, usize>>,
}

#[derive(Debug, Clone, Default)]
pub struct GltfMesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct GltfNode {
    pub name: Option<String>,
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub matrix: Option<[f32; 16]>,
}

impl GltfNode {
    pub fn new_default_transform() -> Self {
        Self {
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationChannelTarget {
    pub node: Option<usize>,
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationChannel {
    pub sampler: usize,
    pub target: AnimationChannelTarget,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationSampler {
    pub input: usize,
    pub output: usize,
    pub interpolation: String,
}

#[derive(Debug, Clone, Default)]
pub struct GltfAnimation {
    pub name: Option<String>,
    pub channels: Vec<AnimationChannel>,
    pub samplers: Vec<AnimationSampler>,
}

#[derive(Debug, Clone, Default)]
pub struct GltfScene {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct GLTFRoot {
    pub asset: Asset,
    pub accessors: Vec<Accessor>,
    pub buffer_views: Vec<BufferView>,
    pub buffers: Vec<GltfBuffer>,
    pub images: Vec<Image>,
    pub textures: Vec<Texture>,
    pub samplers: Vec<Sampler>,
    pub materials: Vec<Material>,
    pub cameras: Vec<Camera>,
    pub meshes: Vec<GltfMesh>,
    pub nodes: Vec<GltfNode>,
    pub skins: Vec<Skin>,
    pub animations: Vec<GltfAnimation>,
    pub scenes: Vec<GltfScene>,
    pub scene: Option<usize>,
}

pub fn lower(path: &str, root: &JsonValue) -> Result<GLTFRoot> {
    if let Some(required) = root.get("extensionsRequired").and_then(|v| v.as_array()) {
        for ext in required {
            let name = ext.as_str().unwrap_or_default();
            if !SUPPORTED_EXTENSIONS.contains(&name) {
                return Err(GltfError::UnsupportedExtension {
                    path: path.into(),
                    name: name.into(),
                });
            }
        }
    }

    let asset = root
        .get("asset")
        .map(|a| Asset {
            generator: a.get("generator").and_then(|v| v.as_str()).map(String::from),
            copyright: a.get("copyright").and_then(|v| v.as_str()).map(String::from),
        })
        .unwrap_or_default();

    let accessors = array_of(root, "accessors", |v| Accessor {
        buffer_view: v.get("bufferView").and_then(|x| x.as_u64()).map(|x| x as usize),
        byte_offset: v.get("byteOffset").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
        component_type: v.get("componentType").and_then(|x| x.as_u64()).unwrap_or(0) as u32,
        normalized: matches!(v.get("normalized"), Some(JsonValue::Bool(true))),
        count: v.get("count").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
        accessor_type: v.get("type").and_then(|x| x.as_str()).unwrap_or_default().to_string(),
    });

    let buffer_views = array_of(root, "bufferViews", |v| BufferView {
        buffer: v.get("buffer").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
        byte_offset: v.get("byteOffset").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
        byte_length: v.get("byteLength").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
        byte_stride: v.get("byteStride").and_then(|x| x.as_u64()).map(|x| x as usize),
    });

    let buffers = array_of(root, "buffers", |v| GltfBuffer {
        uri: v.get("uri").and_then(|x| x.as_str()).map(String::from),
        byte_length: v.get("byteLength").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
    });

    let images = array_of(root, "images", |v| Image {
        uri: v.get("uri").and_then(|x| x.as_str()).map(String::from),
        mime_type: v.get("mimeType").and_then(|x| x.as_str()).map(String::from),
        buffer_view: v.get("bufferView").and_then(|x| x.as_u64()).map(|x| x as usize),
    });

    let textures = array_of(root, "textures", |v| Texture {
        source: v.get("source").and_then(|x| x.as_u64()).map(|x| x as usize),
        sampler: v.get("sampler").and_then(|x| x.as_u64()).map(|x| x as usize),
    });

    let samplers = array_of(root, "samplers", |v| Sampler {
        mag_filter: v.get("magFilter").and_then(|x| x.as_u64()).map(|x| x as u32),
        min_filter: v.get("minFilter").and_then(|x| x.as_u64()).map(|x| x as u32),
        wrap_s: v.get("wrapS").and_then(|x| x.as_u64()).unwrap_or(10497) as u32,
        wrap_t: v.get("wrapT").and_then(|x| x.as_u64()).unwrap_or(10497) as u32,
    });

    let materials = array_of(root, "materials", |v| {
        let pbr = v.get("pbrMetallicRoughness");
        let base_color_factor = pbr
            .and_then(|p| p.get("baseColorFactor"))
            .map(|c| vec4_or(Some(c), [1.0, 1.0, 1.0, 1.0]))
            .unwrap_or([1.0, 1.0, 1.0, 1.0]);
        let base_color_texture = pbr
            .and_then(|p| p.get("baseColorTexture"))
            .and_then(|t| t.get("index"))
            .and_then(|x| x.as_u64())
            .map(|x| x as usize);
        Material {
            name: v.get("name").and_then(|x| x.as_str()).map(String::from),
            base_color_factor,
            base_color_texture,
            metallic_factor: pbr.and_then(|p| p.get("metallicFactor")).and_then(|x| x.as_f64()).unwrap_or(1.0) as f32,
            roughness_factor: pbr.and_then(|p| p.get("roughnessFactor")).and_then(|x| x.as_f64()).unwrap_or(1.0) as f32,
            double_sided: matches!(v.get("doubleSided"), Some(JsonValue::Bool(true))),
        }
    });

    let cameras = array_of(root, "cameras", |v| {
        let camera_type = v.get("type").and_then(|x| x.as_str()).unwrap_or("perspective");
        let projection = if camera_type == "orthographic" {
            let ortho = v.get("orthographic");
            CameraProjection::Orthographic {
                xmag: ortho.and_then(|o| o.get("xmag")).and_then(|x| x.as_f64()).unwrap_or(1.0) as f32,
                ymag: ortho.and_then(|o| o.get("ymag")).and_then(|x| x.as_f64()).unwrap_or(1.0) as f32,
                znear: ortho.and_then(|o| o.get("znear")).and_then(|x| x.as_f64()).unwrap_or(0.0) as f32,
                zfar: ortho.and_then(|o| o.get("zfar")).and_then(|x| x.as_f64()).unwrap_or(0.0) as f32,
            }
        } else {
            let persp = v.get("perspective");
            CameraProjection::Perspective {
                yfov: persp.and_then(|p| p.get("yfov")).and_then(|x| x.as_f64()).unwrap_or(0.0) as f32,
                znear: persp.and_then(|p| p.get("znear")).and_then(|x| x.as_f64()).unwrap_or(0.0) as f32,
                zfar: persp.and_then(|p| p.get("zfar")).and_then(|x| x.as_f64()).map(|x| x as f32),
                aspect_ratio: persp.and_then(|p| p.get("aspectRatio")).and_then(|x| x.as_f64()).map(|x| x as f32),
            }
        };
        Camera {
            name: v.get("name").and_then(|x| x.as_str()).map(String::from),
            projection,
        }
    });

    let meshes = array_of(root, "meshes", |v| GltfMesh {
        name: v.get("name").and_then(|x| x.as_str()).map(String::from),
        primitives: array_of(v, "primitives", |p| Primitive {
            attributes: p
                .get("attributes")
                .and_then(|a| a.as_object())
                .map(|o| o.iter().filter_map(|(k, val)| val.as_u64().map(|n| (k.clone(), n as usize))).collect())
                .unwrap_or_default(),
            indices: p.get("indices").and_then(|x| x.as_u64()).map(|x| x as usize),
            material: p.get("material").and_then(|x| x.as_u64()).map(|x| x as usize),
            mode: p.get("mode").and_then(|x| x.as_u64()).unwrap_or(4) as u32,
            targets: p
                .get("targets")
                .and_then(|t| t.as_array())
                .map(|arr| {
                    arr.iter()
                        .map(|t| {
                            t.as_object()
                                .map(|o| o.iter().filter_map(|(k, val)| val.as_u64().map(|n| (k.clone(), n as usize))).collect())
                                .unwrap_or_default()
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }),
        weights: v
            .get("weights")
            .and_then(|w| w.as_array())
            .map(|arr| arr.iter().filter_map(|x| x.as_f64().map(|n| n as f32)).collect())
            .unwrap_or_default(),
    });

    let nodes = array_of(root, "nodes", |v| {
        let matrix = v.get("matrix").and_then(|m| m.as_array()).map(|arr| {
            let mut out = [0.0f32; 16];
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = arr.get(i).and_then(|x| x.as_f64()).unwrap_or(0.0) as f32;
            }
            out
        });
        GltfNode {
            name: v.get("name").and_then(|x| x.as_str()).map(String::from),
            children: array_of(v, "children", |c| c.as_f64().unwrap_or(0.0) as usize),
            mesh: v.get("mesh").and_then(|x| x.as_u64()).map(|x| x as usize),
            skin: v.get("skin").and_then(|x| x.as_u64()).map(|x| x as usize),
            translation: vec3_or(v.get("translation"), [0.0, 0.0, 0.0]),
            rotation: vec4_or(v.get("rotation"), [0.0, 0.0, 0.0, 1.0]),
            scale: vec3_or(v.get("scale"), [1.0, 1.0, 1.0]),
            matrix,
        }
    });

    let skins = array_of(root, "skins", |v| Skin {
        joints: array_of(v, "joints", |j| j.as_f64().unwrap_or(0.0) as usize),
        inverse_bind_matrices: v.get("inverseBindMatrices").and_then(|x| x.as_u64()).map(|x| x as usize),
        skeleton: v.get("skeleton").and_then(|x| x.as_u64()).map(|x| x as usize),
        name: v.get("name").and_then(|x| x.as_str()).map(String::from),
    });

    let animations = array_of(root, "animations", |v| GltfAnimation {
        name: v.get("name").and_then(|x| x.as_str()).map(String::from),
        channels: array_of(v, "channels", |c| AnimationChannel {
            sampler: c.get("sampler").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
            target: c
                .get("target")
                .map(|t| AnimationChannelTarget {
                    node: t.get("node").and_then(|x| x.as_u64()).map(|x| x as usize),
                    path: t.get("path").and_then(|x| x.as_str()).unwrap_or_default().to_string(),
                })
                .unwrap_or_default(),
        }),
        samplers: array_of(v, "samplers", |s| AnimationSampler {
            input: s.get("input").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
            output: s.get("output").and_then(|x| x.as_u64()).unwrap_or(0) as usize,
            interpolation: s.get("interpolation").and_then(|x| x.as_str()).unwrap_or("LINEAR").to_string(),
        }),
    });

    let scenes = array_of(root, "scenes", |v| GltfScene {
        name: v.get("name").and_then(|x| x.as_str()).map(String::from),
        nodes: array_of(v, "nodes", |n| n.as_f64().unwrap_or(0.0) as usize),
    });

    let scene = root.get("scene").and_then(|x| x.as_u64()).map(|x| x as usize);

    Ok(GLTFRoot {
        asset,
        accessors,
        buffer_views,
        buffers,
        images,
        textures,
        samplers,
        materials,
        cameras,
        meshes,
        nodes,
        skins,
        animations,
        scenes,
        scene,
    })
}

fn array_of<T>(value: &JsonValue, key: &str, mut f: impl FnMut(&JsonValue) -> T) -> Vec<T> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().map(|item| f(item)).collect())
        .unwrap_or_default()
}

fn vec3_or(value: Option<&JsonValue>, default: [f32; 3]) -> [f32; 3] {
    match value.and_then(|v| v.as_array()) {
        Some(arr) if arr.len() == 3 => [
            arr[0].as_f64().unwrap_or(0.0) as f32,
            arr[1].as_f64().unwrap_or(0.0) as f32,
            arr[2].as_f64().unwrap_or(0.0) as f32,
        ],
        _ => default,
    }
}

fn vec4_or(value: Option<&JsonValue>, default: [f32; 4]) -> [f32; 4] {
    match value.and_then(|v| v.as_array()) {
        Some(arr) if arr.len() == 4 => [
            arr[0].as_f64().unwrap_or(0.0) as f32,
            arr[1].as_f64().unwrap_or(0.0) as f32,
            arr[2].as_f64().unwrap_or(0.0) as f32,
            arr[3].as_f64().unwrap_or(0.0) as f32,
        ],
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse;

    #[test]
    fn lowers_minimal_document() {
        let text = r#"{
            "asset": {"generator": "test"},
            "accessors": [{"componentType": 5126, "count": 3, "type": "VEC3"}],
            "nodes": [{"name": "root", "children": [1]}, {"name": "child"}],
            "scenes": [{"nodes": [0]}],
            "scene": 0
        }"#;
        let json = parse("t.gltf", text).unwrap();
        let root = lower("t.gltf", &json).unwrap();
        assert_eq!(root.asset.generator.as_deref(), Some("test"));
        assert_eq!(root.accessors[0].count, 3);
        assert_eq!(root.nodes[0].children, vec![1]);
        assert_eq!(root.scene, Some(0));
    }

    #[test]
    fn lowers_samplers_materials_and_cameras() {
        let text = r#"{
            "samplers": [{"magFilter": 9728, "wrapS": 33071}],
            "materials": [{"name": "mat", "pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0], "metallicFactor": 0.2}}],
            "cameras": [{"type": "perspective", "perspective": {"yfov": 0.8, "znear": 0.1}}]
        }"#;
        let json = parse("t.gltf", text).unwrap();
        let root = lower("t.gltf", &json).unwrap();
        assert_eq!(root.samplers[0].mag_filter, Some(9728));
        assert_eq!(root.samplers[0].wrap_s, 33071);
        assert_eq!(root.materials[0].name.as_deref(), Some("mat"));
        assert_eq!(root.materials[0].base_color_factor, [1.0, 0.0, 0.0, 1.0]);
        match root.cameras[0].projection {
            CameraProjection::Perspective { yfov, znear, .. } => {
                assert_eq!(yfov, 0.8);
                assert_eq!(znear, 0.1);
            }
            _ => panic!("expected perspective projection"),
        }
    }

    #[test]
    fn unsupported_required_extension_errors() {
        let text = r#"{"extensionsRequired": ["KHR_made_up"]}"#;
        let json = parse("t.gltf", text).unwrap();
        assert!(lower("t.gltf", &json).is_err());
    }
}
