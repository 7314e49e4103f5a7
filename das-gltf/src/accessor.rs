//! Accessor data gathering (§4.9.3 Step 3): resolves a glTF accessor to a
//! tightly packed `f32` or `u32` stream, flattening out any buffer-view
//! byte stride along the way.

use crate::error::{GltfError, Result};
use crate::root::{Accessor, BufferView, GLTFRoot};

const COMPONENT_TYPE_BYTE: u32 = 5120;
const COMPONENT_TYPE_UNSIGNED_BYTE: u32 = 5121;
const COMPONENT_TYPE_SHORT: u32 = 5122;
const COMPONENT_TYPE_UNSIGNED_SHORT: u32 = 5123;
const COMPONENT_TYPE_UNSIGNED_INT: u32 = 5125;
const COMPONENT_TYPE_FLOAT: u32 = 5126;

pub fn components_for_type(path: &str, index: usize, accessor_type: &str) -> Result<usize> {
    match accessor_type {
        "SCALAR" => Ok(1),
        "VEC2" => Ok(2),
        "VEC3" => Ok(3),
        "VEC4" => Ok(4),
        "MAT2" => Ok(4),
        "MAT3" => Ok(9),
        "MAT4" => Ok(16),
        other => Err(GltfError::InvalidAccessor {
            path: path.into(),
            index,
            reason: format!("unrecognised accessor type `{other}`"),
        }),
    }
}

fn component_byte_size(component_type: u32) -> usize {
    match component_type {
        COMPONENT_TYPE_BYTE | COMPONENT_TYPE_UNSIGNED_BYTE => 1,
        COMPONENT_TYPE_SHORT | COMPONENT_TYPE_UNSIGNED_SHORT => 2,
        COMPONENT_TYPE_UNSIGNED_INT | COMPONENT_TYPE_FLOAT => 4,
        _ => 4,
    }
}

/// Returns a tightly packed array of `f32` values, `count * components`
/// long, casting from whatever component type the accessor declares.
pub fn read_floats(path: &str, root: &GLTFRoot, buffers: &[Vec<u8>], index: usize) -> Result<Vec<f32>> {
    let accessor = root.accessors.get(index).ok_or_else(|| GltfError::InvalidAccessor {
        path: path.into(),
        index,
        reason: "accessor index out of range".into(),
    })?;
    let components = components_for_type(path, index, &accessor.accessor_type)?;
    let raw = read_raw(path, root, buffers, accessor, index)?;
    let elem_size = component_byte_size(accessor.component_type);

    let mut out = Vec::with_capacity(accessor.count * components);
    for i in 0..accessor.count * components {
        let offset = i * elem_size;
        let chunk = raw.get(offset..offset + elem_size).ok_or_else(|| GltfError::InvalidAccessor {
            path: path.into(),
            index,
            reason: "accessor reads past end of buffer view".into(),
        })?;
        let value = match accessor.component_type {
            COMPONENT_TYPE_FLOAT => f32::from_le_bytes(chunk.try_into().unwrap()),
            COMPONENT_TYPE_BYTE => chunk[0] as i8 as f32,
            COMPONENT_TYPE_UNSIGNED_BYTE => {
                let raw = chunk[0] as f32;
                if accessor.normalized {
                    raw / 255.0
                } else {
                    raw
                }
            }
            COMPONENT_TYPE_SHORT => i16::from_le_bytes(chunk.try_into().unwrap()) as f32,
            COMPONENT_TYPE_UNSIGNED_SHORT => {
                let raw = u16::from_le_bytes(chunk.try_into().unwrap()) as f32;
                if accessor.normalized {
                    raw / 65535.0
                } else {
                    raw
                }
            }
            COMPONENT_TYPE_UNSIGNED_INT => u32::from_le_bytes(chunk.try_into().unwrap()) as f32,
            other => {
                return Err(GltfError::InvalidAccessor {
                    path: path.into(),
                    index,
                    reason: format!("unsupported componentType {other}"),
                })
            }
        };
        out.push(value);
    }
    Ok(out)
}

/// Returns indices widened to `u32`, regardless of the accessor's source
/// component type (glTF indices are `u8`, `u16`, or `u32`).
pub fn read_indices(path: &str, root: &GLTFRoot, buffers: &[Vec<u8>], index: usize) -> Result<Vec<u32>> {
    let accessor = root.accessors.get(index).ok_or_else(|| GltfError::InvalidAccessor {
        path: path.into(),
        index,
        reason: "accessor index out of range".into(),
    })?;
    let raw = read_raw(path, root, buffers, accessor, index)?;
    let elem_size = component_byte_size(accessor.component_type);
    let mut out = Vec::with_capacity(accessor.count);
    for i in 0..accessor.count {
        let offset = i * elem_size;
        let chunk = &raw[offset..offset + elem_size];
        let value = match accessor.component_type {
            COMPONENT_TYPE_UNSIGNED_BYTE => chunk[0] as u32,
            COMPONENT_TYPE_UNSIGNED_SHORT => u16::from_le_bytes(chunk.try_into().unwrap()) as u32,
            COMPONENT_TYPE_UNSIGNED_INT => u32::from_le_bytes(chunk.try_into().unwrap()),
            other => {
                return Err(GltfError::InvalidAccessor {
                    path: path.into(),
                    index,
                    reason: format!("unsupported index componentType {other}"),
                })
            }
        };
        out.push(value);
    }
    Ok(out)
}

/// Gathers an accessor's element-sized records into a tightly packed byte
/// buffer, undoing any `bufferView.byteStride`.
fn read_raw(path: &str, root: &GLTFRoot, buffers: &[Vec<u8>], accessor: &Accessor, index: usize) -> Result<Vec<u8>> {
    let view_index = accessor.buffer_view.ok_or_else(|| GltfError::MissingField {
        path: path.into(),
        context: format!("accessor {index}"),
        field: "bufferView".into(),
    })?;
    let view: &BufferView = root.buffer_views.get(view_index).ok_or_else(|| GltfError::InvalidAccessor {
        path: path.into(),
        index,
        reason: "bufferView index out of range".into(),
    })?;
    let buffer = buffers.get(view.buffer).ok_or_else(|| GltfError::InvalidAccessor {
        path: path.into(),
        index,
        reason: "buffer index out of range".into(),
    })?;

    let components = components_for_type(path, index, &accessor.accessor_type)?;
    let elem_size = component_byte_size(accessor.component_type);
    let tight_stride = components * elem_size;
    let stride = view.byte_stride.unwrap_or(tight_stride);
    let base = view.byte_offset + accessor.byte_offset;

    let mut out = Vec::with_capacity(accessor.count * tight_stride);
    for i in 0..accessor.count {
        let start = base + i * stride;
        let end = start + tight_stride;
        let chunk = buffer.get(start..end).ok_or_else(|| GltfError::InvalidAccessor {
            path: path.into(),
            index,
            reason: "accessor element is out of buffer bounds".into(),
        })?;
        out.extend_from_slice(chunk);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::{Accessor, BufferView};

    fn root_with_accessor(accessor: Accessor, view: BufferView) -> GLTFRoot {
        GLTFRoot {
            accessors: vec![accessor],
            buffer_views: vec![view],
            ..Default::default()
        }
    }

    #[test]
    fn reads_tightly_packed_floats() {
        let mut data = Vec::new();
        for v in [1.0f32, 2.0, 3.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let root = root_with_accessor(
            Accessor {
                buffer_view: Some(0),
                component_type: COMPONENT_TYPE_FLOAT,
                count: 3,
                accessor_type: "SCALAR".into(),
                ..Default::default()
            },
            BufferView {
                buffer: 0,
                byte_length: data.len(),
                ..Default::default()
            },
        );
        let floats = read_floats("t.gltf", &root, &[data], 0).unwrap();
        assert_eq!(floats, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn reads_strided_vec3_floats() {
        // Two VEC3 floats packed with a 24-byte stride (extra 12 bytes of
        // unrelated interleaved data between each position).
        let mut data = Vec::new();
        let push_vec3 = |data: &mut Vec<u8>, v: [f32; 3]| {
            for f in v {
                data.extend_from_slice(&f.to_le_bytes());
            }
        };
        push_vec3(&mut data, [1.0, 2.0, 3.0]);
        data.extend_from_slice(&[0u8; 12]);
        push_vec3(&mut data, [4.0, 5.0, 6.0]);
        data.extend_from_slice(&[0u8; 12]);

        let root = root_with_accessor(
            Accessor {
                buffer_view: Some(0),
                component_type: COMPONENT_TYPE_FLOAT,
                count: 2,
                accessor_type: "VEC3".into(),
                ..Default::default()
            },
            BufferView {
                buffer: 0,
                byte_length: data.len(),
                byte_stride: Some(24),
                ..Default::default()
            },
        );
        let floats = read_floats("t.gltf", &root, &[data], 0).unwrap();
        assert_eq!(floats, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn unrecognised_accessor_type_errors() {
        let root = root_with_accessor(
            Accessor {
                buffer_view: Some(0),
                component_type: COMPONENT_TYPE_FLOAT,
                count: 1,
                accessor_type: "VEC5".into(),
                ..Default::default()
            },
            BufferView {
                buffer: 0,
                byte_length: 4,
                ..Default::default()
            },
        );
        let data = vec![0u8; 4];
        assert!(read_floats("t.gltf", &root, &[data], 0).is_err());
    }

    #[test]
    fn reads_u16_indices_widened_to_u32() {
        let mut data = Vec::new();
        for v in [0u16, 1, 2] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let root = root_with_accessor(
            Accessor {
                buffer_view: Some(0),
                component_type: COMPONENT_TYPE_UNSIGNED_SHORT,
                count: 3,
                accessor_type: "SCALAR".into(),
                ..Default::default()
            },
            BufferView {
                buffer: 0,
                byte_length: data.len(),
                ..Default::default()
            },
        );
        let indices = read_indices("t.gltf", &root, &[data], 0).unwrap();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
