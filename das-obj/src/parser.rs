//! Line-oriented, directive-dispatched OBJ parser (C8).

use das_core::LineReader;
use glam::{Vec3, Vec4};

use crate::error::{ObjError, Result};
use crate::model::{Face, FaceVertex, Group, ObjModel, PointPrimitive};

/// Directives that parse successfully but contribute no geometry (material
/// libraries, smoothing groups, free-form surface statements and the like).
const IGNORED_DIRECTIVES: &[&str] = &[
    "mtllib", "usemtl", "s", "l", "cstype", "deg", "bmat", "step", "curv", "curv2", "surf", "parm",
    "trim", "hole", "scrv", "sp", "end", "con", "mg", "bevel", "c_interp", "d_interp", "lod",
    "shadow_obj", "trace_obj", "ctech", "stech", "maplib", "usemap",
];

pub fn parse(path: &str, text: &str) -> Result<ObjModel> {
    let mut model = ObjModel::default();
    model.groups.push(Group::default());

    let mut reader = LineReader::new(text.as_bytes().to_vec(), "\n");
    let mut line_no = 0usize;
    let mut named_group_count = 0usize;

    while reader.next_line() {
        line_no += 1;
        let args = reader
            .read_statement_args()
            .map_err(|_| ObjError::IncompleteNewline {
                path: path.to_string(),
                line: line_no,
            })?;
        let Some((keyword, rest)) = args.split_first() else {
            continue;
        };
        if keyword.starts_with('#') {
            continue;
        }

        match keyword.as_str() {
            "v" => parse_position(path, line_no, rest, &mut model)?,
            "vt" => parse_uv(path, line_no, rest, &mut model)?,
            "vn" => parse_normal(path, line_no, rest, &mut model)?,
            "vp" => parse_param(path, line_no, rest, &mut model)?,
            "f" => {
                let face = parse_face(path, line_no, rest, &model)?;
                model.groups.last_mut().unwrap().faces.push(face);
            }
            "p" => {
                let point = parse_point(path, line_no, rest, &model)?;
                model.groups.last_mut().unwrap().points.push(point);
            }
            "g" | "o" => {
                let name = rest.join(" ");
                named_group_count += 1;
                if named_group_count > 1 {
                    log::warn!(
                        "{path}:{line_no}: MultipleObjects: `{keyword}` defines object `{name}`, but this file already declares another object"
                    );
                }
                model.groups.push(Group {
                    name,
                    ..Default::default()
                });
            }
            other if IGNORED_DIRECTIVES.contains(&other) => {
                log::warn!("{path}:{line_no}: UnusedStatement: `{other}` contributes no geometry");
            }
            other => {
                log::warn!("{path}:{line_no}: UnusedStatement: unrecognised directive `{other}`");
            }
        }
    }

    model.groups.retain(|g| !g.faces.is_empty() || !g.points.is_empty());
    Ok(model)
}

fn parse_position(path: &str, line: usize, args: &[String], model: &mut ObjModel) -> Result<()> {
    if args.len() < 3 {
        return Err(ObjError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "v".into(),
            got: args.len(),
            need: 3,
        });
    }
    if args.len() > 4 {
        return Err(ObjError::TooManyAttributes {
            path: path.into(),
            line,
            keyword: "v".into(),
            got: args.len(),
            max: 4,
        });
    }
    let x = parse_f32(path, line, "v", &args[0])?;
    let y = parse_f32(path, line, "v", &args[1])?;
    let z = parse_f32(path, line, "v", &args[2])?;
    let w = if args.len() == 4 {
        parse_f32(path, line, "v", &args[3])?
    } else {
        1.0
    };
    model.positions.push(Vec4::new(x, y, z, w));
    Ok(())
}

fn parse_uv(path: &str, line: usize, args: &[String], model: &mut ObjModel) -> Result<()> {
    if args.is_empty() {
        return Err(ObjError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "vt".into(),
            got: 0,
            need: 1,
        });
    }
    if args.len() > 3 {
        return Err(ObjError::TooManyAttributes {
            path: path.into(),
            line,
            keyword: "vt".into(),
            got: args.len(),
            max: 3,
        });
    }
    let u = parse_f32(path, line, "vt", &args[0])?;
    let v = args.get(1).map(|s| parse_f32(path, line, "vt", s)).transpose()?.unwrap_or(0.0);
    let w = args.get(2).map(|s| parse_f32(path, line, "vt", s)).transpose()?.unwrap_or(0.0);
    model.uvs.push(Vec3::new(u, v, w));
    Ok(())
}

fn parse_normal(path: &str, line: usize, args: &[String], model: &mut ObjModel) -> Result<()> {
    if args.len() != 3 {
        return Err(ObjError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "vn".into(),
            got: args.len(),
            need: 3,
        });
    }
    let x = parse_f32(path, line, "vn", &args[0])?;
    let y = parse_f32(path, line, "vn", &args[1])?;
    let z = parse_f32(path, line, "vn", &args[2])?;
    model.normals.push(Vec3::new(x, y, z));
    Ok(())
}

fn parse_param(path: &str, line: usize, args: &[String], model: &mut ObjModel) -> Result<()> {
    if args.is_empty() {
        return Err(ObjError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "vp".into(),
            got: 0,
            need: 1,
        });
    }
    let u = parse_f32(path, line, "vp", &args[0])?;
    let v = args.get(1).map(|s| parse_f32(path, line, "vp", s)).transpose()?.unwrap_or(0.0);
    let w = args.get(2).map(|s| parse_f32(path, line, "vp", s)).transpose()?.unwrap_or(0.0);
    model.params.push(Vec3::new(u, v, w));
    Ok(())
}

fn parse_face(path: &str, line: usize, args: &[String], model: &ObjModel) -> Result<Face> {
    if args.len() < 3 {
        return Err(ObjError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "f".into(),
            got: args.len(),
            need: 3,
        });
    }
    let vertices = args
        .iter()
        .map(|block| parse_face_vertex(path, line, block, model))
        .collect::<Result<Vec<_>>>()?;
    Ok(Face { vertices })
}

fn parse_face_vertex(path: &str, line: usize, block: &str, model: &ObjModel) -> Result<FaceVertex> {
    let parts: Vec<&str> = block.split('/').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(ObjError::InvalidArgument {
            path: path.into(),
            line,
            keyword: "f".into(),
            value: block.into(),
        });
    }

    let position = resolve_index(path, line, "position", parts[0], model.positions.len())?;
    let uv = match parts.get(1) {
        Some(&"") | None => None,
        Some(s) => Some(resolve_index(path, line, "uv", s, model.uvs.len())?),
    };
    let normal = match parts.get(2) {
        Some(s) => Some(resolve_index(path, line, "normal", s, model.normals.len())?),
        None => None,
    };

    Ok(FaceVertex { position, uv, normal })
}

fn parse_point(path: &str, line: usize, args: &[String], model: &ObjModel) -> Result<PointPrimitive> {
    if args.is_empty() {
        return Err(ObjError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "p".into(),
            got: 0,
            need: 1,
        });
    }
    let positions = args
        .iter()
        .map(|s| resolve_index(path, line, "position", s, model.positions.len()))
        .collect::<Result<Vec<_>>>()?;
    Ok(PointPrimitive { positions })
}

fn resolve_index(path: &str, line: usize, kind: &'static str, text: &str, seen: usize) -> Result<usize> {
    let one_based: i64 = text.parse().map_err(|_| ObjError::InvalidArgument {
        path: path.into(),
        line,
        keyword: kind.into(),
        value: text.into(),
    })?;
    if one_based < 1 || one_based as usize > seen {
        return Err(ObjError::InvalidValue {
            path: path.into(),
            line,
            kind,
            index: one_based,
            seen,
        });
    }
    Ok(one_based as usize - 1)
}

fn parse_f32(path: &str, line: usize, keyword: &str, text: &str) -> Result<f32> {
    text.parse().map_err(|_| ObjError::InvalidArgument {
        path: path.into(),
        line,
        keyword: keyword.into(),
        value: text.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_triangle() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = parse("t.obj", text).unwrap();
        assert_eq!(model.positions.len(), 3);
        assert_eq!(model.positions[0], Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.groups[0].faces[0].vertices.len(), 3);
        assert_eq!(model.groups[0].faces[0].vertices[0].position, 0);
    }

    #[test]
    fn position_w_defaults_to_one() {
        let model = parse("t.obj", "v 1 2 3\n").unwrap();
        assert_eq!(model.positions[0].w, 1.0);
    }

    #[test]
    fn face_with_uv_and_normal_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n";
        let model = parse("t.obj", text).unwrap();
        let vertex = model.groups[0].faces[0].vertices[0];
        assert_eq!(vertex.uv, Some(0));
        assert_eq!(vertex.normal, Some(0));
    }

    #[test]
    fn position_only_normal_face() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let model = parse("t.obj", text).unwrap();
        let vertex = model.groups[0].faces[0].vertices[0];
        assert_eq!(vertex.uv, None);
        assert_eq!(vertex.normal, Some(0));
    }

    #[test]
    fn new_group_directive_starts_named_group() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\ng my group\nf 1 2 3\n";
        let model = parse("t.obj", text).unwrap();
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.groups[0].name, "my group");
    }

    #[test]
    fn second_named_group_does_not_abort_parsing() {
        // MultipleObjects is a warning, not a parse error: the second `o`/`g`
        // directive still produces a usable group.
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\no first\nf 1 2 3\no second\nf 1 2 3\n";
        let model = parse("t.obj", text).unwrap();
        assert_eq!(model.groups.len(), 2);
        assert_eq!(model.groups[1].name, "second");
    }

    #[test]
    fn face_with_too_few_vertices_errors() {
        let text = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        assert!(parse("t.obj", text).is_err());
    }

    #[test]
    fn out_of_range_index_errors() {
        let text = "v 0 0 0\nf 1 2 3\n";
        assert!(parse("t.obj", text).is_err());
    }
}
