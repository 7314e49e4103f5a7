//! ASCII STL state machine: `solid` / `facet normal` / `outer loop` /
//! `vertex` × 3 / `endloop` / `endfacet` / `endsolid`.

use das_core::LineReader;
use glam::Vec3;

use crate::error::{Result, StlError};
use crate::model::{Facet, Solid, StlModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectSolidOrEof,
    ExpectFacetOrEndSolid,
    ExpectOuterLoop,
    ExpectVertexOrEndLoop,
    ExpectEndFacet,
}

pub fn parse(path: &str, text: &str) -> Result<StlModel> {
    let mut reader = LineReader::new(text.as_bytes().to_vec(), "\n");
    let mut line_no = 0usize;
    let mut model = StlModel::default();

    let mut state = State::ExpectSolidOrEof;
    let mut current_name = String::new();
    let mut facets: Vec<Facet> = Vec::new();
    let mut normal = Vec3::ZERO;
    let mut vertices: Vec<Vec3> = Vec::new();

    while reader.next_line() {
        line_no += 1;
        let args = reader.read_statement_args().map_err(|_| StlError::InvalidArgument {
            path: path.into(),
            line: line_no,
            keyword: "<line>".into(),
            value: "incomplete statement".into(),
        })?;
        let Some((keyword, rest)) = args.split_first() else {
            continue;
        };

        match (state, keyword.as_str()) {
            (State::ExpectSolidOrEof, "solid") => {
                current_name = rest.join(" ");
                facets = Vec::new();
                state = State::ExpectFacetOrEndSolid;
            }
            (State::ExpectFacetOrEndSolid, "facet") => {
                normal = parse_normal(path, line_no, rest)?;
                state = State::ExpectOuterLoop;
            }
            (State::ExpectFacetOrEndSolid, "endsolid") => {
                let closing_name = rest.join(" ");
                if !closing_name.is_empty() && closing_name != current_name {
                    log::warn!(
                        "{path}:{line_no}: endsolid name `{closing_name}` does not match solid name `{current_name}`"
                    );
                }
                model.solids.push(Solid {
                    name: std::mem::take(&mut current_name),
                    facets: std::mem::take(&mut facets),
                });
                state = State::ExpectSolidOrEof;
            }
            (State::ExpectOuterLoop, "outer") => {
                vertices = Vec::with_capacity(3);
                state = State::ExpectVertexOrEndLoop;
            }
            (State::ExpectVertexOrEndLoop, "vertex") => {
                vertices.push(parse_vertex(path, line_no, rest)?);
                if vertices.len() > 3 {
                    return Err(StlError::TooManyAttributes {
                        path: path.into(),
                        line: line_no,
                        keyword: "vertex".into(),
                        got: vertices.len(),
                        max: 3,
                    });
                }
            }
            (State::ExpectVertexOrEndLoop, "endloop") => {
                if vertices.len() != 3 {
                    return Err(StlError::FacetVertexCount {
                        path: path.into(),
                        got: vertices.len(),
                    });
                }
                facets.push(Facet {
                    normal,
                    vertices: [vertices[0], vertices[1], vertices[2]],
                });
                state = State::ExpectEndFacet;
            }
            (State::ExpectEndFacet, "endfacet") => {
                state = State::ExpectFacetOrEndSolid;
            }
            (_, other) => {
                return Err(StlError::InvalidKeyword {
                    path: path.into(),
                    line: line_no,
                    keyword: other.to_string(),
                })
            }
        }
    }

    if state != State::ExpectSolidOrEof {
        return Err(StlError::InvalidKeyword {
            path: path.into(),
            line: line_no,
            keyword: "<eof>".into(),
        });
    }

    Ok(model)
}

fn parse_normal(path: &str, line: usize, rest: &[String]) -> Result<Vec3> {
    if rest.len() != 4 || rest[0] != "normal" {
        return Err(StlError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "facet normal".into(),
            got: rest.len(),
            need: 4,
        });
    }
    parse_vec3(path, line, "facet normal", &rest[1..4])
}

fn parse_vertex(path: &str, line: usize, rest: &[String]) -> Result<Vec3> {
    if rest.len() != 3 {
        return Err(StlError::NotEnoughAttributes {
            path: path.into(),
            line,
            keyword: "vertex".into(),
            got: rest.len(),
            need: 3,
        });
    }
    parse_vec3(path, line, "vertex", rest)
}

fn parse_vec3(path: &str, line: usize, keyword: &str, values: &[String]) -> Result<Vec3> {
    let parse_one = |s: &str| {
        s.parse::<f32>().map_err(|_| StlError::InvalidArgument {
            path: path.into(),
            line,
            keyword: keyword.into(),
            value: s.into(),
        })
    };
    Ok(Vec3::new(parse_one(&values[0])?, parse_one(&values[1])?, parse_one(&values[2])?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_facet_solid() {
        let text = "solid test\n\
            facet normal 0 0 1\n\
            outer loop\n\
            vertex 0 0 0\n\
            vertex 1 0 0\n\
            vertex 0 1 0\n\
            endloop\n\
            endfacet\n\
            endsolid test\n";
        let model = parse("t.stl", text).unwrap();
        assert_eq!(model.solids.len(), 1);
        assert_eq!(model.solids[0].name, "test");
        assert_eq!(model.solids[0].facets.len(), 1);
        assert_eq!(model.solids[0].facets[0].normal, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn mismatched_endsolid_name_is_a_warning_not_an_error() {
        let text = "solid a\n\
            facet normal 0 0 1\n\
            outer loop\n\
            vertex 0 0 0\n\
            vertex 1 0 0\n\
            vertex 0 1 0\n\
            endloop\n\
            endfacet\n\
            endsolid b\n";
        let model = parse("t.stl", text).unwrap();
        assert_eq!(model.solids[0].name, "a");
    }

    #[test]
    fn wrong_vertex_count_errors() {
        let text = "solid test\n\
            facet normal 0 0 1\n\
            outer loop\n\
            vertex 0 0 0\n\
            vertex 1 0 0\n\
            endloop\n\
            endfacet\n\
            endsolid test\n";
        assert!(parse("t.stl", text).is_err());
    }
}
