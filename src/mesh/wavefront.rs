//! Reader for the subset of Wavefront `.obj` used by the renderer: `v`,
//! `vt`, `vn` and `f`. Everything else is skipped.
use std::{
    fmt,
    io::{self, BufRead, BufReader, Read},
    str::FromStr,
};

use crate::geometry::{Vec2f, Vec3f};

use super::{IndexTuple, Mesh, MeshParser, SimplePolygon};

/// Errors parsing or loading a .obj file.
#[derive(Debug)]
pub enum ObjError {
    Io(io::Error),
    Unsupported,
    /// One of the arguments to `f` is malformed or points past the data
    /// read so far.
    MalformedFaceGroup {
        line_number: usize,
        group: String,
    },
    /// An argument list either has unparsable arguments or is
    /// missing one or more arguments.
    ArgumentListFailure {
        line_number: usize,
        list: String,
    },
    /// `f` with fewer than three vertices.
    MalformedFace {
        line_number: usize,
    },
}

impl std::error::Error for ObjError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ObjError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ObjError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjError::Io(err) => write!(f, "I/O error loading a .obj file: {}", err),
            ObjError::MalformedFaceGroup { line_number, group } => write!(
                f,
                "One of the arguments to `f` is malformed (line: {}, group: {})",
                line_number, group
            ),
            ObjError::ArgumentListFailure { line_number, list } => write!(
                f,
                "An argument list either has unparsable arguments or is missing arguments. (line: {}, list: {})",
                line_number, list
            ),
            ObjError::MalformedFace { line_number } => {
                write!(f, "A face needs at least three vertices (line: {})", line_number)
            }
            ObjError::Unsupported => write!(f, "unsupported file extension"),
        }
    }
}

impl From<io::Error> for ObjError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

// 1-based and negative (relative) indices to 0-based. `None` for 0 or an
// index past the `len` elements read so far.
fn normalize(idx: isize, len: usize) -> Option<usize> {
    let idx = if idx < 0 {
        len as isize + idx
    } else {
        idx - 1
    };
    if idx >= 0 && (idx as usize) < len {
        Some(idx as usize)
    } else {
        None
    }
}

pub struct Wavefront;

impl Wavefront {
    fn parse_two(line_number: usize, n0: Option<&str>, n1: Option<&str>) -> Result<Vec2f, ObjError> {
        match (n0.map(FromStr::from_str), n1.map(FromStr::from_str)) {
            (Some(Ok(n0)), Some(Ok(n1))) => Ok(Vec2f::new(n0, n1)),
            _ => Err(ObjError::ArgumentListFailure {
                line_number,
                list: format!("{:?} {:?}", n0, n1),
            }),
        }
    }

    fn parse_three(
        line_number: usize,
        n0: Option<&str>,
        n1: Option<&str>,
        n2: Option<&str>,
    ) -> Result<Vec3f, ObjError> {
        match (
            n0.map(FromStr::from_str),
            n1.map(FromStr::from_str),
            n2.map(FromStr::from_str),
        ) {
            (Some(Ok(n0)), Some(Ok(n1)), Some(Ok(n2))) => Ok(Vec3f::new(n0, n1, n2)),
            _ => Err(ObjError::ArgumentListFailure {
                line_number,
                list: format!("{:?} {:?} {:?}", n0, n1, n2),
            }),
        }
    }

    fn parse_group(mesh: &Mesh, line_number: usize, group: &str) -> Result<IndexTuple, ObjError> {
        let malformed = || ObjError::MalformedFaceGroup {
            line_number,
            group: String::from(group),
        };
        // an empty part, as in `1//3`, means the index is absent
        let index = |part: Option<&str>, len: usize| -> Result<Option<usize>, ObjError> {
            match part {
                None | Some("") => Ok(None),
                Some(part) => {
                    let idx: isize = part.parse().map_err(|_| malformed())?;
                    normalize(idx, len).map(Some).ok_or_else(malformed)
                }
            }
        };

        let mut parts = group.split('/');
        let p = index(parts.next(), mesh.position.len())?.ok_or_else(malformed)?;
        let t = index(parts.next(), mesh.texture.len())?;
        let n = index(parts.next(), mesh.normal.len())?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(IndexTuple(p, t, n))
    }

    fn parse_face<'b, I>(mesh: &Mesh, line_number: usize, groups: I) -> Result<SimplePolygon, ObjError>
    where
        I: Iterator<Item = &'b str>,
    {
        let mut ret = Vec::with_capacity(3);
        for g in groups {
            ret.push(Self::parse_group(mesh, line_number, g)?);
        }
        if ret.len() < 3 {
            return Err(ObjError::MalformedFace { line_number });
        }
        Ok(ret)
    }

    pub fn load_buf<R: Read>(input: R) -> Result<Mesh, ObjError> {
        let input = BufReader::new(input);
        let mut dat = Mesh::default();

        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            let line_number = idx + 1;
            let mut words = line.split_whitespace();

            match words.next() {
                Some("v") => {
                    let (v0, v1, v2) = (words.next(), words.next(), words.next());
                    dat.position.push(Self::parse_three(line_number, v0, v1, v2)?);
                }
                Some("vt") => {
                    let (t0, t1) = (words.next(), words.next());
                    dat.texture.push(Self::parse_two(line_number, t0, t1)?);
                }
                Some("vn") => {
                    let (n0, n1, n2) = (words.next(), words.next(), words.next());
                    dat.normal.push(Self::parse_three(line_number, n0, n1, n2)?);
                }
                Some("f") => {
                    let poly = Self::parse_face(&dat, line_number, words)?;
                    // fan out polygons so every face is a triangle
                    for i in 1..poly.len() - 1 {
                        dat.faces.push(vec![poly[0], poly[i], poly[i + 1]]);
                    }
                }
                Some(_) | None => (),
            }
        }
        Ok(dat)
    }
}

impl MeshParser for Wavefront {
    fn parse_mesh_data<R: Read>(input: R) -> Result<Mesh, ObjError> {
        Wavefront::load_buf(input)
    }
}
