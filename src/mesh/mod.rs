//! Parses different file format into Mesh object
//!
//! Right now it only supports wavefront i.e (.obj) file formats
mod wavefront;

use std::{
    ffi::OsStr,
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use cgmath::InnerSpace;
use image::{imageops, Rgb, RgbImage};
use tracing::{info, warn};

use crate::geometry::{Vec2f, Vec3f};
use crate::utils::WHITE;

pub use wavefront::{ObjError, Wavefront};

/// A triangle mesh with optional texture coordinates, normals and diffuse
/// texture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub position: Vec<Vec3f>,
    /// 2D texture coordinates.
    pub texture: Vec<Vec2f>,
    /// A set of normals.
    pub normal: Vec<Vec3f>,
    /// Triangles from the `f ...` lines of the `.obj` file. Larger polygons
    /// are split into a fan around their first vertex.
    pub faces: Vec<SimplePolygon>,
    diffuse_map: Option<RgbImage>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.position.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex(&self, i: usize) -> Vec3f {
        self.position[i]
    }

    /// Position of the `nth` vertex of `face`.
    pub fn face_vertex(&self, face: usize, nth: usize) -> Vec3f {
        self.position[self.faces[face][nth].0]
    }

    /// Position indices of `face`, in order.
    pub fn face(&self, face: usize) -> Vec<usize> {
        self.faces[face].iter().map(|t| t.0).collect()
    }

    /// Texture coordinate of the `nth` vertex of `face`, `(0, 0)` when the
    /// face has none.
    pub fn uv(&self, face: usize, nth: usize) -> Vec2f {
        match self.faces[face][nth].1 {
            Some(t) => self.texture[t],
            None => Vec2f::new(0., 0.),
        }
    }

    /// Unit normal of the `nth` vertex of `face`. Faces without normals get
    /// the geometric normal of their first three vertices.
    pub fn normal(&self, face: usize, nth: usize) -> Vec3f {
        match self.faces[face][nth].2 {
            Some(n) => self.normal[n].normalize(),
            None => {
                let [v0, v1, v2] = [0, 1, 2].map(|k| self.face_vertex(face, k));
                (v1 - v0).cross(v2 - v0).normalize()
            }
        }
    }

    pub fn has_diffuse_map(&self) -> bool {
        self.diffuse_map.is_some()
    }

    /// Replaces the diffuse texture. `v` is expected to grow upward, i.e.
    /// the image already flipped.
    pub fn set_diffuse_map(&mut self, map: RgbImage) {
        self.diffuse_map = Some(map);
    }

    /// Diffuse color at `uv`. Untextured meshes are white.
    pub fn diffuse(&self, uv: Vec2f) -> Rgb<u8> {
        let map = match &self.diffuse_map {
            Some(map) if map.width() > 0 && map.height() > 0 => map,
            _ => return WHITE,
        };
        let x = ((uv.x * map.width() as f32) as i64).max(0).min(map.width() as i64 - 1);
        let y = ((uv.y * map.height() as f32) as i64).max(0).min(map.height() as i64 - 1);
        *map.get_pixel(x as u32, y as u32)
    }

    /// Loads `path`, falling back to an empty mesh when it can't be read.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Mesh {
        match MeshLoader::load(path.as_ref()) {
            Ok(mut loader) => {
                loader.load_textures();
                loader.data
            }
            Err(err) => {
                warn!(path = %path.as_ref().display(), %err, "failed to load mesh, rendering nothing");
                Mesh::default()
            }
        }
    }
}

/// A tuple of position, texture and normal indices assigned to each polygon
/// vertex.
///
/// These appear as `/` separated indices in `.obj` files.
#[derive(Debug, Clone, Copy, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct IndexTuple(pub usize, pub Option<usize>, pub Option<usize>);

/// A face of the mesh. The parser only produces triangles.
///
/// Each vertex has an associated tuple of `(position, texture, normal)`
/// indices.
pub type SimplePolygon = Vec<IndexTuple>;

impl std::fmt::Display for IndexTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)?;
        if let Some(idx) = self.1 {
            write!(f, "/{}", idx + 1)?;
        }
        if let Some(idx) = self.2 {
            if self.1.is_none() {
                write!(f, "/")?;
            }
            write!(f, "/{}", idx + 1)?;
        }
        Ok(())
    }
}

trait MeshParser {
    fn parse_mesh_data<R: Read>(input: R) -> Result<Mesh, ObjError>;
}

/// A struct used to store `Mesh` data as well as its source path used to
/// find the companion textures.
#[derive(Clone, Debug)]
pub struct MeshLoader {
    /// The data associated with this file format.
    pub data: Mesh,
    /// The path the mesh was read from.
    pub path: PathBuf,
}

impl MeshLoader {
    /// Load a mesh from the given path, picking the parser by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<MeshLoader, ObjError> {
        let path = path.as_ref().to_owned();
        let data = match path.extension().and_then(OsStr::to_str) {
            Some("obj") => Wavefront::parse_mesh_data(File::open(&path)?)?,
            _ => return Err(ObjError::Unsupported),
        };
        info!(
            path = %path.display(),
            vertices = data.position.len(),
            faces = data.faces.len(),
            uvs = data.texture.len(),
            normals = data.normal.len(),
            "loaded mesh"
        );
        Ok(MeshLoader { data, path })
    }

    /// Path of the texture that sits beside the mesh, `head.obj` ->
    /// `head<suffix>`.
    pub fn texture_path(&self, suffix: &str) -> Option<PathBuf> {
        let stem = self.path.file_stem()?.to_str()?;
        Some(self.path.with_file_name(format!("{}{}", stem, suffix)))
    }

    /// Loads the `_diffuse.tga` texture. A missing or broken texture is
    /// logged and the mesh stays untextured.
    pub fn load_textures(&mut self) {
        let path = match self.texture_path("_diffuse.tga") {
            Some(path) => path,
            None => return,
        };
        match image::open(&path) {
            Ok(texture) => {
                let mut texture = texture.into_rgb8();
                imageops::flip_vertical_in_place(&mut texture);
                info!(path = %path.display(), "texture loaded");
                self.data.set_diffuse_map(texture);
            }
            Err(err) => warn!(path = %path.display(), %err, "texture failed to load"),
        }
    }
}
