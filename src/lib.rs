//! This library provides a light weight software rasterization pipeline
//!
//! It takes a triangle mesh, carries its vertices through model, view,
//! projection and viewport matrices, and fills the triangles into an image
//! behind a depth buffer, either directly or through a [`shader::Shader`].
//! It is mostly written for learning purposes and does not aim to be
//! replacement of any rendering library.
//!
//! Example
//!
//! ```no_run
//! use toy_rasterizer::{init, renderer, Config};
//!
//! let mut context = init(Config::default());
//! renderer::run_all(&mut context).unwrap();
//! ```

pub mod geometry;
pub mod mesh;
pub mod rasterizer;
pub mod renderer;
pub mod shader;
pub mod transform;
pub mod utils;
pub mod wireframe;

use std::path::PathBuf;

use geometry::Vec3f;
use mesh::Mesh;
use rasterizer::DepthBuffer;

/// Everything a render session needs to know. There are no flags or
/// environment variables; tweak the struct.
#[derive(Clone, Debug)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    /// Screen-space depth range, `z` lands in `[0, depth]`.
    pub depth: u32,
    pub mesh_path: PathBuf,
    pub output_dir: PathBuf,
    /// Extension of the written images, which picks the format.
    pub image_extension: String,
    /// Direction the light travels in.
    pub light_direction: Vec3f,
    pub eye: Vec3f,
    pub center: Vec3f,
    pub up: Vec3f,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 800,
            height: 800,
            depth: 255,
            mesh_path: PathBuf::from("obj/african_head/african_head.obj"),
            output_dir: PathBuf::from("."),
            image_extension: String::from("bmp"),
            light_direction: Vec3f::new(0., 0., -1.),
            eye: Vec3f::new(1., 0.5, 1.5),
            center: Vec3f::new(0., 0., 0.),
            up: Vec3f::new(0., 1., 0.),
        }
    }
}

/// A render session: the mesh being drawn and the depth buffer reused by
/// every pass.
pub struct RendererContext {
    config: Config,
    mesh: Mesh,
    zbuffer: DepthBuffer,
}

impl RendererContext {
    pub fn new(config: Config, mesh: Mesh) -> Self {
        let zbuffer = DepthBuffer::new(config.width, config.height);
        RendererContext {
            config,
            mesh,
            zbuffer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

/// Loads the configured mesh and its textures. A mesh that fails to load is
/// replaced by an empty one.
pub fn init(config: Config) -> RendererContext {
    let mesh = Mesh::load_or_empty(&config.mesh_path);
    RendererContext::new(config, mesh)
}
