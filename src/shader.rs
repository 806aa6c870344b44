//! Programmable stages driven by [`rasterizer::draw_shaded`].
//!
//! The vertex stage turns `(face, nth vertex)` into a screen-space position
//! and may stash per-vertex values ("varyings") in the shader. The fragment
//! stage receives the barycentric weights of a covered pixel and returns its
//! color, or `None` to discard it.
//!
//! [`rasterizer::draw_shaded`]: crate::rasterizer::draw_shaded
use cgmath::InnerSpace;
use image::Rgb;

use crate::geometry::{Vec2f, Vec3f};
use crate::mesh::Mesh;
use crate::rasterizer::interpolate;
use crate::transform::Transform;
use crate::utils;

pub trait Shader {
    fn vertex(&mut self, face: usize, nth: usize) -> Vec3f;
    fn fragment(&self, bar: Vec3f) -> Option<Rgb<u8>>;
}

/// Diffuse intensity of a surface with unit `normal` under light travelling
/// along `light_dir`.
pub fn diffuse_intensity(normal: Vec3f, light_dir: Vec3f) -> f32 {
    f32::max(0., -normal.dot(light_dir))
}

/// Quantizes an intensity into six levels for a cel-shaded look.
pub fn band(intensity: f32) -> f32 {
    if intensity > 0.85 {
        1.
    } else if intensity > 0.60 {
        0.80
    } else if intensity > 0.45 {
        0.60
    } else if intensity > 0.30 {
        0.45
    } else if intensity > 0.15 {
        0.30
    } else {
        0.
    }
}

/// Per-vertex lighting interpolated across the face, then banded.
pub struct GouraudShader<'a> {
    mesh: &'a Mesh,
    transform: &'a Transform,
    light_dir: Vec3f,
    varying_intensity: [f32; 3],
}

impl<'a> GouraudShader<'a> {
    pub fn new(mesh: &'a Mesh, transform: &'a Transform, light_dir: Vec3f) -> Self {
        GouraudShader {
            mesh,
            transform,
            light_dir: light_dir.normalize(),
            varying_intensity: [0.; 3],
        }
    }
}

impl<'a> Shader for GouraudShader<'a> {
    fn vertex(&mut self, face: usize, nth: usize) -> Vec3f {
        self.varying_intensity[nth] = diffuse_intensity(self.mesh.normal(face, nth), self.light_dir);
        self.transform.to_screen(self.mesh.face_vertex(face, nth))
    }

    fn fragment(&self, bar: Vec3f) -> Option<Rgb<u8>> {
        let intensity = interpolate(bar, &self.varying_intensity);
        Some(utils::gray(band(intensity)))
    }
}

/// Diffuse texture modulated by interpolated per-vertex lighting.
pub struct TextureShader<'a> {
    mesh: &'a Mesh,
    transform: &'a Transform,
    light_dir: Vec3f,
    varying_uv: [Vec2f; 3],
    varying_intensity: [f32; 3],
}

impl<'a> TextureShader<'a> {
    pub fn new(mesh: &'a Mesh, transform: &'a Transform, light_dir: Vec3f) -> Self {
        TextureShader {
            mesh,
            transform,
            light_dir: light_dir.normalize(),
            varying_uv: [Vec2f::new(0., 0.); 3],
            varying_intensity: [0.; 3],
        }
    }
}

impl<'a> Shader for TextureShader<'a> {
    fn vertex(&mut self, face: usize, nth: usize) -> Vec3f {
        self.varying_uv[nth] = self.mesh.uv(face, nth);
        self.varying_intensity[nth] = diffuse_intensity(self.mesh.normal(face, nth), self.light_dir);
        self.transform.to_screen(self.mesh.face_vertex(face, nth))
    }

    fn fragment(&self, bar: Vec3f) -> Option<Rgb<u8>> {
        let uv = interpolate(bar, &self.varying_uv);
        let intensity = interpolate(bar, &self.varying_intensity);
        Some(utils::scale(self.mesh.diffuse(uv), intensity))
    }
}
