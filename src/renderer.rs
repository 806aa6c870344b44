//! The demo render passes, from plain lines up to shaders.
//!
//! Every pass renders into fresh images with the origin at the bottom left;
//! [`write_frame`] flips them on the way to disk.
use std::path::PathBuf;

use anyhow::Result;
use cgmath::InnerSpace;
use image::{GrayImage, RgbImage};
use tracing::{debug, info};

use crate::geometry::{Vec2f, Vec2i, Vec3f};
use crate::rasterizer::{self, Triangle};
use crate::shader::{GouraudShader, Shader, TextureShader};
use crate::transform::Transform;
use crate::utils::{self, GREEN, RED, WHITE};
use crate::wireframe::{self, world_to_screen};
use crate::RendererContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Three segments on a 100x100 image.
    Lines,
    Wireframe,
    /// Three scanline filled triangles on a 200x200 image.
    Triangles,
    /// Flat shaded mesh, no depth buffer.
    Flat,
    /// Flat shaded mesh behind the depth buffer.
    ZBuffer,
    /// Textured mesh behind the depth buffer.
    Textured,
    /// Textured mesh through the camera and perspective projection.
    Perspective,
    /// Cel-banded Gouraud shading, with the depth written out as well.
    Shader,
    TextureShader,
}

impl Pass {
    pub const ALL: [Pass; 9] = [
        Pass::Lines,
        Pass::Wireframe,
        Pass::Triangles,
        Pass::Flat,
        Pass::ZBuffer,
        Pass::Textured,
        Pass::Perspective,
        Pass::Shader,
        Pass::TextureShader,
    ];

    /// File stem of the color output.
    pub fn name(self) -> &'static str {
        match self {
            Pass::Lines => "line",
            Pass::Wireframe => "line_model",
            Pass::Triangles => "triangle",
            Pass::Flat => "triangle_model",
            Pass::ZBuffer => "zbuffer_model",
            Pass::Textured => "zbuffer_texture_model",
            Pass::Perspective => "perspective_projection",
            Pass::Shader => "shader",
            Pass::TextureShader => "shader_texture",
        }
    }
}

/// Output of one pass. Shader passes also produce a depth image.
pub struct Frame {
    pub color: RgbImage,
    pub depth: Option<GrayImage>,
}

impl From<RgbImage> for Frame {
    fn from(color: RgbImage) -> Self {
        Frame { color, depth: None }
    }
}

pub fn render(ctx: &mut RendererContext, pass: Pass) -> Frame {
    debug!(pass = pass.name(), faces = ctx.mesh.face_count(), "rendering");
    match pass {
        Pass::Lines => draw_lines().into(),
        Pass::Wireframe => draw_wireframe(ctx).into(),
        Pass::Triangles => draw_triangles().into(),
        Pass::Flat => draw_flat(ctx).into(),
        Pass::ZBuffer => draw_zbuffer(ctx).into(),
        Pass::Textured => {
            let transform = Transform::orthographic(&ctx.config);
            draw_textured(ctx, &transform).into()
        }
        Pass::Perspective => {
            let transform = Transform::perspective(&ctx.config);
            draw_textured(ctx, &transform).into()
        }
        Pass::Shader => {
            let transform = Transform::perspective(&ctx.config);
            let mut shader = GouraudShader::new(&ctx.mesh, &transform, ctx.config.light_direction);
            draw_with(ctx, &mut shader)
        }
        Pass::TextureShader => {
            let transform = Transform::perspective(&ctx.config);
            let mut shader = TextureShader::new(&ctx.mesh, &transform, ctx.config.light_direction);
            draw_with(ctx, &mut shader)
        }
    }
}

/// Writes the frame under the configured output directory and returns the
/// written paths.
pub fn write_frame(ctx: &RendererContext, pass: Pass, frame: Frame) -> Result<Vec<PathBuf>> {
    let dir = &ctx.config.output_dir;
    let ext = &ctx.config.image_extension;
    let mut written = vec![utils::save_rgb(frame.color, dir, pass.name(), ext)?];
    if let Some(depth) = frame.depth {
        let stem = format!("{}_zbuffer", pass.name());
        written.push(utils::save_gray(depth, dir, &stem, ext)?);
    }
    Ok(written)
}

pub fn run_pass(ctx: &mut RendererContext, pass: Pass) -> Result<Vec<PathBuf>> {
    let frame = render(ctx, pass);
    write_frame(ctx, pass, frame)
}

/// Runs every pass in order.
pub fn run_all(ctx: &mut RendererContext) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for pass in Pass::ALL.iter() {
        written.extend(run_pass(ctx, *pass)?);
    }
    info!(images = written.len(), "all passes done");
    Ok(written)
}

fn draw_lines() -> RgbImage {
    let mut image = RgbImage::new(100, 100);
    wireframe::draw_line(13, 20, 80, 40, &mut image, WHITE);
    wireframe::draw_line(20, 13, 40, 80, &mut image, RED);
    wireframe::draw_line(80, 40, 13, 20, &mut image, RED);
    image
}

fn draw_wireframe(ctx: &RendererContext) -> RgbImage {
    let mut image = RgbImage::new(ctx.config.width, ctx.config.height);
    wireframe::draw_mesh_wireframe(&ctx.mesh, &mut image, WHITE);
    image
}

fn draw_triangles() -> RgbImage {
    let mut image = RgbImage::new(200, 200);
    let t0 = [Vec2i::new(10, 70), Vec2i::new(50, 160), Vec2i::new(70, 80)];
    let t1 = [Vec2i::new(180, 50), Vec2i::new(150, 1), Vec2i::new(70, 180)];
    let t2 = [Vec2i::new(180, 150), Vec2i::new(120, 160), Vec2i::new(130, 180)];
    rasterizer::triangle(t0[0], t0[1], t0[2], &mut image, RED);
    rasterizer::triangle(t1[0], t1[1], t1[2], &mut image, WHITE);
    rasterizer::triangle(t2[0], t2[1], t2[2], &mut image, GREEN);
    image
}

/// Face brightness from the normal of its world-space vertices. Zero or
/// negative means the face points away from the light.
fn face_intensity(world: &[Vec3f; 3], light_dir: Vec3f) -> f32 {
    let n = (world[2] - world[0]).cross(world[1] - world[0]).normalize();
    n.dot(light_dir.normalize())
}

fn world_coords(ctx: &RendererContext, face: usize) -> [Vec3f; 3] {
    [0, 1, 2].map(|k| ctx.mesh.face_vertex(face, k))
}

fn flat_screen_coords(ctx: &RendererContext, world: &[Vec3f; 3]) -> [Vec3f; 3] {
    let (width, height) = (ctx.config.width, ctx.config.height);
    (*world).map(|v| {
        let (x, y) = world_to_screen(v, width, height);
        Vec3f::new(x as f32, y as f32, v.z)
    })
}

fn draw_flat(ctx: &RendererContext) -> RgbImage {
    let mut image = RgbImage::new(ctx.config.width, ctx.config.height);
    for face in 0..ctx.mesh.face_count() {
        let world = world_coords(ctx, face);
        let intensity = face_intensity(&world, ctx.config.light_direction);
        if intensity > 0. {
            let screen = flat_screen_coords(ctx, &world);
            rasterizer::fill_triangle(&screen, &mut image, utils::gray(intensity));
        }
    }
    image
}

fn draw_zbuffer(ctx: &mut RendererContext) -> RgbImage {
    let mut image = RgbImage::new(ctx.config.width, ctx.config.height);
    ctx.zbuffer.reset(ctx.config.width, ctx.config.height);
    for face in 0..ctx.mesh.face_count() {
        let world = world_coords(ctx, face);
        let intensity = face_intensity(&world, ctx.config.light_direction);
        if intensity > 0. {
            let screen = flat_screen_coords(ctx, &world);
            rasterizer::fill_triangle_depth(&screen, &mut ctx.zbuffer, &mut image, utils::gray(intensity));
        }
    }
    image
}

fn draw_textured(ctx: &mut RendererContext, transform: &Transform) -> RgbImage {
    let mut image = RgbImage::new(ctx.config.width, ctx.config.height);
    ctx.zbuffer.reset(ctx.config.width, ctx.config.height);
    let mesh = &ctx.mesh;
    for face in 0..mesh.face_count() {
        let world = [0, 1, 2].map(|k| mesh.face_vertex(face, k));
        let intensity = face_intensity(&world, ctx.config.light_direction);
        if intensity <= 0. {
            continue;
        }
        let screen = world.map(|v| {
            let s = transform.to_screen(v);
            Vec3f::new(s.x.trunc(), s.y.trunc(), s.z)
        });
        let uvs: [Vec2f; 3] = [0, 1, 2].map(|k| mesh.uv(face, k));
        let tri = Triangle::new(screen)
            .with_uvs(uvs)
            .with_intensity([intensity; 3]);
        rasterizer::fill_triangle_textured(&tri, &mut ctx.zbuffer, &mut image, |uv| mesh.diffuse(uv));
    }
    image
}

fn draw_with<S: Shader>(ctx: &RendererContext, shader: &mut S) -> Frame {
    let mut color = RgbImage::new(ctx.config.width, ctx.config.height);
    let mut depth = GrayImage::new(ctx.config.width, ctx.config.height);
    rasterizer::draw_shaded(shader, ctx.mesh.face_count(), &mut color, &mut depth);
    Frame {
        color,
        depth: Some(depth),
    }
}
