//! Matrices carrying a vertex from object space to screen space.
//!
//! For a vertex `v` the pipeline is
//!
//! `screen = viewport * divide(projection * view * model * camera * [v, 1])`
//!
//! The perspective divide has to sit between the projection and the
//! viewport: the viewport matrix expects normalized device coordinates.
use cgmath::InnerSpace;

use crate::geometry::{Matrix, Vec3f};
use crate::Config;

/// Meshes are loaded already normalized into `[-1, 1]^3`, so this is the
/// identity.
pub fn model_matrix() -> Matrix {
    Matrix::identity(4)
}

pub fn view_matrix() -> Matrix {
    Matrix::identity(4)
}

/// Identity with `-1 / camera_distance` in row 3, column 2, so that
/// `w = 1 - z / camera_distance`. An infinite distance gives an
/// orthographic projection.
pub fn projection_matrix(camera_distance: f32) -> Matrix {
    let mut m = Matrix::identity(4);
    m[(3, 2)] = -1. / camera_distance;
    m
}

/// Maps `[-1, 1]^3` onto the screen box at `(x, y)` of size `w x h`, with
/// depth landing in `[0, depth]`.
pub fn viewport_matrix(x: f32, y: f32, w: f32, h: f32, depth: f32) -> Matrix {
    let mut m = Matrix::identity(4);
    m[(0, 3)] = x + w / 2.;
    m[(1, 3)] = y + h / 2.;
    m[(2, 3)] = depth / 2.;

    m[(0, 0)] = w / 2.;
    m[(1, 1)] = h / 2.;
    m[(2, 2)] = depth / 2.;
    m
}

/// Look-at matrix for a camera at `eye` looking towards `target`.
///
/// Points are first translated by `-eye` and then rotated into the camera
/// basis, i.e. the result is `rotation * translation`.
pub fn camera_matrix(eye: Vec3f, target: Vec3f, up: Vec3f) -> Matrix {
    let z = (eye - target).normalize();
    let x = up.cross(z).normalize();
    let y = z.cross(x).normalize();

    let mut rotation = Matrix::identity(4);
    let mut translation = Matrix::identity(4);
    for i in 0..3 {
        rotation[(0, i)] = x[i];
        rotation[(1, i)] = y[i];
        rotation[(2, i)] = z[i];
        translation[(i, 3)] = -eye[i];
    }
    &rotation * &translation
}

/// The composed vertex pipeline for one render pass.
#[derive(Clone, Debug)]
pub struct Transform {
    /// `projection * view * model * camera`
    clip: Matrix,
    viewport: Matrix,
}

impl Transform {
    pub fn new(model: &Matrix, view: &Matrix, projection: &Matrix, camera: &Matrix, viewport: Matrix) -> Self {
        let clip = &(&(projection * view) * model) * camera;
        Transform { clip, viewport }
    }

    /// Full perspective pipeline with the camera described by `config`.
    pub fn perspective(config: &Config) -> Self {
        Self::new(
            &model_matrix(),
            &view_matrix(),
            &projection_matrix(config.eye.z),
            &camera_matrix(config.eye, config.center, config.up),
            Self::screen_viewport(config),
        )
    }

    /// Pipeline without camera and with an orthographic projection: plain
    /// viewport mapping of the normalized mesh.
    pub fn orthographic(config: &Config) -> Self {
        let identity = Matrix::identity(4);
        Self::new(&identity, &identity, &identity, &identity, Self::screen_viewport(config))
    }

    fn screen_viewport(config: &Config) -> Matrix {
        viewport_matrix(
            0.,
            0.,
            config.width as f32,
            config.height as f32,
            config.depth as f32,
        )
    }

    /// Object space to screen space, `z` carrying depth in `[0, depth]`.
    pub fn to_screen(&self, v: Vec3f) -> Vec3f {
        let clip = &self.clip * &Matrix::from_point(v);
        (&self.viewport * &clip.perspective_divide()).to_point()
    }
}
