use image::{Rgb, RgbImage};

use crate::geometry::Vec3f;
use crate::mesh::Mesh;
use crate::utils;

/// Plain object-to-screen map used before the matrix pipeline: `[-1, 1]`
/// onto `[0, size]`, truncated to whole pixels.
pub fn world_to_screen(v: Vec3f, width: u32, height: u32) -> (i32, i32) {
    (
        ((v.x + 1.) * width as f32 / 2.) as i32,
        ((v.y + 1.) * height as f32 / 2.) as i32,
    )
}

pub fn draw_mesh_wireframe(mesh: &Mesh, image: &mut RgbImage, color: Rgb<u8>) {
    let (width, height) = image.dimensions();

    for face in 0..mesh.face_count() {
        let n = mesh.faces[face].len();
        for i in 0..n {
            let (x0, y0) = world_to_screen(mesh.face_vertex(face, i), width, height);
            let (x1, y1) = world_to_screen(mesh.face_vertex(face, (i + 1) % n), width, height);
            draw_line(x0, y0, x1, y1, image, color);
        }
    }
}

/// Cuts the segment down to the part inside the image (Liang-Barsky).
/// Returns `None` when nothing is left.
fn clip_line(from: (i32, i32), to: (i32, i32), width: u32, height: u32) -> Option<((i32, i32), (i32, i32))> {
    if width == 0 || height == 0 {
        return None;
    }
    let (x, y) = (f64::from(from.0), f64::from(from.1));
    let (dx, dy) = (f64::from(to.0) - x, f64::from(to.1) - y);
    let (xmax, ymax) = (f64::from(width - 1), f64::from(height - 1));

    let (mut t0, mut t1) = (0f64, 1f64);
    for &(p, q) in &[(-dx, x), (dx, xmax - x), (-dy, y), (dy, ymax - y)] {
        if p == 0. {
            if q < 0. {
                return None;
            }
        } else if p < 0. {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    if t0 > t1 {
        return None;
    }
    let at = |t: f64| ((x + t * dx).round() as i32, (y + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

/// Bresenham line with an integer error term. Both endpoints are drawn;
/// the segment is clipped to the image first.
pub fn draw_line(x1: i32, y1: i32, x2: i32, y2: i32, image: &mut RgbImage, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let ((mut x1, mut y1), (mut x2, mut y2)) = match clip_line((x1, y1), (x2, y2), width, height) {
        Some(segment) => segment,
        None => return,
    };
    let mut steep = false;
    if (x1 - x2).abs() < (y1 - y2).abs() {
        std::mem::swap(&mut x1, &mut y1);
        std::mem::swap(&mut x2, &mut y2);
        steep = true;
    }
    if x1 > x2 {
        std::mem::swap(&mut x1, &mut x2);
        std::mem::swap(&mut y1, &mut y2);
    }
    let dx = x2 - x1;
    let dy = y2 - y1;
    let derror = (dy * 2).abs();
    let mut error = 0;
    let mut y = y1;
    for x in x1..=x2 {
        if steep {
            utils::set_pixel(image, y, x, color);
        } else {
            utils::set_pixel(image, x, y, color);
        }
        error += derror;
        if error > dx {
            y += if y2 > y1 { 1 } else { -1 };
            error -= dx * 2;
        }
    }
}
