use std::ops::{Add, Mul};

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::geometry::{Vec2f, Vec2i, Vec3f};
use crate::shader::Shader;
use crate::utils;

/// Below this, the screen-space area of a triangle is treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-2;

/// Barycentric coordinates of a point are represented from points of triangle
/// itself For example: Given triangle with A, B, C, we can have a point P in
/// triangle written as:
///
/// P = (1 -u - v) A + u * B + v * C
///
/// P = A + u * AB + v * AC
///
/// So to find barycentric coordinates we just need to solve above equation for
/// u & v.
///
/// u ABx + v ACx + PAx = 0
///
/// u ABy + v ACy + PAy = 0
///
/// In vector terms, we are looking for a vector (u,v, 1) which is perpendicular
/// to both (ABx, ACx, PAx) and (ABy, ACy, PAy) i.e use cross product.
///
/// Only `x` and `y` take part. For a degenerate triangle `(-1, 1, 1)` is
/// returned, which every caller rejects as outside.
pub fn barycentric(pts: &[Vec3f; 3], p: Vec3f) -> Vec3f {
    let ab = pts[1] - pts[0];
    let ac = pts[2] - pts[0];
    let pa = pts[0] - p;
    let n = Vec3f::new(ab.x, ac.x, pa.x).cross(Vec3f::new(ab.y, ac.y, pa.y));

    if n.z.abs() < DEGENERATE_EPSILON {
        return Vec3f::new(-1., 1., 1.);
    }
    // sum before dividing, dividing each term first loses precision
    Vec3f::new(1. - (n.x + n.y) / n.z, n.x / n.z, n.y / n.z)
}

/// `w0 * a + w1 * b + w2 * c`
pub fn interpolate<T>(bc: Vec3f, values: &[T; 3]) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    values[0] * bc.x + values[1] * bc.y + values[2] * bc.z
}

fn is_inside(bc: Vec3f) -> bool {
    bc.x >= 0. && bc.y >= 0. && bc.z >= 0.
}

/// Per pixel depth of the closest surface seen so far. Larger is closer.
#[derive(Clone, Debug)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    depth: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        DepthBuffer {
            width,
            height,
            depth: vec![f32::NEG_INFINITY; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Forget every surface, ready for the next frame.
    pub fn clear(&mut self) {
        for z in self.depth.iter_mut() {
            *z = f32::NEG_INFINITY;
        }
    }

    /// Resizes to a new target and clears.
    pub fn reset(&mut self, width: u32, height: u32) {
        if (self.width, self.height) != (width, height) {
            *self = DepthBuffer::new(width, height);
        } else {
            self.clear();
        }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.depth[(x + y * self.width) as usize]
    }

    /// Stores `z` and returns true only if it is strictly closer than what
    /// is already there.
    pub fn test_and_set(&mut self, x: u32, y: u32, z: f32) -> bool {
        let q = (x + y * self.width) as usize;
        if self.depth[q] < z {
            self.depth[q] = z;
            true
        } else {
            false
        }
    }
}

/// Screen-space triangle with optional texture coordinates and per-vertex
/// intensity.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub pts: [Vec3f; 3],
    pub uvs: Option<[Vec2f; 3]>,
    pub intensity: Option<[f32; 3]>,
}

impl Triangle {
    pub fn new(pts: [Vec3f; 3]) -> Self {
        Triangle {
            pts,
            uvs: None,
            intensity: None,
        }
    }

    pub fn with_uvs(mut self, uvs: [Vec2f; 3]) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn with_intensity(mut self, intensity: [f32; 3]) -> Self {
        self.intensity = Some(intensity);
        self
    }
}

/// Calls `visit` for every pixel of the image covered by the triangle, with
/// its barycentric coordinates. Only the triangle's bounding box, clipped to
/// the image, is scanned.
fn for_each_covered<F>(pts: &[Vec3f; 3], width: u32, height: u32, mut visit: F)
where
    F: FnMut(u32, u32, Vec3f),
{
    if width == 0 || height == 0 {
        return;
    }
    let mut bboxmin = Vec2f::new(f32::MAX, f32::MAX);
    let mut bboxmax = Vec2f::new(f32::MIN, f32::MIN);
    let clamp = Vec2f::new((width - 1) as f32, (height - 1) as f32);
    for p in pts {
        for j in 0..2 {
            bboxmin[j] = f32::min(bboxmin[j], p[j]);
            bboxmax[j] = f32::max(bboxmax[j], p[j]);
        }
    }
    for j in 0..2 {
        bboxmin[j] = f32::max(0., bboxmin[j]);
        bboxmax[j] = f32::min(clamp[j], bboxmax[j]);
    }

    for x in bboxmin.x.ceil() as i32..=bboxmax.x.floor() as i32 {
        for y in bboxmin.y.ceil() as i32..=bboxmax.y.floor() as i32 {
            let bc = barycentric(pts, Vec3f::new(x as f32, y as f32, 0.));
            if !is_inside(bc) {
                continue;
            }
            visit(x as u32, y as u32, bc);
        }
    }
}

/// Scanline fill with a constant color, no depth.
///
/// The vertices are sorted by `y` and the triangle split at the middle
/// vertex. Each row from the lowest vertex up to, but excluding, the highest
/// is filled between the long edge and the current short edge.
pub fn triangle(mut t0: Vec2i, mut t1: Vec2i, mut t2: Vec2i, image: &mut RgbImage, color: Rgb<u8>) {
    if t0.y == t1.y && t0.y == t2.y {
        return;
    }
    if t0.y > t1.y {
        std::mem::swap(&mut t0, &mut t1);
    }
    if t0.y > t2.y {
        std::mem::swap(&mut t0, &mut t2);
    }
    if t1.y > t2.y {
        std::mem::swap(&mut t1, &mut t2);
    }

    let total_height = t2.y - t0.y;
    for i in 0..total_height {
        let upper_half = i > t1.y - t0.y || t1.y == t0.y;
        let segment_height = if upper_half { t2.y - t1.y } else { t1.y - t0.y };
        let alpha = i as f32 / total_height as f32;
        let beta = if upper_half {
            (i - (t1.y - t0.y)) as f32 / segment_height as f32
        } else {
            i as f32 / segment_height as f32
        };

        let mut ax = t0.x + ((t2.x - t0.x) as f32 * alpha) as i32;
        let mut bx = if upper_half {
            t1.x + ((t2.x - t1.x) as f32 * beta) as i32
        } else {
            t0.x + ((t1.x - t0.x) as f32 * beta) as i32
        };
        if ax > bx {
            std::mem::swap(&mut ax, &mut bx);
        }
        for x in ax..=bx {
            utils::set_pixel(image, x, t0.y + i, color);
        }
    }
}

/// Bounding box fill with a constant color, no depth.
pub fn fill_triangle(pts: &[Vec3f; 3], image: &mut RgbImage, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    for_each_covered(pts, width, height, |x, y, _| image.put_pixel(x, y, color));
}

/// Bounding box fill with a constant color behind a depth test.
pub fn fill_triangle_depth(pts: &[Vec3f; 3], zbuffer: &mut DepthBuffer, image: &mut RgbImage, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    assert_eq!((zbuffer.width(), zbuffer.height()), (width, height));
    for_each_covered(pts, width, height, |x, y, bc| {
        let z = interpolate(bc, &[pts[0].z, pts[1].z, pts[2].z]);
        if zbuffer.test_and_set(x, y, z) {
            image.put_pixel(x, y, color);
        }
    });
}

/// Depth tested fill where the color comes from `texture` at the
/// interpolated UV, scaled by the interpolated intensity.
///
/// Missing UVs sample at `(0, 0)`; missing intensity means full brightness.
pub fn fill_triangle_textured<T>(tri: &Triangle, zbuffer: &mut DepthBuffer, image: &mut RgbImage, texture: T)
where
    T: Fn(Vec2f) -> Rgb<u8>,
{
    let (width, height) = image.dimensions();
    assert_eq!((zbuffer.width(), zbuffer.height()), (width, height));
    let pts = &tri.pts;
    for_each_covered(pts, width, height, |x, y, bc| {
        let z = interpolate(bc, &[pts[0].z, pts[1].z, pts[2].z]);
        let uv = tri.uvs.map_or(Vec2f::new(0., 0.), |uvs| interpolate(bc, &uvs));
        let intensity = tri.intensity.map_or(1., |i| interpolate(bc, &i));
        if zbuffer.test_and_set(x, y, z) {
            image.put_pixel(x, y, utils::scale(texture(uv), intensity));
        }
    });
}

/// Shader driven fill. Depth is kept as 8 bit gray in `zbuffer`, rounded
/// and clamped into `0..=255`; a fragment passes unless the stored value is
/// greater.
pub fn fill_triangle_shaded<S: Shader + ?Sized>(
    pts: &[Vec3f; 3],
    shader: &S,
    image: &mut RgbImage,
    zbuffer: &mut GrayImage,
) {
    let (width, height) = image.dimensions();
    assert_eq!(zbuffer.dimensions(), (width, height));
    for_each_covered(pts, width, height, |x, y, bc| {
        let z = interpolate(bc, &[pts[0].z, pts[1].z, pts[2].z]);
        let frag_depth = ((z + 0.5) as i32).max(0).min(255) as u8;
        let color = match shader.fragment(bc) {
            Some(color) => color,
            None => return,
        };
        if zbuffer.get_pixel(x, y)[0] > frag_depth {
            return;
        }
        zbuffer.put_pixel(x, y, Luma([frag_depth]));
        image.put_pixel(x, y, color);
    });
}

/// Runs every face through `shader`: three vertex calls, then a shaded
/// fill. Screen `x` and `y` are snapped to whole pixels.
pub fn draw_shaded<S: Shader + ?Sized>(shader: &mut S, faces: usize, image: &mut RgbImage, zbuffer: &mut GrayImage) {
    for face in 0..faces {
        let mut pts = [Vec3f::new(0., 0., 0.); 3];
        for (nth, p) in pts.iter_mut().enumerate() {
            let v = shader.vertex(face, nth);
            *p = Vec3f::new(v.x.trunc(), v.y.trunc(), v.z);
        }
        fill_triangle_shaded(&pts, shader, image, zbuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tri(a: (f32, f32, f32), b: (f32, f32, f32), c: (f32, f32, f32)) -> [Vec3f; 3] {
        [
            Vec3f::new(a.0, a.1, a.2),
            Vec3f::new(b.0, b.1, b.2),
            Vec3f::new(c.0, c.1, c.2),
        ]
    }

    fn count(image: &RgbImage, color: Rgb<u8>) -> usize {
        image.pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn barycentric_inside_sums_to_one() {
        let pts = tri((10., 10., 0.), (90., 20., 0.), (40., 80., 0.));
        for p in &[(40., 30.), (45., 35.), (60., 30.), (30., 20.)] {
            let bc = barycentric(&pts, Vec3f::new(p.0, p.1, 0.));
            assert!(is_inside(bc), "{:?} should be inside", p);
            assert_abs_diff_eq!(bc.x + bc.y + bc.z, 1., epsilon = 1e-5);
            // weights reproduce the point
            let q = interpolate(bc, &pts);
            assert_abs_diff_eq!(q.x, p.0, epsilon = 1e-3);
            assert_abs_diff_eq!(q.y, p.1, epsilon = 1e-3);
        }
    }

    #[test]
    fn barycentric_outside_has_negative_weight() {
        let pts = tri((10., 10., 0.), (90., 20., 0.), (40., 80., 0.));
        for p in &[(0., 0.), (90., 80.), (5., 50.), (50., 5.)] {
            let bc = barycentric(&pts, Vec3f::new(p.0, p.1, 0.));
            assert!(bc.x < 0. || bc.y < 0. || bc.z < 0., "{:?} should be outside", p);
        }
    }

    #[test]
    fn degenerate_triangle_yields_sentinel() {
        let pts = tri((0., 0., 0.), (5., 5., 0.), (10., 10., 0.));
        let bc = barycentric(&pts, Vec3f::new(5., 5., 0.));
        assert_eq!(bc, Vec3f::new(-1., 1., 1.));
    }

    #[test]
    fn fill_covers_exactly_the_lattice_points() {
        let mut image = RgbImage::new(10, 10);
        let pts = tri((0., 0., 0.), (4., 0., 0.), (0., 4., 0.));
        fill_triangle(&pts, &mut image, utils::WHITE);

        assert_eq!(count(&image, utils::WHITE), 15);
        for (x, y, p) in image.enumerate_pixels() {
            let expected = x + y <= 4;
            assert_eq!(*p == utils::WHITE, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn fill_clips_to_image() {
        let mut image = RgbImage::new(8, 8);
        let pts = tri((-20., -20., 0.), (60., -20., 0.), (-20., 60., 0.));
        fill_triangle(&pts, &mut image, utils::RED);
        // the hypotenuse x + y = 40 passes beyond the whole 8x8 image
        assert_eq!(count(&image, utils::RED), 64);

        let mut image = RgbImage::new(8, 8);
        let offscreen = tri((-20., -20., 0.), (-10., -20., 0.), (-20., -10., 0.));
        fill_triangle(&offscreen, &mut image, utils::RED);
        assert_eq!(count(&image, utils::RED), 0);
    }

    #[test]
    fn near_triangle_wins_in_either_order() {
        let far = tri((0., 0., 0.1), (8., 0., 0.1), (0., 8., 0.1));
        let near = tri((0., 0., 0.9), (8., 0., 0.9), (0., 8., 0.9));

        for order in &[[(far, utils::RED), (near, utils::GREEN)], [(near, utils::GREEN), (far, utils::RED)]] {
            let mut image = RgbImage::new(10, 10);
            let mut zbuffer = DepthBuffer::new(10, 10);
            for (pts, color) in order {
                fill_triangle_depth(pts, &mut zbuffer, &mut image, *color);
            }
            assert_eq!(*image.get_pixel(1, 1), utils::GREEN);
            assert_eq!(count(&image, utils::RED), 0);
            assert_abs_diff_eq!(zbuffer.get(1, 1), 0.9, epsilon = 1e-6);
            assert_eq!(zbuffer.get(9, 9), f32::NEG_INFINITY);
        }
    }

    #[test]
    fn depth_buffer_keeps_maximum() {
        let mut zbuffer = DepthBuffer::new(3, 2);
        assert!(zbuffer.test_and_set(2, 1, 0.5));
        assert!(!zbuffer.test_and_set(2, 1, 0.5));
        assert!(!zbuffer.test_and_set(2, 1, 0.2));
        assert!(zbuffer.test_and_set(2, 1, 0.7));
        assert_eq!(zbuffer.get(2, 1), 0.7);
        zbuffer.clear();
        assert_eq!(zbuffer.get(2, 1), f32::NEG_INFINITY);
        zbuffer.reset(4, 4);
        assert_eq!((zbuffer.width(), zbuffer.height()), (4, 4));
    }

    #[test]
    fn depth_is_interpolated_across_triangle() {
        let mut image = RgbImage::new(10, 10);
        let mut zbuffer = DepthBuffer::new(10, 10);
        let pts = tri((0., 0., 0.), (8., 0., 8.), (0., 8., 0.));
        fill_triangle_depth(&pts, &mut zbuffer, &mut image, utils::WHITE);
        assert_abs_diff_eq!(zbuffer.get(4, 2), 4., epsilon = 1e-4);
        assert_abs_diff_eq!(zbuffer.get(0, 5), 0., epsilon = 1e-4);
    }

    #[test]
    fn textured_fill_samples_interpolated_uv() {
        let mut image = RgbImage::new(10, 10);
        let mut zbuffer = DepthBuffer::new(10, 10);
        let t = Triangle::new(tri((0., 0., 1.), (8., 0., 1.), (0., 8., 1.)))
            .with_uvs([Vec2f::new(0., 0.), Vec2f::new(1., 0.), Vec2f::new(0., 1.)])
            .with_intensity([0.5, 0.5, 0.5]);
        // left half of the texture red, right half green
        let texture = |uv: Vec2f| if uv.x < 0.5 { utils::RED } else { utils::GREEN };
        fill_triangle_textured(&t, &mut zbuffer, &mut image, texture);
        assert_eq!(*image.get_pixel(1, 1), utils::scale(utils::RED, 0.5));
        assert_eq!(*image.get_pixel(6, 1), utils::scale(utils::GREEN, 0.5));
    }

    #[test]
    fn scanline_fills_rows_below_top_vertex() {
        let mut image = RgbImage::new(10, 10);
        triangle(Vec2i::new(0, 4), Vec2i::new(4, 0), Vec2i::new(0, 0), &mut image, utils::WHITE);
        for y in 0..4 {
            let row = (0..10).filter(|&x| *image.get_pixel(x, y) == utils::WHITE).count();
            assert_eq!(row as u32, 5 - y, "row {}", y);
        }
        assert_eq!((0..10).filter(|&x| *image.get_pixel(x, 4) == utils::WHITE).count(), 0);
    }

    #[test]
    fn scanline_skips_flat_triangle() {
        let mut image = RgbImage::new(10, 10);
        triangle(Vec2i::new(0, 3), Vec2i::new(4, 3), Vec2i::new(8, 3), &mut image, utils::WHITE);
        assert_eq!(count(&image, utils::WHITE), 0);
    }

    #[test]
    fn scanline_rows_are_contiguous() {
        let mut image = RgbImage::new(200, 200);
        triangle(Vec2i::new(10, 70), Vec2i::new(50, 160), Vec2i::new(70, 80), &mut image, utils::RED);
        for y in 0..200 {
            let xs: Vec<u32> = (0..200).filter(|&x| *image.get_pixel(x, y) == utils::RED).collect();
            if let (Some(first), Some(last)) = (xs.first(), xs.last()) {
                assert_eq!((last - first + 1) as usize, xs.len(), "gap in row {}", y);
            }
        }
        assert!(count(&image, utils::RED) > 0);
    }

    struct Solid {
        color: Option<Rgb<u8>>,
        pts: [Vec3f; 3],
    }

    impl Shader for Solid {
        fn vertex(&mut self, _face: usize, nth: usize) -> Vec3f {
            self.pts[nth]
        }

        fn fragment(&self, _bar: Vec3f) -> Option<Rgb<u8>> {
            self.color
        }
    }

    #[test]
    fn shaded_fill_writes_color_and_depth() {
        let mut image = RgbImage::new(10, 10);
        let mut zbuffer = GrayImage::new(10, 10);
        let mut shader = Solid {
            color: Some(utils::GREEN),
            pts: tri((0.2, 0.7, 100.), (8.9, 0., 100.), (0., 8.5, 100.)),
        };
        draw_shaded(&mut shader, 1, &mut image, &mut zbuffer);
        assert_eq!(*image.get_pixel(1, 1), utils::GREEN);
        assert_eq!(zbuffer.get_pixel(1, 1)[0], 100);
        assert_eq!(zbuffer.get_pixel(9, 9)[0], 0);
    }

    #[test]
    fn shaded_fill_respects_depth_and_discard() {
        let mut image = RgbImage::new(10, 10);
        let mut zbuffer = GrayImage::new(10, 10);
        let near = tri((0., 0., 200.), (8., 0., 200.), (0., 8., 200.));
        let far = tri((0., 0., 50.), (8., 0., 50.), (0., 8., 50.));

        fill_triangle_shaded(&near, &Solid { color: Some(utils::GREEN), pts: near }, &mut image, &mut zbuffer);
        fill_triangle_shaded(&far, &Solid { color: Some(utils::RED), pts: far }, &mut image, &mut zbuffer);
        assert_eq!(*image.get_pixel(1, 1), utils::GREEN);
        assert_eq!(zbuffer.get_pixel(1, 1)[0], 200);

        let mut image = RgbImage::new(10, 10);
        let mut zbuffer = GrayImage::new(10, 10);
        fill_triangle_shaded(&near, &Solid { color: None, pts: near }, &mut image, &mut zbuffer);
        assert_eq!(count(&image, utils::BLACK), 100);
        assert_eq!(zbuffer.get_pixel(1, 1)[0], 0);
    }
}
