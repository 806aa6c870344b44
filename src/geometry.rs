//! Vector and matrix algebra used by the pipeline.
//!
//! Fixed size vectors come from `cgmath`. The transform pipeline works on
//! [`Matrix`], a dynamically sized row-major grid, so that points (4x1) and
//! transforms (4x4) share one multiplication routine.
use std::fmt;
use std::ops::{Index, IndexMut, Mul};

use cgmath::{Vector2, Vector3, Vector4};

pub type Vec2f = Vector2<f32>;
pub type Vec2i = Vector2<i32>;
pub type Vec3f = Vector3<f32>;
pub type Vec3i = Vector3<i32>;
pub type Vec4f = Vector4<f32>;

/// A `rows x cols` grid of `f32` stored row by row.
///
/// Dimensions are fixed at construction. Every operation that depends on
/// compatible dimensions asserts them: a mismatch is a bug in how the
/// pipeline was put together, not a runtime condition, so it panics.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Zero filled matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.; rows * cols],
        }
    }

    pub fn identity(dimensions: usize) -> Self {
        let mut m = Matrix::new(dimensions, dimensions);
        for i in 0..dimensions {
            m[(i, i)] = 1.;
        }
        m
    }

    /// Builds a matrix from row slices. All rows must have the same length.
    pub fn from_rows(rows: &[&[f32]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut m = Matrix::new(rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), cols, "row {} has {} columns, expected {}", i, row.len(), cols);
            m.data[i * cols..(i + 1) * cols].copy_from_slice(row);
        }
        m
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn transpose(&self) -> Matrix {
        let mut result = Matrix::new(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                result[(j, i)] = self[(i, j)];
            }
        }
        result
    }

    /// Inverse by Gauss-Jordan elimination on `[M | I]`.
    ///
    /// No pivoting is done: each diagonal element is used as the pivot as it
    /// comes, so a zero pivot (singular matrix, or one that needs row swaps)
    /// yields NaN/inf entries instead of an error.
    ///
    /// Panics if the matrix is not square.
    pub fn inverse(&self) -> Matrix {
        assert_eq!(
            self.rows, self.cols,
            "inverse of a non-square {}x{} matrix",
            self.rows, self.cols
        );
        let n = self.rows;
        let mut aug = Matrix::new(n, n * 2);
        for i in 0..n {
            for j in 0..n {
                aug[(i, j)] = self[(i, j)];
            }
            aug[(i, i + n)] = 1.;
        }

        // forward elimination, normalizing each pivot row as we go
        for i in 0..n {
            let pivot = aug[(i, i)];
            for j in 0..aug.cols {
                aug[(i, j)] /= pivot;
            }
            for k in i + 1..n {
                let coeff = aug[(k, i)];
                for j in 0..aug.cols {
                    aug[(k, j)] -= aug[(i, j)] * coeff;
                }
            }
        }

        // back substitution
        for i in (1..n).rev() {
            for k in (0..i).rev() {
                let coeff = aug[(k, i)];
                for j in 0..aug.cols {
                    aug[(k, j)] -= aug[(i, j)] * coeff;
                }
            }
        }

        let mut inverse = Matrix::new(n, n);
        for i in 0..n {
            for j in 0..n {
                inverse[(i, j)] = aug[(i, j + n)];
            }
        }
        inverse
    }

    /// Embeds a point as the homogeneous column `[x, y, z, 1]`.
    pub fn from_point(v: Vec3f) -> Matrix {
        let mut m = Matrix::new(4, 1);
        m[(0, 0)] = v.x;
        m[(1, 0)] = v.y;
        m[(2, 0)] = v.z;
        m[(3, 0)] = 1.;
        m
    }

    /// Divides the first three components of a homogeneous column by the
    /// fourth and resets the fourth to 1.
    pub fn perspective_divide(mut self) -> Matrix {
        assert!(
            self.rows == 4 && self.cols == 1,
            "perspective divide of a {}x{} matrix",
            self.rows,
            self.cols
        );
        let w = self[(3, 0)];
        for i in 0..3 {
            self[(i, 0)] /= w;
        }
        self[(3, 0)] = 1.;
        self
    }

    /// First three rows of a column matrix, dropping `w` as is.
    pub fn to_point(&self) -> Vec3f {
        assert!(self.rows >= 3 && self.cols == 1);
        Vec3f::new(self[(0, 0)], self[(1, 0)], self[(2, 0)])
    }

    pub fn to_vec4(&self) -> Vec4f {
        assert!(self.rows == 4 && self.cols == 1);
        Vec4f::new(self[(0, 0)], self[(1, 0)], self[(2, 0)], self[(3, 0)])
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}

impl<'a> Mul<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    /// Panics unless `self.ncols() == rhs.nrows()`.
    fn mul(self, rhs: &'a Matrix) -> Matrix {
        assert_eq!(
            self.cols, rhs.rows,
            "cannot multiply {}x{} by {}x{}",
            self.rows, self.cols, rhs.rows, rhs.cols
        );
        let mut result = Matrix::new(self.rows, rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut sum = 0.;
                for k in 0..self.cols {
                    sum += self[(i, k)] * rhs[(k, j)];
                }
                result[(i, j)] = sum;
            }
        }
        result
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        &self * &rhs
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{}", self[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::InnerSpace;

    const EPSILON: f32 = 1e-4;

    fn assert_matrix_eq(a: &Matrix, b: &Matrix) {
        assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert_abs_diff_eq!(a[(i, j)], b[(i, j)], epsilon = EPSILON);
            }
        }
    }

    fn samples() -> Vec<Matrix> {
        vec![
            Matrix::from_rows(&[&[4., 1.], &[2., 3.]]),
            Matrix::from_rows(&[&[2., -1., 0.], &[-1., 2., -1.], &[0., -1., 2.]]),
            Matrix::from_rows(&[
                &[5., 1., 0., 2.],
                &[1., 4., 1., 0.],
                &[0., 2., 6., 1.],
                &[1., 0., 1., 3.],
            ]),
        ]
    }

    #[test]
    fn identity_is_neutral() {
        let m = &samples()[2];
        assert_matrix_eq(&(&Matrix::identity(4) * m), m);
        assert_matrix_eq(&(m * &Matrix::identity(4)), m);
    }

    #[test]
    fn multiply_non_square() {
        let a = Matrix::from_rows(&[&[1., 2., 3.], &[4., 5., 6.]]);
        let b = Matrix::from_rows(&[&[1.], &[0.], &[-1.]]);
        let c = &a * &b;
        assert_eq!((c.nrows(), c.ncols()), (2, 1));
        assert_eq!(c[(0, 0)], -2.);
        assert_eq!(c[(1, 0)], -2.);
    }

    #[test]
    #[should_panic(expected = "cannot multiply")]
    fn multiply_dimension_mismatch_panics() {
        let a = Matrix::new(2, 3);
        let b = Matrix::new(2, 3);
        let _ = &a * &b;
    }

    #[test]
    #[should_panic(expected = "non-square")]
    fn inverse_of_non_square_panics() {
        Matrix::new(2, 3).inverse();
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_is_bounds_checked() {
        let m = Matrix::new(2, 2);
        let _ = m[(0, 2)];
    }

    #[test]
    fn transpose_swaps_dimensions() {
        let a = Matrix::from_rows(&[&[1., 2., 3.], &[4., 5., 6.]]);
        let t = a.transpose();
        assert_eq!((t.nrows(), t.ncols()), (3, 2));
        assert_eq!(t[(2, 0)], 3.);
        assert_eq!(t[(0, 1)], 4.);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn matrix_times_inverse_is_identity() {
        for m in samples() {
            let n = m.nrows();
            assert_matrix_eq(&(&m * &m.inverse()), &Matrix::identity(n));
            assert_matrix_eq(&(&m.inverse() * &m), &Matrix::identity(n));
        }
    }

    #[test]
    fn double_inverse_round_trips() {
        for m in samples() {
            assert_matrix_eq(&m.inverse().inverse(), &m);
        }
    }

    #[test]
    fn perspective_divide_is_idempotent() {
        let mut p = Matrix::from_point(Vec3f::new(2., -4., 6.));
        p[(3, 0)] = 2.;
        let once = p.perspective_divide();
        assert_eq!(once.to_point(), Vec3f::new(1., -2., 3.));
        assert_eq!(once[(3, 0)], 1.);
        let twice = once.clone().perspective_divide();
        assert_eq!(twice, once);
    }

    #[test]
    fn point_embedding_round_trips() {
        let v = Vec3f::new(0.25, -1.5, 3.);
        let h = Matrix::from_point(v);
        assert_eq!(h.to_vec4(), Vec4f::new(0.25, -1.5, 3., 1.));
        assert_eq!(h.to_point(), v);
    }

    #[test]
    fn vector_algebra() {
        let x = Vec3f::unit_x();
        let y = Vec3f::unit_y();
        assert_eq!(x.cross(y), Vec3f::unit_z());
        assert_eq!(x.dot(y), 0.);
        assert_abs_diff_eq!(Vec3f::new(3., 4., 0.).normalize().magnitude(), 1., epsilon = EPSILON);
        assert_eq!(Vec2i::new(1, 2) + Vec2i::new(3, 4), Vec2i::new(4, 6));
        assert_eq!(Vec3i::new(1, 2, 3) * 2, Vec3i::new(2, 4, 6));
    }

    #[test]
    fn display_is_tab_separated() {
        let m = Matrix::from_rows(&[&[1., 2.], &[3., 4.]]);
        assert_eq!(m.to_string(), "1\t2\n3\t4\n");
    }
}
