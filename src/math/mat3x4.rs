//! 3x4 affine transformation matrix.
//!
//! # Convention
//! - Vectors are **column vectors** on the right: `M * v`
//! - The implicit fourth row is always `[0, 0, 0, 1]`, so the matrix can only
//!   express rotation, scale and translation (the pipeline is orthographic)
//! - Translation is stored in the **last column**
//! - The mutating builders (`scale`, `translate`, `rotate_about_*`,
//!   `multiply`) all **pre-multiply**: each call appends a transform that is
//!   applied *after* everything already in the matrix
//!
//! # Example
//! ```ignore
//! let mut m = Mat3x4::identity();
//! m.translate(-center.x, -center.y, -center.z); // first: move to origin
//! m.multiply(&rotation);                        // then: rotate
//! m.scale(zoom, -zoom, zoom);                   // then: zoom and flip y
//! ```

use std::ops::Mul;

use super::vec3::Vec3;

/// Affine matrix stored as `data[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3x4 {
    data: [[f32; 4]; 3],
}

impl Default for Mat3x4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat3x4 {
    pub fn new(data: [[f32; 4]; 3]) -> Self {
        Mat3x4 { data }
    }

    pub fn identity() -> Self {
        Mat3x4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    /// Resets the matrix to identity in place.
    pub fn set_identity(&mut self) {
        *self = Self::identity();
    }

    /// Copies every element of `other` into this matrix.
    pub fn copy_from(&mut self, other: &Mat3x4) {
        self.data = other.data;
    }

    /// Scales row `i` by the `i`-th factor (scale applied after the current transform).
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) -> &mut Self {
        for (row, s) in self.data.iter_mut().zip([sx, sy, sz]) {
            for v in row.iter_mut() {
                *v *= s;
            }
        }
        self
    }

    /// Adds a translation applied after the current transform.
    pub fn translate(&mut self, tx: f32, ty: f32, tz: f32) -> &mut Self {
        self.data[0][3] += tx;
        self.data[1][3] += ty;
        self.data[2][3] += tz;
        self
    }

    /// Rotates about the x-axis by `degrees`. A zero angle is a no-op.
    pub fn rotate_about_x(&mut self, degrees: f32) -> &mut Self {
        if degrees != 0.0 {
            self.rotate_rows(1, 2, degrees);
        }
        self
    }

    /// Rotates about the y-axis by `degrees`. A zero angle is a no-op.
    pub fn rotate_about_y(&mut self, degrees: f32) -> &mut Self {
        if degrees != 0.0 {
            self.rotate_rows(2, 0, degrees);
        }
        self
    }

    /// Rotates about the z-axis by `degrees`. A zero angle is a no-op.
    pub fn rotate_about_z(&mut self, degrees: f32) -> &mut Self {
        if degrees != 0.0 {
            self.rotate_rows(0, 1, degrees);
        }
        self
    }

    /// Pre-multiplies by a planar rotation acting on rows `a` and `b`:
    /// `a' = c*a - s*b`, `b' = c*b + s*a`.
    fn rotate_rows(&mut self, a: usize, b: usize, degrees: f32) {
        let (s, c) = degrees.to_radians().sin_cos();
        let row_a = self.data[a];
        let row_b = self.data[b];
        for col in 0..4 {
            self.data[a][col] = c * row_a[col] - s * row_b[col];
            self.data[b][col] = c * row_b[col] + s * row_a[col];
        }
    }

    /// Composes `other` after this matrix: `self = other * self`.
    pub fn multiply(&mut self, other: &Mat3x4) -> &mut Self {
        *self = *other * *self;
        self
    }

    /// Transforms a point (implicit w = 1).
    #[inline]
    pub fn transform_point(&self, v: Vec3) -> Vec3 {
        let m = &self.data;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z + m[0][3],
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z + m[1][3],
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z + m[2][3],
        )
    }

    /// Transforms only the z component of a point.
    #[inline]
    pub fn transform_z(&self, v: Vec3) -> f32 {
        let m = &self.data[2];
        m[0] * v.x + m[1] * v.y + m[2] * v.z + m[3]
    }

    /// Recovers display Euler angles (degrees) from the rotation part.
    ///
    /// This is a lossy diagnostic conversion: near gimbal lock the X and Z
    /// angles are not unique. The result must never be fed back into the
    /// authoritative rotation matrix.
    pub fn euler_angles(&self) -> Vec3 {
        let m = &self.data;
        let angle_x = (-m[1][2]).atan2(m[2][2]);
        let (s1, c1) = angle_x.sin_cos();
        let c2 = (m[0][0] * m[0][0] + m[0][1] * m[0][1]).sqrt();
        let angle_y = m[0][2].atan2(c2);
        let angle_z = (-s1 * m[2][0] + c1 * m[1][0]).atan2(c1 * m[1][1] + s1 * m[2][1]);
        Vec3::new(
            angle_x.to_degrees(),
            angle_y.to_degrees(),
            angle_z.to_degrees(),
        )
    }

    /// True when every element is within `epsilon` of the identity.
    pub fn is_identity_within(&self, epsilon: f32) -> bool {
        let id = Self::identity();
        self.data
            .iter()
            .flatten()
            .zip(id.data.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row][col]
    }

    /// Set element at [row][col].
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row][col] = value;
    }
}

/// Affine composition: `A * B` applies B first, then A.
impl Mul<Mat3x4> for Mat3x4 {
    type Output = Mat3x4;

    fn mul(self, rhs: Mat3x4) -> Self::Output {
        let a = &self.data;
        let b = &rhs.data;
        let mut result = [[0.0f32; 4]; 3];

        for row in 0..3 {
            for col in 0..4 {
                result[row][col] =
                    a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
            }
            result[row][3] += a[row][3];
        }

        Mat3x4::new(result)
    }
}

/// Transform a point: Mat3x4 * Vec3 (w = 1).
impl Mul<Vec3> for Mat3x4 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Self::Output {
        self.transform_point(v)
    }
}
