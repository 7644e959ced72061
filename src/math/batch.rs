//! Batched operations over flat `[x, y, z, x, y, z, ...]` buffers.
//!
//! Mesh geometry is kept in flat `f32` buffers, so the per-frame transform
//! stage works on whole buffers instead of individual [`Vec3`]s. All functions
//! process `src.len() / 3` vectors; trailing elements that do not form a full
//! triple are ignored.

use super::mat3x4::Mat3x4;
use super::vec3::Vec3;

/// Full affine multiply-add of every vector in `src` into `dst`.
///
/// `dst` must hold at least as many elements as `src`.
pub fn transform_vectors(m: &Mat3x4, src: &[f32], dst: &mut [f32]) {
    debug_assert!(dst.len() >= src.len(), "destination buffer too small");
    let (m00, m01, m02, m03) = (m.get(0, 0), m.get(0, 1), m.get(0, 2), m.get(0, 3));
    let (m10, m11, m12, m13) = (m.get(1, 0), m.get(1, 1), m.get(1, 2), m.get(1, 3));
    let (m20, m21, m22, m23) = (m.get(2, 0), m.get(2, 1), m.get(2, 2), m.get(2, 3));

    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
        let (x, y, z) = (s[0], s[1], s[2]);
        d[0] = m00 * x + m01 * y + m02 * z + m03;
        d[1] = m10 * x + m11 * y + m12 * z + m13;
        d[2] = m20 * x + m21 * y + m22 * z + m23;
    }
}

/// Affine multiply-add of every vector in `buffer`, in place.
pub fn transform_vectors_in_place(m: &Mat3x4, buffer: &mut [f32]) {
    for v in buffer.chunks_exact_mut(3) {
        let [x, y, z] = [v[0], v[1], v[2]];
        let out = m.transform_point(Vec3::new(x, y, z));
        v[0] = out.x;
        v[1] = out.y;
        v[2] = out.z;
    }
}

/// Writes only the transformed z component of each vector: one value per
/// vector in `dst`.
///
/// Used for facing tests and palette lookups where x and y are not needed.
pub fn transform_vector_zs(m: &Mat3x4, src: &[f32], dst: &mut [f32]) {
    debug_assert!(dst.len() >= src.len() / 3, "destination buffer too small");
    let (m20, m21, m22, m23) = (m.get(2, 0), m.get(2, 1), m.get(2, 2), m.get(2, 3));

    for (s, d) in src.chunks_exact(3).zip(dst.iter_mut()) {
        *d = m20 * s[0] + m21 * s[1] + m22 * s[2] + m23;
    }
}

/// Normalizes every vector of `src` into `dst`.
///
/// Zero-length vectors are copied unchanged rather than producing NaNs.
pub fn normalize_vectors(src: &[f32], dst: &mut [f32]) {
    debug_assert!(dst.len() >= src.len(), "destination buffer too small");
    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
        let (x, y, z) = (s[0], s[1], s[2]);
        let len = (x * x + y * y + z * z).sqrt();
        if len > 0.0 {
            let inv = 1.0 / len;
            d[0] = x * inv;
            d[1] = y * inv;
            d[2] = z * inv;
        } else {
            d[0] = x;
            d[1] = y;
            d[2] = z;
        }
    }
}

/// Normalizes every vector of `buffer` in place.
pub fn normalize_vectors_in_place(buffer: &mut [f32]) {
    for v in buffer.chunks_exact_mut(3) {
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        if len > 0.0 {
            let inv = 1.0 / len;
            v[0] *= inv;
            v[1] *= inv;
            v[2] *= inv;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn transform_vectors_applies_translation() {
        let mut m = Mat3x4::identity();
        m.translate(1.0, 2.0, 3.0);
        let src = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut dst = [0.0; 6];
        transform_vectors(&m, &src, &mut dst);
        assert_eq!(dst, [1.0, 2.0, 3.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn transform_vector_zs_writes_one_value_per_vector() {
        let mut m = Mat3x4::identity();
        m.rotate_about_y(90.0);
        let src = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let mut dst = [9.0; 2];
        transform_vector_zs(&m, &src, &mut dst);
        assert_relative_eq!(dst[0], -1.0, epsilon = 1e-6);
        assert_relative_eq!(dst[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn normalize_vectors_guards_zero_length() {
        let src = [0.0, 0.0, 0.0, 0.0, 3.0, 4.0];
        let mut dst = [1.0; 6];
        normalize_vectors(&src, &mut dst);
        assert_eq!(&dst[..3], &[0.0, 0.0, 0.0]);
        assert_relative_eq!(dst[4], 0.6, epsilon = 1e-6);
        assert_relative_eq!(dst[5], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn in_place_variants_match_out_of_place() {
        let mut m = Mat3x4::identity();
        m.rotate_about_x(33.0).translate(-1.0, 0.5, 2.0);
        let src = [0.2, -0.7, 1.5, 3.0, 0.0, -2.0];

        let mut expected = [0.0; 6];
        transform_vectors(&m, &src, &mut expected);
        let mut in_place = src;
        transform_vectors_in_place(&m, &mut in_place);
        assert_eq!(in_place, expected);

        let mut normalized = [0.0; 6];
        normalize_vectors(&src, &mut normalized);
        let mut normalized_in_place = src;
        normalize_vectors_in_place(&mut normalized_in_place);
        assert_eq!(normalized, normalized_in_place);
    }
}
