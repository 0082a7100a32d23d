//! Synthetic data generators and approximate-equality assertions shared by
//! unit tests and `tests/scenarios.rs`, mirroring `optirustic::core::test_utils`.

use nalgebra::{Matrix3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::PointMatrix;

/// `n_inliers` correspondences consistent with a fixed, mildly projective
/// ground-truth homography, plus `n_outliers` correspondences with
/// independently random destinations. Returns `(source, destination,
/// ground_truth)`.
pub fn synthetic_homography_correspondences(
    n_inliers: usize,
    n_outliers: usize,
    seed: u64,
) -> (PointMatrix, PointMatrix, Matrix3<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    #[rustfmt::skip]
    let h = Matrix3::new(
        1.05,    0.02,   3.0,
        -0.01,   0.98,  -2.0,
        0.0003, -0.0002, 1.0,
    );

    let total = n_inliers + n_outliers;
    let mut src_data = Vec::with_capacity(total * 2);
    let mut dst_data = Vec::with_capacity(total * 2);

    for _ in 0..n_inliers {
        let x = rng.gen_range(0.0..640.0);
        let y = rng.gen_range(0.0..480.0);
        let p = h * Vector3::new(x, y, 1.0);
        src_data.push(x);
        src_data.push(y);
        dst_data.push(p.x / p.z);
        dst_data.push(p.y / p.z);
    }
    for _ in 0..n_outliers {
        src_data.push(rng.gen_range(0.0..640.0));
        src_data.push(rng.gen_range(0.0..480.0));
        dst_data.push(rng.gen_range(0.0..640.0));
        dst_data.push(rng.gen_range(0.0..480.0));
    }

    let src = PointMatrix::from_row_slice(total, 2, &src_data).unwrap();
    let dst = PointMatrix::from_row_slice(total, 2, &dst_data).unwrap();
    (src, dst, h)
}

/// `n_inliers` correspondences of random 3D points seen by two pixel-scaled
/// pinhole cameras related by a small rotation/translation, plus
/// `n_outliers` random mismatches. Returns `(source, destination,
/// approximate_ground_truth_fundamental)` — the ground truth is only
/// approximate since the pixel scaling/principal point shift is folded in
/// informally, adequate for inlier-count assertions rather than exact
/// matrix comparisons.
pub fn synthetic_fundamental_correspondences(
    n_inliers: usize,
    n_outliers: usize,
    seed: u64,
) -> (PointMatrix, PointMatrix, Matrix3<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let angle: f64 = 0.05;
    #[rustfmt::skip]
    let r = Matrix3::new(
        angle.cos(), 0.0, angle.sin(),
        0.0,         1.0, 0.0,
        -angle.sin(), 0.0, angle.cos(),
    );
    let t = Vector3::new(0.5, 0.05, 0.0);
    #[rustfmt::skip]
    let t_cross = Matrix3::new(
        0.0,   -t.z,  t.y,
        t.z,    0.0, -t.x,
        -t.y,   t.x,  0.0,
    );
    let f_truth = t_cross * r;

    let total = n_inliers + n_outliers;
    let mut src_data = Vec::with_capacity(total * 2);
    let mut dst_data = Vec::with_capacity(total * 2);

    for _ in 0..n_inliers {
        let p = Vector3::new(
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(4.0..10.0),
        );
        let x1 = Vector3::new(p.x / p.z, p.y / p.z, 1.0);
        let p2 = r * p + t;
        let x2 = Vector3::new(p2.x / p2.z, p2.y / p2.z, 1.0);
        src_data.push(x1.x * 600.0 + 320.0);
        src_data.push(x1.y * 600.0 + 240.0);
        dst_data.push(x2.x * 600.0 + 320.0);
        dst_data.push(x2.y * 600.0 + 240.0);
    }
    for _ in 0..n_outliers {
        src_data.push(rng.gen_range(0.0..640.0));
        src_data.push(rng.gen_range(0.0..480.0));
        dst_data.push(rng.gen_range(0.0..640.0));
        dst_data.push(rng.gen_range(0.0..480.0));
    }

    let src = PointMatrix::from_row_slice(total, 2, &src_data).unwrap();
    let dst = PointMatrix::from_row_slice(total, 2, &dst_data).unwrap();
    (src, dst, f_truth)
}

/// Asserts two 3x3 matrices are elementwise equal within `epsilon`.
pub fn assert_approx_matrix_eq(a: &Matrix3<f64>, b: &Matrix3<f64>, epsilon: f64) {
    for i in 0..3 {
        for j in 0..3 {
            assert!(
                float_cmp::approx_eq!(f64, a[(i, j)], b[(i, j)], epsilon = epsilon),
                "matrices differ at ({i},{j}): {} vs {}",
                a[(i, j)],
                b[(i, j)]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homography_generator_is_reproducible() {
        let (src_a, dst_a, _) = synthetic_homography_correspondences(10, 2, 3);
        let (src_b, dst_b, _) = synthetic_homography_correspondences(10, 2, 3);
        for i in 0..12 {
            assert_eq!(src_a.xy(i), src_b.xy(i));
            assert_eq!(dst_a.xy(i), dst_b.xy(i));
        }
    }

    #[test]
    fn fundamental_generator_produces_requested_count() {
        let (src, dst, _) = synthetic_fundamental_correspondences(20, 5, 9);
        assert_eq!(src.len(), 25);
        assert_eq!(dst.len(), 25);
    }
}
