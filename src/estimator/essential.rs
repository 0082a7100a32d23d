use nalgebra::{Matrix3, SVD, Vector3};

use crate::error::{Result, StereoGlueError};
use crate::estimator::fundamental::sampson_distance;
use crate::estimator::Estimator;
use crate::types::{MatchPair, Model, PointMatrix, ProblemType};

/// Essential matrix solver for calibrated cameras.
///
/// The minimal 5-point problem's exact algebraic solution (Nister's
/// Groebner-basis construction, yielding up to 10 real candidates) is
/// standard and treated as an external algebraic collaborator per the
/// design scope — this estimator instead projects the linear null-space
/// solution of the 5 (or more) normalized correspondences onto the
/// essential-matrix manifold (equal non-zero singular values) via SVD,
/// yielding a single candidate per call. Non-minimal refits use the same
/// projection over the full weighted correspondence set.
pub struct EssentialEstimator {
    k_src: Matrix3<f64>,
    k_dst: Matrix3<f64>,
    k_src_inv: Matrix3<f64>,
    k_dst_inv: Matrix3<f64>,
}

impl EssentialEstimator {
    pub fn new(k_src: Matrix3<f64>, k_dst: Matrix3<f64>) -> Self {
        let k_src_inv = k_src.try_inverse().unwrap_or_else(Matrix3::identity);
        let k_dst_inv = k_dst.try_inverse().unwrap_or_else(Matrix3::identity);
        Self {
            k_src,
            k_dst,
            k_src_inv,
            k_dst_inv,
        }
    }

    fn normalize(&self, src: (f64, f64), dst: (f64, f64)) -> ((f64, f64), (f64, f64)) {
        let s = self.k_src_inv * Vector3::new(src.0, src.1, 1.0);
        let d = self.k_dst_inv * Vector3::new(dst.0, dst.1, 1.0);
        ((s.x / s.z, s.y / s.z), (d.x / d.z, d.y / d.z))
    }

    /// Fundamental matrix in normalized (calibrated) coordinates, i.e. the
    /// essential matrix expressed via the pixel-space `F = K_dst^-T E
    /// K_src^-1` relationship, computed here in reverse.
    fn pixel_fundamental(&self, e: &Matrix3<f64>) -> Matrix3<f64> {
        self.k_dst_inv.transpose() * e * self.k_src_inv
    }
}

fn project_to_essential_manifold(m: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let svd = SVD::new(m, true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let sigma = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
    Some(u * sigma * v_t)
}

impl Estimator for EssentialEstimator {
    fn sample_size(&self) -> usize {
        5
    }

    fn non_minimal_sample_size(&self) -> usize {
        7
    }

    fn estimate_minimal(
        &self,
        correspondences: &[MatchPair],
        src: &PointMatrix,
        dst: &PointMatrix,
        out_models: &mut Vec<Model>,
    ) -> Result<()> {
        if correspondences.len() != self.sample_size() {
            return Err(StereoGlueError::InvalidInput(format!(
                "essential minimal solve needs exactly {} correspondences, got {}",
                self.sample_size(),
                correspondences.len()
            )));
        }
        if let Some(model) = self.solve(correspondences, None, src, dst)? {
            out_models.push(model);
        }
        Ok(())
    }

    fn estimate_non_minimal(
        &self,
        correspondences: &[MatchPair],
        weights: Option<&[f64]>,
        src: &PointMatrix,
        dst: &PointMatrix,
    ) -> Result<Option<Model>> {
        if correspondences.len() < self.sample_size() {
            return Ok(None);
        }
        self.solve(correspondences, weights, src, dst)
    }

    fn residual(&self, model: &Model, src_point: (f64, f64), dst_point: (f64, f64)) -> f64 {
        let f = self.pixel_fundamental(&model.matrix);
        sampson_distance(&f, src_point, dst_point)
    }

    fn is_valid_model(&self, model: &Model) -> bool {
        let svd = SVD::new(model.matrix, false, false);
        let sv = svd.singular_values;
        // An essential matrix has two equal non-zero singular values and a
        // zero third one.
        sv[2] < 1e-6 * sv[0].max(1e-12) && (sv[0] - sv[1]).abs() < 0.1 * sv[0].max(1e-12)
    }
}

impl EssentialEstimator {
    fn solve(
        &self,
        correspondences: &[MatchPair],
        weights: Option<&[f64]>,
        src: &PointMatrix,
        dst: &PointMatrix,
    ) -> Result<Option<Model>> {
        use nalgebra::DMatrix;
        let n = correspondences.len();
        let mut a = DMatrix::<f64>::zeros(n, 9);
        for (row, pair) in correspondences.iter().enumerate() {
            let (s, d) = self.normalize(src.xy(pair.src), dst.xy(pair.dst));
            let w = weights.map_or(1.0, |w| w[row]);
            let coeffs = [d.0 * s.0, d.0 * s.1, d.0, d.1 * s.0, d.1 * s.1, d.1, s.0, s.1, 1.0];
            for col in 0..9 {
                a[(row, col)] = coeffs[col] * w;
            }
        }

        let svd = SVD::new(a, true, true);
        let Some(v_t) = svd.v_t else {
            return Ok(None);
        };
        let h = v_t.row(v_t.nrows() - 1);
        let raw = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

        match project_to_essential_manifold(raw) {
            Some(e) => Ok(Some(Model::new(e, ProblemType::Essential))),
            None => Ok(None),
        }
    }
}
