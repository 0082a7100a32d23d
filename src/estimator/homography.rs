use nalgebra::{DMatrix, Matrix3, SVD};

use crate::error::{Result, StereoGlueError};
use crate::estimator::Estimator;
use crate::types::{MatchPair, Model, PointMatrix, ProblemType};

/// Direct Linear Transform solver for planar homographies, following the
/// same build-A/SVD-null-space shape as
/// `optirustic::utils::solve_linear_system` (SVD-based least squares via
/// `nalgebra`).
pub struct HomographyEstimator;

/// Build the `2n x 9` DLT coefficient matrix for `Ah = 0` and solve via the
/// right singular vector of the smallest singular value, optionally
/// weighting each correspondence's two rows.
fn solve_dlt(
    correspondences: &[MatchPair],
    src: &PointMatrix,
    dst: &PointMatrix,
    weights: Option<&[f64]>,
) -> Result<Matrix3<f64>> {
    let n = correspondences.len();
    if n < 4 {
        return Err(StereoGlueError::InsufficientData { have: n, need: 4 });
    }

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for (row, pair) in correspondences.iter().enumerate() {
        let (x, y) = src.xy(pair.src);
        let (xp, yp) = dst.xy(pair.dst);
        let w = weights.map_or(1.0, |w| w[row]).sqrt();

        let first = [-x * w, -y * w, -w, 0.0, 0.0, 0.0, x * xp * w, y * xp * w, xp * w];
        let second = [0.0, 0.0, 0.0, -x * w, -y * w, -w, x * yp * w, y * yp * w, yp * w];
        for col in 0..9 {
            a[(2 * row, col)] = first[col];
            a[(2 * row + 1, col)] = second[col];
        }
    }

    let svd = SVD::new(a, true, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| StereoGlueError::SolverFailure("homography SVD did not converge".to_string()))?;
    let h = v_t.row(v_t.nrows() - 1);

    let norm = h.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm < f64::EPSILON {
        return Err(StereoGlueError::SolverFailure(
            "degenerate homography null space".to_string(),
        ));
    }

    Ok(Matrix3::new(
        h[0] / norm, h[1] / norm, h[2] / norm,
        h[3] / norm, h[4] / norm, h[5] / norm,
        h[6] / norm, h[7] / norm, h[8] / norm,
    ))
}

impl Estimator for HomographyEstimator {
    fn sample_size(&self) -> usize {
        4
    }

    fn non_minimal_sample_size(&self) -> usize {
        6
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
                "homography minimal solve needs exactly {} correspondences, got {}",
                self.sample_size(),
                correspondences.len()
            )));
        }
        match solve_dlt(correspondences, src, dst, None) {
            Ok(h) => out_models.push(Model::new(h, ProblemType::Homography)),
            Err(StereoGlueError::SolverFailure(_)) => {}
            Err(e) => return Err(e),
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
        match solve_dlt(correspondences, src, dst, weights) {
            Ok(h) => Ok(Some(Model::new(h, ProblemType::Homography))),
            Err(StereoGlueError::SolverFailure(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn residual(&self, model: &Model, src_point: (f64, f64), dst_point: (f64, f64)) -> f64 {
        let h = &model.matrix;
        let src_h = nalgebra::Vector3::new(src_point.0, src_point.1, 1.0);
        let dst_h = nalgebra::Vector3::new(dst_point.0, dst_point.1, 1.0);

        let projected = h * src_h;
        let forward_err = if projected.z.abs() > f64::EPSILON {
            let px = projected.x / projected.z;
            let py = projected.y / projected.z;
            ((px - dst_point.0).powi(2) + (py - dst_point.1).powi(2)).sqrt()
        } else {
            f64::INFINITY
        };

        let h_inv = match h.try_inverse() {
            Some(inv) => inv,
            None => return forward_err,
        };
        let back_projected = h_inv * dst_h;
        let backward_err = if back_projected.z.abs() > f64::EPSILON {
            let px = back_projected.x / back_projected.z;
            let py = back_projected.y / back_projected.z;
            ((px - src_point.0).powi(2) + (py - src_point.1).powi(2)).sqrt()
        } else {
            f64::INFINITY
        };

        ((forward_err.powi(2) + backward_err.powi(2)) / 2.0).sqrt()
    }

    fn is_valid_model(&self, model: &Model) -> bool {
        model.matrix.determinant().abs() > 1e-12
    }
}
