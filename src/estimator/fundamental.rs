use nalgebra::{DMatrix, Matrix3, SVD};

use crate::error::{Result, StereoGlueError};
use crate::estimator::Estimator;
use crate::types::{MatchPair, Model, PointMatrix, ProblemType};

/// 7-/8-point fundamental matrix solver. The minimal (7-point) case has a
/// two-dimensional null space and yields up to three real candidate models
/// from the cubic constraint `det(F) = 0`; the non-minimal (8-point+) case
/// uses the single smallest-singular-vector solution with rank-2
/// enforcement, following the same SVD-null-space shape as
/// `optirustic::utils::solve_linear_system`.
pub struct FundamentalEstimator;

fn build_constraint_matrix(
    correspondences: &[MatchPair],
    src: &PointMatrix,
    dst: &PointMatrix,
    weights: Option<&[f64]>,
) -> DMatrix<f64> {
    let n = correspondences.len();
    let mut a = DMatrix::<f64>::zeros(n, 9);
    for (row, pair) in correspondences.iter().enumerate() {
        let (x, y) = src.xy(pair.src);
        let (xp, yp) = dst.xy(pair.dst);
        let w = weights.map_or(1.0, |w| w[row]);
        let coeffs = [xp * x, xp * y, xp, yp * x, yp * y, yp, x, y, 1.0];
        for col in 0..9 {
            a[(row, col)] = coeffs[col] * w;
        }
    }
    a
}

fn null_space_vector(a: DMatrix<f64>, rank_from_end: usize) -> Result<Matrix3<f64>> {
    let svd = SVD::new(a, true, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| StereoGlueError::SolverFailure("fundamental SVD did not converge".to_string()))?;
    let row_idx = v_t.nrows().checked_sub(rank_from_end).ok_or_else(|| {
        StereoGlueError::SolverFailure("fundamental SVD null space too small".to_string())
    })?;
    let h = v_t.row(row_idx);
    Ok(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8],
    ))
}

/// Force `matrix` to rank 2 by zeroing its smallest singular value.
fn enforce_rank2(matrix: Matrix3<f64>) -> Matrix3<f64> {
    let svd = SVD::new(matrix, true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return matrix;
    };
    let mut singular = svd.singular_values;
    singular[2] = 0.0;
    let sigma = Matrix3::from_diagonal(&singular);
    u * sigma * v_t
}

/// Real roots of `a3*x^3 + a2*x^2 + a1*x + a0 = 0` via the trigonometric
/// method for a depressed cubic.
fn solve_cubic(a3: f64, a2: f64, a1: f64, a0: f64) -> Vec<f64> {
    if a3.abs() < 1e-12 {
        // degrades to a quadratic
        if a2.abs() < 1e-12 {
            if a1.abs() < 1e-12 {
                return vec![];
            }
            return vec![-a0 / a1];
        }
        let disc = a1 * a1 - 4.0 * a2 * a0;
        if disc < 0.0 {
            return vec![];
        }
        let sqrt_disc = disc.sqrt();
        return vec![(-a1 + sqrt_disc) / (2.0 * a2), (-a1 - sqrt_disc) / (2.0 * a2)];
    }

    let (b, c, d) = (a2 / a3, a1 / a3, a0 / a3);
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = b / 3.0;

    if p.abs() < 1e-12 {
        return vec![(-q).cbrt() - shift];
    }

    let discriminant = (q * q / 4.0) + (p * p * p / 27.0);
    if discriminant > 0.0 {
        let sqrt_disc = discriminant.sqrt();
        let u = (-q / 2.0 + sqrt_disc).cbrt();
        let v = (-q / 2.0 - sqrt_disc).cbrt();
        vec![u + v - shift]
    } else {
        let r = (-(p.powi(3)) / 27.0).sqrt();
        let phi = (-q / (2.0 * r)).clamp(-1.0, 1.0).acos();
        let m = 2.0 * r.cbrt();
        vec![
            m * (phi / 3.0).cos() - shift,
            m * ((phi + 2.0 * std::f64::consts::PI) / 3.0).cos() - shift,
            m * ((phi + 4.0 * std::f64::consts::PI) / 3.0).cos() - shift,
        ]
    }
}

impl Estimator for FundamentalEstimator {
    fn sample_size(&self) -> usize {
        7
    }

    fn non_minimal_sample_size(&self) -> usize {
        9
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
                "fundamental minimal solve needs exactly {} correspondences, got {}",
                self.sample_size(),
                correspondences.len()
            )));
        }
        let a = build_constraint_matrix(correspondences, src, dst, None);
        let svd = SVD::new(a, true, true);
        let v_t = match svd.v_t {
            Some(v_t) => v_t,
            None => return Ok(()),
        };
        let n = v_t.nrows();
        let f1_row = v_t.row(n - 1);
        let f2_row = v_t.row(n - 2);
        let f1 = Matrix3::new(
            f1_row[0], f1_row[1], f1_row[2], f1_row[3], f1_row[4], f1_row[5], f1_row[6], f1_row[7],
            f1_row[8],
        );
        let f2 = Matrix3::new(
            f2_row[0], f2_row[1], f2_row[2], f2_row[3], f2_row[4], f2_row[5], f2_row[6], f2_row[7],
            f2_row[8],
        );

        // det(lambda * f1 + (1 - lambda) * f2) is cubic in lambda; sample at
        // four points and solve for the coefficients via finite differences.
        let det_at = |lambda: f64| (lambda * f1 + (1.0 - lambda) * f2).determinant();
        let (d0, d1, d2, d3) = (det_at(0.0), det_at(1.0), det_at(2.0), det_at(3.0));
        // Newton's forward-difference interpolation for a cubic.
        let fd1 = d1 - d0;
        let fd2 = d2 - 2.0 * d1 + d0;
        let fd3 = d3 - 3.0 * d2 + 3.0 * d1 - d0;
        let a3 = fd3 / 6.0;
        let a2 = (fd2 - fd3) / 2.0;
        let a1 = fd1 - fd2 / 2.0 + fd3 / 3.0;
        let a0 = d0;

        for lambda in solve_cubic(a3, a2, a1, a0) {
            let f = lambda * f1 + (1.0 - lambda) * f2;
            let f = enforce_rank2(f);
            out_models.push(Model::new(f, ProblemType::Fundamental));
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
        if correspondences.len() < 8 {
            return Ok(None);
        }
        let a = build_constraint_matrix(correspondences, src, dst, weights);
        match null_space_vector(a, 1) {
            Ok(f) => Ok(Some(Model::new(enforce_rank2(f), ProblemType::Fundamental))),
            Err(StereoGlueError::SolverFailure(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn residual(&self, model: &Model, src_point: (f64, f64), dst_point: (f64, f64)) -> f64 {
        sampson_distance(&model.matrix, src_point, dst_point)
    }

    fn is_valid_model(&self, model: &Model) -> bool {
        let svd = SVD::new(model.matrix, false, false);
        // rank-2: the smallest singular value should be (close to) zero and
        // the other two should be meaningfully non-zero.
        svd.singular_values[2] < 1e-6 * svd.singular_values[0].max(1e-12)
            && svd.singular_values[1] > 1e-12
    }
}

/// Sampson distance: a first-order approximation to the reprojection error
/// of the epipolar constraint `x'^T F x = 0`.
pub(crate) fn sampson_distance(f: &Matrix3<f64>, src: (f64, f64), dst: (f64, f64)) -> f64 {
    let x = nalgebra::Vector3::new(src.0, src.1, 1.0);
    let xp = nalgebra::Vector3::new(dst.0, dst.1, 1.0);

    let fx = f * x;
    let ftxp = f.transpose() * xp;
    let numerator = (xp.dot(&fx)).powi(2);
    let denominator = fx.x.powi(2) + fx.y.powi(2) + ftxp.x.powi(2) + ftxp.y.powi(2);
    if denominator < f64::EPSILON {
        return f64::INFINITY;
    }
    (numerator / denominator).sqrt()
}
