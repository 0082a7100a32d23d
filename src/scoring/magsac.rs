use rayon::prelude::*;

use crate::estimator::Estimator;
use crate::scoring::{best_candidate, Scoring};
use crate::types::{MatchPair, MatchTable, Model, PointMatrix, Score};

/// Number of noise-scale steps marginalized over, per spec §4.4.
const MARGINALIZATION_STEPS: usize = 10;

/// MAGSAC-style marginalization: rather than a single hard threshold,
/// integrate the truncated-quadratic cost over a discretized noise-scale
/// range `[tau / k_max, tau]`, removing the sharp inlier/outlier boundary
/// from the cost while still reporting the truncated-equivalent inlier set
/// at `tau` for downstream consumers.
pub struct MagsacScoring {
    core_number: usize,
}

impl MagsacScoring {
    pub fn new(core_number: usize) -> Self {
        Self {
            core_number: core_number.max(1),
        }
    }
}

/// Marginalized likelihood contribution of one residual, integrated (via a
/// simple Riemann sum) over `MARGINALIZATION_STEPS` candidate noise scales
/// between `tau / MARGINALIZATION_STEPS` and `tau`.
fn marginalized_likelihood(residual: f64, tau: f64) -> f64 {
    let step = tau / MARGINALIZATION_STEPS as f64;
    let mut sum = 0.0;
    for i in 1..=MARGINALIZATION_STEPS {
        let scale = step * i as f64;
        let normalized = residual / scale;
        if normalized < 1.0 {
            sum += 1.0 - normalized * normalized;
        }
    }
    sum / MARGINALIZATION_STEPS as f64
}

impl Scoring for MagsacScoring {
    fn score(
        &self,
        src: &PointMatrix,
        dst: &PointMatrix,
        matches: &MatchTable,
        model: &Model,
        estimator: &dyn Estimator,
        inlier_threshold: f64,
        out_inliers: &mut Vec<MatchPair>,
    ) -> Score {
        let num_src = matches.num_src();
        let chunk_size = num_src.div_ceil(self.core_number).max(1);

        let (likelihood_sum, inliers): (f64, Vec<MatchPair>) = (0..num_src)
            .collect::<Vec<_>>()
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut local_likelihood = 0.0;
                let mut local_inliers = Vec::new();
                for &src_idx in chunk {
                    let Some((dst_idx, residual)) =
                        best_candidate(src_idx, src, dst, matches, model, estimator)
                    else {
                        continue;
                    };
                    local_likelihood += marginalized_likelihood(residual, inlier_threshold);
                    if residual <= inlier_threshold {
                        local_inliers.push(MatchPair::new(src_idx, dst_idx));
                    }
                }
                (local_likelihood, local_inliers)
            })
            .reduce(
                || (0.0, Vec::new()),
                |mut a, mut b| {
                    a.0 += b.0;
                    a.1.append(&mut b.1);
                    a
                },
            );

        out_inliers.extend(inliers);
        out_inliers.sort_unstable();
        Score {
            quality: likelihood_sum,
            inlier_count: out_inliers.len(),
            likelihood_sum: Some(likelihood_sum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::HomographyEstimator;
    use crate::types::ProblemType;
    use nalgebra::Matrix3;

    #[test]
    fn perfect_matches_yield_max_marginalized_likelihood() {
        let pts =
            PointMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]).unwrap();
        let matches = MatchTable::identity(4);
        let model = Model::new(Matrix3::identity(), ProblemType::Homography);
        let estimator = HomographyEstimator;
        let scoring = MagsacScoring::new(2);
        let mut inliers = Vec::new();
        let score = scoring.score(&pts, &pts, &matches, &model, &estimator, 1.5, &mut inliers);
        assert_eq!(inliers.len(), 4);
        assert!((score.quality - 4.0).abs() < 1e-9);
        assert!(score.likelihood_sum.is_some());
    }

    #[test]
    fn far_outlier_contributes_nothing() {
        let src = PointMatrix::from_row_slice(1, 2, &[0.0, 0.0]).unwrap();
        let dst = PointMatrix::from_row_slice(1, 2, &[1000.0, 1000.0]).unwrap();
        let matches = MatchTable::identity(1);
        let model = Model::new(Matrix3::identity(), ProblemType::Homography);
        let estimator = HomographyEstimator;
        let scoring = MagsacScoring::new(1);
        let mut inliers = Vec::new();
        let score = scoring.score(&src, &dst, &matches, &model, &estimator, 1.5, &mut inliers);
        assert!(inliers.is_empty());
        assert_eq!(score.quality, 0.0);
    }
}
