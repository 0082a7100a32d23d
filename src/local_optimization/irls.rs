use crate::local_optimization::{LocalOptimizer, RefinementContext};
use crate::types::{MatchPair, Model, Score};

/// Robust weighting kernel applied to each inlier's residual during IRLS.
#[derive(Debug, Clone, Copy)]
enum RobustKernel {
    Cauchy,
}

impl RobustKernel {
    fn weight(&self, residual: f64, scale: f64) -> f64 {
        match self {
            RobustKernel::Cauchy => {
                let t = residual / scale.max(f64::EPSILON);
                1.0 / (1.0 + t * t)
            }
        }
    }
}

/// Iteratively reweighted least squares: refit the non-minimal model with
/// residual-derived weights, rescore, and repeat until the relative quality
/// change drops below `relative_tolerance` or `max_iterations` is reached.
/// Adopts a refit only on strict [`Score`] improvement.
pub struct Irls {
    kernel: RobustKernel,
}

impl Irls {
    pub fn new() -> Self {
        Self {
            kernel: RobustKernel::Cauchy,
        }
    }
}

impl Default for Irls {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalOptimizer for Irls {
    fn refine(
        &mut self,
        ctx: &RefinementContext,
        model: &Model,
        score: &Score,
        inliers: &[MatchPair],
    ) -> (Model, Score, Vec<MatchPair>) {
        let non_minimal = ctx.estimator.non_minimal_sample_size();
        if inliers.len() < non_minimal {
            return (model.clone(), *score, inliers.to_vec());
        }

        let mut best_model = model.clone();
        let mut best_score = *score;
        let mut best_inliers = inliers.to_vec();
        let mut prev_quality = score.quality;

        for _ in 0..ctx.settings.max_iterations {
            let weights: Vec<f64> = best_inliers
                .iter()
                .map(|pair| {
                    let residual =
                        ctx.estimator
                            .residual(&best_model, ctx.src.xy(pair.src), ctx.dst.xy(pair.dst));
                    self.kernel.weight(residual, ctx.inlier_threshold)
                })
                .collect();

            let Ok(Some(candidate)) = ctx.estimator.estimate_non_minimal(
                &best_inliers,
                Some(&weights),
                ctx.src,
                ctx.dst,
            ) else {
                break;
            };

            let mut candidate_inliers = Vec::new();
            let candidate_score = ctx.scoring.score(
                ctx.src,
                ctx.dst,
                ctx.matches,
                &candidate,
                ctx.estimator,
                ctx.inlier_threshold,
                &mut candidate_inliers,
            );

            if candidate_score <= best_score {
                break;
            }

            let relative_change = (candidate_score.quality - prev_quality).abs()
                / prev_quality.abs().max(f64::EPSILON);
            prev_quality = candidate_score.quality;
            best_model = candidate;
            best_score = candidate_score;
            best_inliers = candidate_inliers;

            if relative_change < ctx.settings.relative_tolerance {
                break;
            }
        }

        (best_model, best_score, best_inliers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimator_for;
    use crate::scoring::scoring_for;
    use crate::settings::{LocalOptimizationSettings, ScoringMethod};
    use crate::types::{MatchTable, PointMatrix, ProblemType};

    #[test]
    fn refinement_never_decreases_score() {
        let pts = PointMatrix::from_row_slice(
            6,
            2,
            &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.5, 0.5, 0.3, 0.8],
        )
        .unwrap();
        let matches = MatchTable::identity(6);
        let estimator = estimator_for(ProblemType::Homography, None).unwrap();
        let scoring = scoring_for(ScoringMethod::Msac, 1);
        let model = Model::new(nalgebra::Matrix3::identity(), ProblemType::Homography);
        let inliers: Vec<MatchPair> = (0..6).map(|i| MatchPair::new(i, i)).collect();
        let initial_score = scoring.score(
            &pts,
            &pts,
            &matches,
            &model,
            estimator.as_ref(),
            1.5,
            &mut Vec::new(),
        );

        let settings = LocalOptimizationSettings::default();
        let ctx = RefinementContext {
            src: &pts,
            dst: &pts,
            matches: &matches,
            estimator: estimator.as_ref(),
            scoring: &scoring,
            inlier_threshold: 1.5,
            settings: &settings,
            seed: Some(1),
        };
        let mut optimizer = Irls::new();
        let (_, refined_score, _) = optimizer.refine(&ctx, &model, &initial_score, &inliers);
        assert!(refined_score >= initial_score);
    }

    #[test]
    fn no_op_below_non_minimal_threshold() {
        let pts = PointMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]).unwrap();
        let matches = MatchTable::identity(2);
        let estimator = estimator_for(ProblemType::Homography, None).unwrap();
        let scoring = scoring_for(ScoringMethod::Msac, 1);
        let model = Model::new(nalgebra::Matrix3::identity(), ProblemType::Homography);
        let inliers = vec![MatchPair::new(0, 0), MatchPair::new(1, 1)];
        let settings = LocalOptimizationSettings::default();
        let ctx = RefinementContext {
            src: &pts,
            dst: &pts,
            matches: &matches,
            estimator: estimator.as_ref(),
            scoring: &scoring,
            inlier_threshold: 1.5,
            settings: &settings,
            seed: Some(1),
        };
        let score = Score {
            quality: 1.0,
            inlier_count: 2,
            likelihood_sum: None,
        };
        let mut optimizer = Irls::new();
        let (_, refined_score, refined_inliers) = optimizer.refine(&ctx, &model, &score, &inliers);
        assert_eq!(refined_score, score);
        assert_eq!(refined_inliers, inliers);
    }
}
