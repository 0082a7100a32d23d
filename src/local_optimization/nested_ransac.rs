use crate::local_optimization::{LocalOptimizer, RefinementContext};
use crate::sampler::{Sampler, UniformSampler};
use crate::types::{MatchPair, Model, Score};

/// Repeatedly resamples a non-minimal subset from the current inlier pool,
/// refits, and rescores over the full data/match table, adopting only on
/// strict [`Score`] improvement. The inner sampler is reset over the
/// (possibly growing) inlier pool on every adoption, per design.
pub struct NestedRansac {
    sampler: UniformSampler,
}

impl NestedRansac {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            sampler: UniformSampler::new(seed),
        }
    }
}

impl LocalOptimizer for NestedRansac {
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

        for _ in 0..ctx.settings.max_iterations {
            let pool = &best_inliers;
            if pool.len() < non_minimal + 1 {
                break;
            }
            let k = (ctx.settings.sample_size_multiplier * non_minimal).min(pool.len() - 1);
            if k < non_minimal {
                break;
            }

            self.sampler.initialize(pool.len());
            let mut idx = Vec::with_capacity(k);
            if !self.sampler.sample(pool.len(), k, &mut idx) {
                break;
            }

            let correspondences: Vec<MatchPair> = idx.iter().map(|&i| pool[i]).collect();
            let Ok(Some(candidate)) =
                ctx.estimator
                    .estimate_non_minimal(&correspondences, None, ctx.src, ctx.dst)
            else {
                continue;
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

            if candidate_score > best_score {
                best_model = candidate;
                best_score = candidate_score;
                best_inliers = candidate_inliers;
            }
        }

        (best_model, best_score, best_inliers)
    }
}
