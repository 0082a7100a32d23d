pub use irls::Irls;
pub use nested_ransac::NestedRansac;

mod irls;
mod nested_ransac;

use crate::estimator::Estimator;
use crate::scoring::Scoring;
use crate::settings::LocalOptimizationSettings;
use crate::types::{MatchPair, MatchTable, Model, PointMatrix, Score};

/// Everything a [`LocalOptimizer`] needs to refine a candidate model:
/// borrowed read-only state shared with the main loop, plus the tunables
/// from [`crate::settings::RansacSettings::local_optimization_settings`].
pub struct RefinementContext<'a> {
    pub src: &'a PointMatrix,
    pub dst: &'a PointMatrix,
    pub matches: &'a MatchTable,
    pub estimator: &'a dyn Estimator,
    pub scoring: &'a dyn Scoring,
    pub inlier_threshold: f64,
    pub settings: &'a LocalOptimizationSettings,
    pub seed: Option<u64>,
}

/// Refines an incoming best (model, score, inliers) triple. Implementations
/// must be monotone: the returned triple's [`Score`] is never worse than the
/// input's.
pub trait LocalOptimizer {
    fn refine(
        &mut self,
        ctx: &RefinementContext,
        model: &Model,
        score: &Score,
        inliers: &[MatchPair],
    ) -> (Model, Score, Vec<MatchPair>);
}

/// The closed set of local-optimization strategies selectable via
/// [`crate::settings::LocalOptimizationMethod`].
pub enum LocalOptimizerKind {
    None,
    NestedRansac(NestedRansac),
    Irls(Irls),
}

impl LocalOptimizer for LocalOptimizerKind {
    fn refine(
        &mut self,
        ctx: &RefinementContext,
        model: &Model,
        score: &Score,
        inliers: &[MatchPair],
    ) -> (Model, Score, Vec<MatchPair>) {
        match self {
            LocalOptimizerKind::None => (model.clone(), *score, inliers.to_vec()),
            LocalOptimizerKind::NestedRansac(o) => o.refine(ctx, model, score, inliers),
            LocalOptimizerKind::Irls(o) => o.refine(ctx, model, score, inliers),
        }
    }
}

pub fn local_optimizer_for(
    method: crate::settings::LocalOptimizationMethod,
    seed: Option<u64>,
) -> LocalOptimizerKind {
    use crate::settings::LocalOptimizationMethod;
    match method {
        LocalOptimizationMethod::None => LocalOptimizerKind::None,
        LocalOptimizationMethod::NestedRansac => {
            LocalOptimizerKind::NestedRansac(NestedRansac::new(seed))
        }
        LocalOptimizationMethod::Irls => LocalOptimizerKind::Irls(Irls::new()),
    }
}
