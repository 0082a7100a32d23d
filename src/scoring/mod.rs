pub use magsac::MagsacScoring;
pub use truncated::TruncatedScoring;

mod magsac;
mod truncated;

use crate::estimator::Estimator;
use crate::settings::ScoringMethod;
use crate::types::{MatchPair, MatchTable, Model, PointMatrix, Score};

/// Evaluates a candidate model against all matches, returning a [`Score`]
/// and the corresponding inlier set.
///
/// Multi-match contract: for each source row, every valid candidate
/// destination's residual is evaluated; the minimum-residual candidate is
/// kept, and — if its residual is at most `inlier_threshold` — it is
/// appended to `out_inliers` and contributes to the aggregate cost. Ties
/// (equal residuals for the same source) are broken in favor of the lower
/// destination index, so results are deterministic regardless of match
/// column order.
pub trait Scoring {
    #[allow(clippy::too_many_arguments)]
    fn score(
        &self,
        src: &PointMatrix,
        dst: &PointMatrix,
        matches: &MatchTable,
        model: &Model,
        estimator: &dyn Estimator,
        inlier_threshold: f64,
        out_inliers: &mut Vec<MatchPair>,
    ) -> Score;
}

/// The closed set of scoring strategies selectable via
/// [`crate::settings::ScoringMethod`].
pub enum ScoringKind {
    Truncated(TruncatedScoring),
    Magsac(MagsacScoring),
}

impl Scoring for ScoringKind {
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
        match self {
            ScoringKind::Truncated(s) => {
                s.score(src, dst, matches, model, estimator, inlier_threshold, out_inliers)
            }
            ScoringKind::Magsac(s) => {
                s.score(src, dst, matches, model, estimator, inlier_threshold, out_inliers)
            }
        }
    }
}

/// Build the scoring strategy for a [`ScoringMethod`], sized to fan out
/// across `core_number` rayon chunks.
pub fn scoring_for(method: ScoringMethod, core_number: usize) -> ScoringKind {
    match method {
        ScoringMethod::Msac => ScoringKind::Truncated(TruncatedScoring::new(core_number)),
        ScoringMethod::Magsac => ScoringKind::Magsac(MagsacScoring::new(core_number)),
    }
}

/// For one source row, find the candidate destination with the smallest
/// residual, breaking ties by lower destination index. Returns `None` when
/// the row has no valid candidates.
pub(crate) fn best_candidate(
    src_idx: usize,
    src: &PointMatrix,
    dst: &PointMatrix,
    matches: &MatchTable,
    model: &Model,
    estimator: &dyn Estimator,
) -> Option<(usize, f64)> {
    let src_point = src.xy(src_idx);
    let mut best: Option<(usize, f64)> = None;
    for (dst_idx, _match_score) in matches.candidates(src_idx) {
        let residual = estimator.residual(model, src_point, dst.xy(dst_idx));
        best = Some(match best {
            None => (dst_idx, residual),
            Some((best_idx, best_residual)) => {
                if residual < best_residual || (residual == best_residual && dst_idx < best_idx) {
                    (dst_idx, residual)
                } else {
                    (best_idx, best_residual)
                }
            }
        });
    }
    best
}
