use rayon::prelude::*;

use crate::estimator::Estimator;
use crate::scoring::{best_candidate, Scoring};
use crate::types::{MatchPair, MatchTable, Model, PointMatrix, Score};

/// MSAC: truncated-quadratic robust cost, `cost_i = max(0, 1 - (r_i / tau)^2)`
/// for the best candidate of each source row, summed into `quality`.
pub struct TruncatedScoring {
    core_number: usize,
}

impl TruncatedScoring {
    pub fn new(core_number: usize) -> Self {
        Self {
            core_number: core_number.max(1),
        }
    }
}

impl Scoring for TruncatedScoring {
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

        let (quality, inliers): (f64, Vec<MatchPair>) = (0..num_src)
            .collect::<Vec<_>>()
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut local_quality = 0.0;
                let mut local_inliers = Vec::new();
                for &src_idx in chunk {
                    let Some((dst_idx, residual)) =
                        best_candidate(src_idx, src, dst, matches, model, estimator)
                    else {
                        continue;
                    };
                    if residual <= inlier_threshold {
                        let normalized = residual / inlier_threshold;
                        local_quality += 1.0 - normalized * normalized;
                        local_inliers.push(MatchPair::new(src_idx, dst_idx));
                    }
                }
                (local_quality, local_inliers)
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
            quality,
            inlier_count: out_inliers.len(),
            likelihood_sum: None,
        }
    }
}
