use crate::error::{Result, StereoGlueError};

/// A source-count x K table proposing, for each source row, up to `k`
/// candidate destination indices with per-candidate similarity scores
/// (finite, non-negative, lower is better). A negative or out-of-range
/// destination index marks "no candidate" for that column.
///
/// Invariant: within a row, the valid (non-negative, in-range) destination
/// indices are pairwise distinct.
#[derive(Debug, Clone)]
pub struct MatchTable {
    num_src: usize,
    num_dst: usize,
    k: usize,
    /// Row-major `num_src * k`; -1 marks "no candidate".
    dst: Vec<i64>,
    /// Row-major `num_src * k`, paired with `dst`.
    scores: Vec<f64>,
}

impl MatchTable {
    pub fn new(num_src: usize, num_dst: usize, k: usize, dst: Vec<i64>, scores: Vec<f64>) -> Result<Self> {
        if dst.len() != num_src * k || scores.len() != num_src * k {
            return Err(StereoGlueError::InvalidInput(format!(
                "match/score tables must have {} entries for {num_src} rows x {k} columns",
                num_src * k
            )));
        }
        for row in 0..num_src {
            let mut seen = std::collections::HashSet::new();
            for col in 0..k {
                let idx = dst[row * k + col];
                let score = scores[row * k + col];
                if idx < 0 || idx as usize >= num_dst {
                    continue;
                }
                if !score.is_finite() || score < 0.0 {
                    return Err(StereoGlueError::InvalidInput(format!(
                        "match score at row {row}, col {col} must be finite and non-negative"
                    )));
                }
                if !seen.insert(idx) {
                    return Err(StereoGlueError::InvalidInput(format!(
                        "row {row} proposes destination index {idx} more than once"
                    )));
                }
            }
        }
        Ok(Self {
            num_src,
            num_dst,
            k,
            dst,
            scores,
        })
    }

    /// Build an implicit 1-1 match table: row `i` proposes exactly `dst[i]`
    /// as its sole candidate, with a score of `0.0`. Used when the caller
    /// supplies no match table (single-match mode).
    pub fn identity(num_points: usize) -> Self {
        let dst = (0..num_points as i64).collect();
        let scores = vec![0.0; num_points];
        Self {
            num_src: num_points,
            num_dst: num_points,
            k: 1,
            dst,
            scores,
        }
    }

    pub fn num_src(&self) -> usize {
        self.num_src
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Valid (destination index, score) candidates for a source row, in
    /// column order.
    pub fn candidates(&self, src_idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let base = src_idx * self.k;
        (0..self.k).filter_map(move |col| {
            let idx = self.dst[base + col];
            if idx < 0 || idx as usize >= self.num_dst {
                None
            } else {
                Some((idx as usize, self.scores[base + col]))
            }
        })
    }
}
