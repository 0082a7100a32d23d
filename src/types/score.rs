use std::cmp::Ordering;

use ordered_float::OrderedFloat;

/// The quality of a candidate model: an aggregate quality number (larger is
/// better), an inlier count, and optionally a continuous likelihood sum
/// (populated by marginalizing scorers such as MAGSAC).
///
/// Ordering is total: compare by `quality`, tie-break by `inlier_count`. The
/// [`Score::invalid`] sentinel is less than every valid score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub quality: f64,
    pub inlier_count: usize,
    pub likelihood_sum: Option<f64>,
}

impl Score {
    /// A sentinel less than every valid score, used to seed "best-so-far"
    /// before any candidate model has been scored.
    pub fn invalid() -> Self {
        Self {
            quality: f64::NEG_INFINITY,
            inlier_count: 0,
            likelihood_sum: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.quality > f64::NEG_INFINITY
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.quality)
            .cmp(&OrderedFloat(other.quality))
            .then_with(|| self.inlier_count.cmp(&other.inlier_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_is_less_than_any_valid_score() {
        let valid = Score {
            quality: 0.0,
            inlier_count: 0,
            likelihood_sum: None,
        };
        assert!(Score::invalid() < valid);
    }

    #[test]
    fn ties_break_on_inlier_count() {
        let a = Score {
            quality: 1.0,
            inlier_count: 5,
            likelihood_sum: None,
        };
        let b = Score {
            quality: 1.0,
            inlier_count: 10,
            likelihood_sum: None,
        };
        assert!(a < b);
    }
}
