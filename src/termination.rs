/// Decides, from the current best inlier count, whether the outer RANSAC
/// loop has run enough iterations to meet the target confidence.
pub trait Termination {
    #[allow(clippy::too_many_arguments)]
    fn should_terminate(
        &self,
        iterations_done: usize,
        current_inlier_count: usize,
        total_points: usize,
        sample_size: usize,
        confidence: f64,
    ) -> bool;
}

/// `N = ln(1 - confidence) / ln(1 - eps^m)`, clamped to
/// `[min_iterations, max_iterations]`.
pub struct RansacTermination {
    min_iterations: usize,
    max_iterations: usize,
}

impl RansacTermination {
    pub fn new(min_iterations: usize, max_iterations: usize) -> Self {
        Self {
            min_iterations,
            max_iterations,
        }
    }

    /// The classical RANSAC iteration bound, clamped to
    /// `[min_iterations, max_iterations]`.
    pub(crate) fn required_iterations(
        &self,
        current_inlier_count: usize,
        total_points: usize,
        sample_size: usize,
        confidence: f64,
    ) -> usize {
        if total_points == 0 {
            return self.min_iterations;
        }
        let eps = (current_inlier_count as f64 / total_points as f64).clamp(1e-12, 1.0);
        let inlier_prob = eps.powi(sample_size as i32);
        if inlier_prob >= 1.0 {
            return self.min_iterations;
        }
        let denom = (1.0 - inlier_prob).ln();
        if denom >= 0.0 {
            return self.max_iterations;
        }
        let n = ((1.0 - confidence).ln() / denom).ceil();
        if !n.is_finite() {
            return self.max_iterations;
        }
        (n as usize).clamp(self.min_iterations, self.max_iterations)
    }
}

impl Termination for RansacTermination {
    fn should_terminate(
        &self,
        iterations_done: usize,
        current_inlier_count: usize,
        total_points: usize,
        sample_size: usize,
        confidence: f64,
    ) -> bool {
        let required =
            self.required_iterations(current_inlier_count, total_points, sample_size, confidence);
        iterations_done >= required
    }
}

/// Wraps [`RansacTermination`]'s bound, tracking PROSAC's progressively
/// growing sampling pool. Once the pool has grown to the full point count
/// the two termination rules coincide, so this falls back to the same
/// bound — see the design note on the PROSAC stopping-rule Open Question.
pub struct ProsacTermination {
    inner: RansacTermination,
}

impl ProsacTermination {
    pub fn new(min_iterations: usize, max_iterations: usize) -> Self {
        Self {
            inner: RansacTermination::new(min_iterations, max_iterations),
        }
    }
}

impl Termination for ProsacTermination {
    fn should_terminate(
        &self,
        iterations_done: usize,
        current_inlier_count: usize,
        total_points: usize,
        sample_size: usize,
        confidence: f64,
    ) -> bool {
        self.inner.should_terminate(
            iterations_done,
            current_inlier_count,
            total_points,
            sample_size,
            confidence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_min_iterations_for_high_inlier_ratio() {
        let t = RansacTermination::new(100, 5000);
        let n = t.required_iterations(95, 100, 4, 0.99);
        assert_eq!(n, 100);
    }

    #[test]
    fn clamps_to_max_iterations_for_low_inlier_ratio() {
        let t = RansacTermination::new(10, 500);
        let n = t.required_iterations(2, 1000, 7, 0.999999);
        assert_eq!(n, 500);
    }

    #[test]
    fn terminates_once_required_iterations_reached() {
        let t = RansacTermination::new(1, 5000);
        let required = t.required_iterations(50, 100, 4, 0.99);
        assert!(!t.should_terminate(required - 1, 50, 100, 4, 0.99));
        assert!(t.should_terminate(required, 50, 100, 4, 0.99));
    }
}
