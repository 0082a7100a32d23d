use serde::{Deserialize, Serialize};

/// The robust scoring function used to turn a candidate model's residuals
/// into a [`crate::types::Score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMethod {
    /// MSAC: truncated-quadratic robust cost with a hard inlier threshold.
    Msac,
    /// Marginalization over a noise-scale distribution, removing the hard
    /// inlier/outlier boundary from the cost.
    Magsac,
}

/// The minimal-sample drawing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplerMethod {
    /// Sample-without-replacement, uniformly at random.
    Uniform,
    /// Progressive sampling biased toward higher-quality matches.
    Prosac,
    /// Sampling guided by the neighborhood graph.
    NeighborhoodGuided,
}

/// The local-optimization strategy run on the current best model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalOptimizationMethod {
    None,
    /// Nested RANSAC: repeated minimal-ish resampling from the inlier pool.
    NestedRansac,
    /// Iteratively reweighted least squares with a robust kernel.
    Irls,
}

/// The termination bound used to decide how many iterations are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationMethod {
    Ransac,
    Prosac,
}

/// How often the main loop invokes local optimization on the current best.
///
/// Open question in the source design: sometimes every improvement,
/// sometimes fixed periods. Resolved here as an explicit setting, default
/// [`LocalOptCadence::OnEveryImprovement`] — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalOptCadence {
    OnEveryImprovement,
    EveryNIterations(usize),
}

impl Default for LocalOptCadence {
    fn default() -> Self {
        LocalOptCadence::OnEveryImprovement
    }
}

/// Options for [`LocalOptimizationMethod::NestedRansac`] and
/// [`LocalOptimizationMethod::Irls`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalOptimizationSettings {
    /// Inner-loop iteration cap.
    pub max_iterations: usize,
    /// Nested RANSAC draws `sample_size_multiplier * non_minimal_size`
    /// points from the inlier pool (clamped to `inliers.len() - 1`).
    pub sample_size_multiplier: usize,
    /// IRLS stops early once the relative score change drops below this.
    pub relative_tolerance: f64,
}

impl Default for LocalOptimizationSettings {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            sample_size_multiplier: 7,
            relative_tolerance: 1e-3,
        }
    }
}

/// Configuration for [`crate::estimate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RansacSettings {
    pub min_iterations: usize,
    pub max_iterations: usize,
    pub core_number: usize,
    pub inlier_threshold: f64,
    pub confidence: f64,
    pub scoring: ScoringMethod,
    pub sampler: SamplerMethod,
    pub local_optimization: LocalOptimizationMethod,
    pub final_optimization: LocalOptimizationMethod,
    pub termination_criterion: TerminationMethod,
    pub local_optimization_settings: LocalOptimizationSettings,
    pub local_opt_cadence: LocalOptCadence,
    /// Division count for the neighborhood graph, used by the
    /// [`SamplerMethod::NeighborhoodGuided`] sampler.
    pub neighborhood_division_count: usize,
    /// Seed for the deterministic RNG. `None` seeds from a fixed default so
    /// that two unseeded runs still behave identically within one process
    /// (only an explicit seed distinguishes independent runs).
    pub seed: Option<u64>,
}

impl Default for RansacSettings {
    fn default() -> Self {
        Self {
            min_iterations: 1000,
            max_iterations: 5000,
            core_number: 4,
            inlier_threshold: 1.5,
            confidence: 0.99,
            scoring: ScoringMethod::Magsac,
            sampler: SamplerMethod::Uniform,
            local_optimization: LocalOptimizationMethod::NestedRansac,
            final_optimization: LocalOptimizationMethod::Irls,
            termination_criterion: TerminationMethod::Ransac,
            local_optimization_settings: LocalOptimizationSettings::default(),
            local_opt_cadence: LocalOptCadence::default(),
            neighborhood_division_count: 10,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let s = RansacSettings::default();
        assert_eq!(s.min_iterations, 1000);
        assert_eq!(s.max_iterations, 5000);
        assert_eq!(s.core_number, 4);
        assert_eq!(s.inlier_threshold, 1.5);
        assert_eq!(s.confidence, 0.99);
        assert_eq!(s.scoring, ScoringMethod::Magsac);
        assert_eq!(s.sampler, SamplerMethod::Uniform);
        assert_eq!(s.local_optimization, LocalOptimizationMethod::NestedRansac);
        assert_eq!(s.final_optimization, LocalOptimizationMethod::Irls);
        assert_eq!(s.termination_criterion, TerminationMethod::Ransac);
        assert_eq!(s.local_optimization_settings.max_iterations, 50);
        assert_eq!(s.local_optimization_settings.sample_size_multiplier, 7);
    }
}
