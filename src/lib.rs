//! Robust two-view geometric model fitting from multi-match feature
//! correspondences.
//!
//! Given a source point cloud and a destination point cloud, plus a
//! rectangular match table proposing (for each source point) one or more
//! candidate destinations with per-candidate similarity scores,
//! [`estimate`] fits a homography, fundamental, or essential matrix with a
//! RANSAC-family robust estimator: pluggable minimal-sample drawing,
//! closed-form minimal/non-minimal solvers, robust scoring, local
//! optimization, and a classical iteration-count termination bound.

pub use error::{Result, StereoGlueError};
pub use estimate::{estimate, CancellationToken, EstimationOutcome, EstimationResult};
pub use estimator::{estimator_for, Estimator};
pub use neighborhood::{CellContents, NeighborhoodGraph};
pub use sampler::{Sampler, SamplerKind};
pub use scoring::{scoring_for, Scoring, ScoringKind};
pub use settings::{
    LocalOptCadence, LocalOptimizationMethod, LocalOptimizationSettings, RansacSettings,
    SamplerMethod, ScoringMethod, TerminationMethod,
};
pub use termination::{ProsacTermination, RansacTermination, Termination};
pub use types::{MatchPair, MatchTable, Model, PointMatrix, ProblemType, Score};

mod error;
mod estimate;
mod estimator;
mod local_optimization;
mod neighborhood;
mod rng;
mod sampler;
mod scoring;
mod settings;
mod termination;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use local_optimization::{local_optimizer_for, LocalOptimizer, LocalOptimizerKind, RefinementContext};
