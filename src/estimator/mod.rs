pub use essential::EssentialEstimator;
pub use fundamental::FundamentalEstimator;
pub use homography::HomographyEstimator;

mod essential;
mod fundamental;
mod homography;

use nalgebra::Matrix3;

use crate::error::Result;
use crate::types::{MatchPair, Model, PointMatrix, ProblemType};

/// Abstracts the minimal/non-minimal solver family for one geometry.
///
/// `Send + Sync` so a `&dyn Estimator` can be shared into the `rayon`
/// worker closures [`crate::scoring`] fans scoring out across.
pub trait Estimator: Send + Sync {
    /// The minimal sample size: 4 / 7 / 5 for homography / fundamental /
    /// essential.
    fn sample_size(&self) -> usize;

    /// The sample size used for weighted non-minimal refits.
    fn non_minimal_sample_size(&self) -> usize;

    /// Solve for 0..M candidate models from exactly [`Estimator::sample_size`]
    /// correspondences (e.g. the 7-point algorithm yields up to 3 models,
    /// 5-point essential up to 10).
    fn estimate_minimal(
        &self,
        correspondences: &[MatchPair],
        src: &PointMatrix,
        dst: &PointMatrix,
        out_models: &mut Vec<Model>,
    ) -> Result<()>;

    /// Weighted least-squares refit from a non-minimal correspondence set.
    /// `weights`, when present, must be the same length as `correspondences`.
    fn estimate_non_minimal(
        &self,
        correspondences: &[MatchPair],
        weights: Option<&[f64]>,
        src: &PointMatrix,
        dst: &PointMatrix,
    ) -> Result<Option<Model>>;

    /// Geometric error of one correspondence under `model`, in pixels.
    fn residual(&self, model: &Model, src_point: (f64, f64), dst_point: (f64, f64)) -> f64;

    /// Oriented / chirality / rank checks that reject degenerate solutions.
    fn is_valid_model(&self, model: &Model) -> bool;
}

/// Build the estimator for a problem type. `intrinsics` is required (and
/// only used) for [`ProblemType::Essential`].
pub fn estimator_for(
    problem_type: ProblemType,
    intrinsics: Option<(Matrix3<f64>, Matrix3<f64>)>,
) -> Result<Box<dyn Estimator>> {
    match problem_type {
        ProblemType::Homography => Ok(Box::new(HomographyEstimator)),
        ProblemType::Fundamental => Ok(Box::new(FundamentalEstimator)),
        ProblemType::Essential => {
            let (k_src, k_dst) = intrinsics.ok_or_else(|| {
                crate::error::StereoGlueError::InvalidInput(
                    "essential matrix estimation requires both camera intrinsics".to_string(),
                )
            })?;
            Ok(Box::new(EssentialEstimator::new(k_src, k_dst)))
        }
    }
}
