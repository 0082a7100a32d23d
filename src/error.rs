use thiserror::Error;

/// Errors raised by the estimator.
///
/// The estimator never aborts the process: internal numerical failures (an
/// SVD that did not converge, a singular normal-equations system) are
/// absorbed at the point they occur and never surface as one of these
/// variants — the offending candidate model is simply discarded and the loop
/// continues. Only conditions that make the whole call meaningless reach the
/// caller.
#[derive(Error, Debug)]
pub enum StereoGlueError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: need at least {need} points, got {have}")]
    InsufficientData { have: usize, need: usize },

    #[error("no model scored above the invalid sentinel")]
    Degenerate,

    #[error("internal solver failure: {0}")]
    SolverFailure(String),
}

pub type Result<T> = std::result::Result<T, StereoGlueError>;
