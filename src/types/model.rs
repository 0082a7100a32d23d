use nalgebra::Matrix3;

use crate::types::ProblemType;

/// A fixed-shape 3x3 geometric model with metadata flagging its kind.
#[derive(Debug, Clone)]
pub struct Model {
    pub matrix: Matrix3<f64>,
    pub kind: ProblemType,
}

impl Model {
    pub fn new(matrix: Matrix3<f64>, kind: ProblemType) -> Self {
        Self { matrix, kind }
    }
}
