/// The geometric model being fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ProblemType {
    Homography,
    Fundamental,
    Essential,
}

impl ProblemType {
    /// The minimal sample size: the smallest correspondence set that yields
    /// a unique (or finitely-many) model.
    pub fn sample_size(&self) -> usize {
        match self {
            ProblemType::Homography => 4,
            ProblemType::Fundamental => 7,
            ProblemType::Essential => 5,
        }
    }

    /// The non-minimal sample size used for weighted least-squares refits.
    pub fn non_minimal_sample_size(&self) -> usize {
        match self {
            ProblemType::Homography => self.sample_size() + 2,
            ProblemType::Fundamental => 9,
            ProblemType::Essential => self.sample_size() + 2,
        }
    }

    pub fn requires_intrinsics(&self) -> bool {
        matches!(self, ProblemType::Essential)
    }
}
