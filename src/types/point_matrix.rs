use nalgebra::DMatrix;

use crate::error::{Result, StereoGlueError};

/// A dense, row-major table of observations: rows index points, columns
/// index channels (at least `x, y`; additional columns may carry scale,
/// orientation, or descriptor distance).
///
/// Construction validates that every entry is finite and that there are at
/// least two columns — the only invariants the estimator itself relies on.
#[derive(Debug, Clone)]
pub struct PointMatrix {
    data: DMatrix<f64>,
}

impl PointMatrix {
    /// Build a [`PointMatrix`] from row-major data.
    ///
    /// # Arguments
    ///
    /// * `rows`: the number of observations.
    /// * `cols`: the number of channels per observation (must be >= 2).
    /// * `data`: row-major values, length `rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[f64]) -> Result<Self> {
        if cols < 2 {
            return Err(StereoGlueError::InvalidInput(format!(
                "a point matrix needs at least 2 columns (x, y), got {cols}"
            )));
        }
        if data.len() != rows * cols {
            return Err(StereoGlueError::InvalidInput(format!(
                "expected {} values for a {rows}x{cols} matrix, got {}",
                rows * cols,
                data.len()
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(StereoGlueError::InvalidInput(
                "point matrix contains a non-finite value".to_string(),
            ));
        }
        Ok(Self {
            data: DMatrix::from_row_slice(rows, cols, data),
        })
    }

    /// Number of observations (rows).
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Number of channels (columns).
    pub fn channels(&self) -> usize {
        self.data.ncols()
    }

    /// Read one row as a slice-like iterator; row 0/1 are always x, y.
    pub fn row(&self, idx: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.row(idx).into_iter().copied()
    }

    pub fn x(&self, idx: usize) -> f64 {
        self.data[(idx, 0)]
    }

    pub fn y(&self, idx: usize) -> f64 {
        self.data[(idx, 1)]
    }

    pub fn xy(&self, idx: usize) -> (f64, f64) {
        (self.x(idx), self.y(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_columns() {
        let err = PointMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, StereoGlueError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_finite() {
        let err = PointMatrix::from_row_slice(1, 2, &[0.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, StereoGlueError::InvalidInput(_)));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let err = PointMatrix::from_row_slice(2, 2, &[0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, StereoGlueError::InvalidInput(_)));
    }

    #[test]
    fn reads_xy() {
        let m = PointMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m.xy(0), (1.0, 2.0));
        assert_eq!(m.xy(1), (3.0, 4.0));
        assert_eq!(m.len(), 2);
    }
}
