use std::collections::HashMap;

use crate::error::{Result, StereoGlueError};
use crate::types::PointMatrix;

/// The source and destination indices that fall into one grid cell.
#[derive(Debug, Clone, Default)]
pub struct CellContents {
    pub source_indices: Vec<usize>,
    pub destination_indices: Vec<usize>,
}

/// A uniform grid over the source point cloud's bounding box, used to guide
/// PROSAC-style sampling and local scoring by spatial proximity.
///
/// Borrows its source (and optional destination) matrix for its whole
/// lifetime — the graph must never outlive the data it indexes, so the
/// relationship is encoded as a lifetime parameter rather than a copy.
#[derive(Debug)]
pub struct NeighborhoodGraph<'a> {
    source: &'a PointMatrix,
    division_count: usize,
    origin: (f64, f64),
    cell_size: (f64, f64),
    cols: usize,
    cells: HashMap<usize, CellContents>,
}

impl<'a> NeighborhoodGraph<'a> {
    /// Build the grid from the source matrix's (x, y) bounding box, plus an
    /// optional destination matrix whose points are binned using the same
    /// grid geometry.
    ///
    /// Fails with [`StereoGlueError::InvalidInput`] when `division_count ==
    /// 0` or the source contains non-finite coordinates (already guaranteed
    /// by [`PointMatrix`], but degenerate zero-extent inputs are rejected
    /// here too).
    pub fn build(
        source: &'a PointMatrix,
        destination: Option<&PointMatrix>,
        division_count: usize,
    ) -> Result<Self> {
        if division_count == 0 {
            return Err(StereoGlueError::InvalidInput(
                "division_count must be greater than zero".to_string(),
            ));
        }
        if source.is_empty() {
            return Err(StereoGlueError::InvalidInput(
                "cannot build a neighborhood graph from an empty point matrix".to_string(),
            ));
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for i in 0..source.len() {
            let (x, y) = source.xy(i);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let extent_x = (max_x - min_x).max(f64::MIN_POSITIVE);
        let extent_y = (max_y - min_y).max(f64::MIN_POSITIVE);
        let cell_size = (extent_x / division_count as f64, extent_y / division_count as f64);
        let cols = division_count;

        let mut cells: HashMap<usize, CellContents> = HashMap::new();
        let cell_id = |x: f64, y: f64| -> usize {
            let cx = (((x - min_x) / cell_size.0) as usize).min(division_count - 1);
            let cy = (((y - min_y) / cell_size.1) as usize).min(division_count - 1);
            cy * cols + cx
        };

        for i in 0..source.len() {
            let (x, y) = source.xy(i);
            cells.entry(cell_id(x, y)).or_default().source_indices.push(i);
        }
        if let Some(dst) = destination {
            for i in 0..dst.len() {
                let (x, y) = dst.xy(i);
                cells
                    .entry(cell_id(x, y))
                    .or_default()
                    .destination_indices
                    .push(i);
            }
        }

        Ok(Self {
            source,
            division_count,
            origin: (min_x, min_y),
            cell_size,
            cols,
            cells,
        })
    }

    pub fn division_count(&self) -> usize {
        self.division_count
    }

    pub fn cells(&self) -> &HashMap<usize, CellContents> {
        &self.cells
    }

    /// The grid's geometric cell dimensions, `[width, height]` — distinct
    /// from occupancy, which [`NeighborhoodGraph::cells`] and
    /// [`NeighborhoodGraph::filled_cell_count`] already expose.
    pub fn cell_sizes(&self) -> Vec<f64> {
        vec![self.cell_size.0, self.cell_size.1]
    }

    pub fn filled_cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, point_idx: usize) -> usize {
        let (x, y) = self.source.xy(point_idx);
        let cx = (((x - self.origin.0) / self.cell_size.0) as usize).min(self.division_count - 1);
        let cy = (((y - self.origin.1) / self.cell_size.1) as usize).min(self.division_count - 1);
        cy * self.cols + cx
    }

    /// Source indices sharing `point_idx`'s cell, including 8-connected
    /// neighboring cells.
    pub fn neighbors(&self, point_idx: usize) -> Vec<usize> {
        let own = self.cell_of(point_idx);
        let (ox, oy) = (own % self.cols, own / self.cols);
        let mut out = Vec::new();
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = ox as i64 + dx;
                let ny = oy as i64 + dy;
                if nx < 0 || ny < 0 || nx as usize >= self.cols {
                    continue;
                }
                let cell_id = ny as usize * self.cols + nx as usize;
                if let Some(contents) = self.cells.get(&cell_id) {
                    out.extend(contents.source_indices.iter().copied());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> PointMatrix {
        PointMatrix::from_row_slice(
            4,
            2,
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_divisions() {
        let p = grid_points();
        let err = NeighborhoodGraph::build(&p, None, 0).unwrap_err();
        assert!(matches!(err, StereoGlueError::InvalidInput(_)));
    }

    #[test]
    fn empty_cells_are_absent() {
        let p = grid_points();
        let graph = NeighborhoodGraph::build(&p, None, 10).unwrap();
        assert!(graph.filled_cell_count() <= 4);
        assert_eq!(graph.division_count(), 10);
    }

    #[test]
    fn neighbors_include_own_cell() {
        let p = grid_points();
        let graph = NeighborhoodGraph::build(&p, None, 2).unwrap();
        let neighbors = graph.neighbors(0);
        assert!(neighbors.contains(&0));
    }

    #[test]
    fn boundary_points_clamp_to_last_cell() {
        let p = grid_points();
        let graph = NeighborhoodGraph::build(&p, None, 2).unwrap();
        // point 3 sits at the max extent on both axes
        let neighbors = graph.neighbors(3);
        assert!(neighbors.contains(&3));
    }
}
