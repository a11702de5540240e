//! Initial marker positions.

use marker_motion_core::{check_dimensions, read_matrix, MatrixError};
use nalgebra::{DMatrix, Point2};
use std::path::{Path, PathBuf};

/// Name reported in dimension errors for marker files.
pub const MARKER_POSITIONS: &str = "marker positions";

/// Anything that can produce one camera's initial (unrefined) marker positions.
pub trait MarkerSource {
    fn load_markers(&self) -> Result<Vec<Point2<f32>>, MatrixError>;
}

/// Comma-separated `x,y` rows, one marker per row.
#[derive(Clone, Debug)]
pub struct CsvMarkerSource {
    path: PathBuf,
}

impl CsvMarkerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarkerSource for CsvMarkerSource {
    fn load_markers(&self) -> Result<Vec<Point2<f32>>, MatrixError> {
        let mat = read_matrix(&self.path)?;
        markers_from_matrix(&mat)
    }
}

/// Convert an `N x 2` matrix into marker positions.
pub fn markers_from_matrix(mat: &DMatrix<f64>) -> Result<Vec<Point2<f32>>, MatrixError> {
    check_dimensions(mat, None, Some(2), MARKER_POSITIONS)?;
    Ok(mat
        .row_iter()
        .map(|row| Point2::new(row[0] as f32, row[1] as f32))
        .collect())
}

/// Marker positions that are already known.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMarkers {
    markers: Vec<Point2<f32>>,
}

impl InMemoryMarkers {
    pub fn new(markers: Vec<Point2<f32>>) -> Self {
        Self { markers }
    }
}

impl MarkerSource for InMemoryMarkers {
    fn load_markers(&self) -> Result<Vec<Point2<f32>>, MatrixError> {
        Ok(self.markers.clone())
    }
}
