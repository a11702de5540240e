use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Per-frame 2-D marker positions for one camera.
///
/// Frame-major, marker-minor: `frames[f][m]` is marker `m` in frame `f`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Track2D {
    frames: Vec<Vec<Point2<f32>>>,
}

impl Track2D {
    pub fn new(frames: Vec<Vec<Point2<f32>>>) -> Self {
        Self { frames }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Marker count of the first frame (0 for an empty track).
    pub fn num_markers(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&[Point2<f32>]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    pub fn frames(&self) -> &[Vec<Point2<f32>>] {
        &self.frames
    }

    /// Positions of one marker over all frames.
    pub fn marker(&self, marker: usize) -> impl Iterator<Item = Option<Point2<f32>>> + '_ {
        self.frames.iter().map(move |f| f.get(marker).copied())
    }

    pub fn into_frames(self) -> Vec<Vec<Point2<f32>>> {
        self.frames
    }
}

/// Per-frame 3-D world points, laid out like [`Track2D`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Track3D {
    frames: Vec<Vec<Point3<f64>>>,
}

impl Track3D {
    pub fn new(frames: Vec<Vec<Point3<f64>>>) -> Self {
        Self { frames }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_markers(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&[Point3<f64>]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    pub fn frames(&self) -> &[Vec<Point3<f64>>] {
        &self.frames
    }

    /// Iterate `(frame, marker, point)` in output order.
    pub fn iter_points(&self) -> impl Iterator<Item = (usize, usize, &Point3<f64>)> + '_ {
        self.frames
            .iter()
            .enumerate()
            .flat_map(|(f, pts)| pts.iter().enumerate().map(move |(m, p)| (f, m, p)))
    }

    pub fn into_frames(self) -> Vec<Vec<Point3<f64>>> {
        self.frames
    }
}
