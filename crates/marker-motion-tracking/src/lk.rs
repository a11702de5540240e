//! Pyramidal Lucas–Kanade for isolated points.
//!
//! Inverse-compositional formulation: gradients and the 2×2 structure
//! tensor come from the previous frame around the prior position, only the
//! residual is recomputed per iteration. Levels are processed coarse to
//! fine; the displacement found on one level seeds the next.

use crate::pyramid::{FloatImage, ImagePyramid};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Outcome of tracking one marker from one frame to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackStatus {
    Tracked,
    /// The structure tensor was (near) singular; the prior position is kept.
    Lost,
    /// The new position lies outside the image.
    OutOfBounds,
}

/// Position of one marker in one frame with its tracking diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedMarker {
    pub position: Point2<f32>,
    pub status: TrackStatus,
    /// Mean absolute intensity difference over the final window.
    pub error: f32,
}

impl TrackedMarker {
    /// An observation taken as given, e.g. the initial positions.
    pub fn given(position: Point2<f32>) -> Self {
        Self {
            position,
            status: TrackStatus::Tracked,
            error: 0.0,
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.status == TrackStatus::Tracked
    }
}

/// Lucas–Kanade window, pyramid depth and stopping criterion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Half-size of the integration window; the window is `2 * half_window + 1` wide.
    pub half_window: usize,
    /// Index of the coarsest pyramid level (0 disables the pyramid).
    pub max_level: usize,
    /// Iteration limit per pyramid level.
    pub max_iterations: usize,
    /// Stop a level once the update is below this many pixels.
    pub epsilon: f32,
    /// Minimum eigenvalue of the structure tensor, divided by the window
    /// area, below which a marker is reported as lost.
    pub min_eigen_threshold: f32,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            half_window: 5,
            max_level: 5,
            max_iterations: 30,
            epsilon: 0.01,
            min_eigen_threshold: 1e-4,
        }
    }
}

impl TrackerParams {
    pub fn window_size(&self) -> usize {
        2 * self.half_window + 1
    }
}

/// Template patch and its gradients, sampled once per level.
struct Patch {
    values: Vec<f32>,
    gx: Vec<f32>,
    gy: Vec<f32>,
    // structure tensor
    h00: f32,
    h01: f32,
    h11: f32,
}

impl Patch {
    fn sample(img: &FloatImage, center: Point2<f32>, half: isize) -> Self {
        let n = (2 * half + 1) as usize;
        let mut patch = Patch {
            values: Vec::with_capacity(n * n),
            gx: Vec::with_capacity(n * n),
            gy: Vec::with_capacity(n * n),
            h00: 0.0,
            h01: 0.0,
            h11: 0.0,
        };
        for oy in -half..=half {
            for ox in -half..=half {
                let x = center.x + ox as f32;
                let y = center.y + oy as f32;
                let gx = 0.5 * (img.sample(x + 1.0, y) - img.sample(x - 1.0, y));
                let gy = 0.5 * (img.sample(x, y + 1.0) - img.sample(x, y - 1.0));
                patch.values.push(img.sample(x, y));
                patch.gx.push(gx);
                patch.gy.push(gy);
                patch.h00 += gx * gx;
                patch.h01 += gx * gy;
                patch.h11 += gy * gy;
            }
        }
        patch
    }

    fn min_eigenvalue(&self) -> f32 {
        let tr = self.h00 + self.h11;
        let disc = ((self.h00 - self.h11).powi(2) + 4.0 * self.h01 * self.h01).sqrt();
        0.5 * (tr - disc)
    }

    /// Mean absolute residual against `img` displaced by `d`.
    fn residual(&self, img: &FloatImage, center: Point2<f32>, d: Vector2<f32>, half: isize) -> f32 {
        let mut sum = 0.0;
        let mut idx = 0;
        for oy in -half..=half {
            for ox in -half..=half {
                let i = img.sample(center.x + d.x + ox as f32, center.y + d.y + oy as f32);
                sum += (self.values[idx] - i).abs();
                idx += 1;
            }
        }
        sum / idx as f32
    }
}

/// Track every prior position from `prev` to `next`.
///
/// Both pyramids must come from images of the same size. The output keeps
/// the order of `prior`.
pub fn track_markers(
    prev: &ImagePyramid,
    next: &ImagePyramid,
    prior: &[Point2<f32>],
    params: &TrackerParams,
) -> Vec<TrackedMarker> {
    let levels = prev
        .num_levels()
        .min(next.num_levels())
        .min(params.max_level + 1);
    prior
        .iter()
        .map(|&p| track_one(prev, next, p, levels, params))
        .collect()
}

fn track_one(
    prev: &ImagePyramid,
    next: &ImagePyramid,
    prior: Point2<f32>,
    levels: usize,
    params: &TrackerParams,
) -> TrackedMarker {
    let half = params.half_window as isize;
    let area = (params.window_size() * params.window_size()) as f32;
    let eps2 = params.epsilon * params.epsilon;
    let mut d = Vector2::<f32>::zeros();
    let mut error = 0.0;

    for level in (0..levels).rev() {
        let (prev_img, next_img) = (&prev.levels()[level], &next.levels()[level]);
        let scale = 1.0 / (1u32 << level) as f32;
        let center = Point2::new(prior.x * scale, prior.y * scale);

        let patch = Patch::sample(prev_img, center, half);
        let det = patch.h00 * patch.h11 - patch.h01 * patch.h01;
        if patch.min_eigenvalue() / area < params.min_eigen_threshold || det.abs() <= f32::EPSILON {
            // A flat coarse level carries the estimate down unchanged.
            if level > 0 {
                d *= 2.0;
                continue;
            }
            log::debug!(
                "marker at ({:.2}, {:.2}) lost: structure tensor is singular",
                prior.x,
                prior.y
            );
            return TrackedMarker {
                position: prior,
                status: TrackStatus::Lost,
                error: 0.0,
            };
        }
        let inv_det = 1.0 / det;

        for _ in 0..params.max_iterations {
            let (mut b0, mut b1) = (0.0f32, 0.0f32);
            let mut idx = 0;
            for oy in -half..=half {
                for ox in -half..=half {
                    let i = next_img.sample(center.x + d.x + ox as f32, center.y + d.y + oy as f32);
                    let e = patch.values[idx] - i;
                    b0 += patch.gx[idx] * e;
                    b1 += patch.gy[idx] * e;
                    idx += 1;
                }
            }
            let delta = Vector2::new(
                inv_det * (patch.h11 * b0 - patch.h01 * b1),
                inv_det * (patch.h00 * b1 - patch.h01 * b0),
            );
            d += delta;
            if delta.norm_squared() < eps2 {
                break;
            }
        }

        if level == 0 {
            error = patch.residual(next_img, center, d, half);
        } else {
            d *= 2.0;
        }
    }

    let position = prior + d;
    let full = &next.levels()[0];
    let inside = position.x >= 0.0
        && position.y >= 0.0
        && position.x < full.width as f32
        && position.y < full.height as f32;
    TrackedMarker {
        position,
        status: if inside {
            TrackStatus::Tracked
        } else {
            TrackStatus::OutOfBounds
        },
        error,
    }
}
