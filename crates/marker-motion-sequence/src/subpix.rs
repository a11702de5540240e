//! Sub-pixel marker refinement.
//!
//! Iteratively moves each position to the point `q` that best satisfies
//! `∇I(p)ᵀ (p - q) = 0` over a Gaussian-weighted window around the current
//! estimate, i.e. the point where the local intensity gradients are
//! orthogonal to the rays from `q`.

use marker_motion_core::{sample_bilinear_clamped, GrayImageView};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Refinement window and stopping criterion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPixParams {
    /// Half-size of the search window; the window is `2 * half_window + 1` wide.
    pub half_window: usize,
    /// Half-size of a central dead zone excluded from the sums. `None` disables it.
    pub zero_zone: Option<usize>,
    /// Iteration limit per marker.
    pub max_iterations: usize,
    /// Stop once an update moves the estimate by less than this many pixels.
    pub epsilon: f32,
}

impl Default for SubPixParams {
    fn default() -> Self {
        Self {
            half_window: 5,
            zero_zone: None,
            max_iterations: 40,
            epsilon: 0.001,
        }
    }
}

fn build_mask(params: &SubPixParams) -> Vec<f64> {
    let win = params.half_window as i64;
    let size = (2 * win + 1) as usize;
    let coeff = 1.0 / (win * win).max(1) as f64;
    let weights: Vec<f64> = (-win..=win)
        .map(|x| (-(x * x) as f64 * coeff).exp())
        .collect();

    let mut mask = vec![0.0; size * size];
    for (i, wy) in weights.iter().enumerate() {
        for (j, wx) in weights.iter().enumerate() {
            mask[i * size + j] = wx * wy;
        }
    }
    if let Some(zz) = params.zero_zone {
        let zz = zz as i64;
        for dy in -zz..=zz {
            for dx in -zz..=zz {
                let (i, j) = ((dy + win) as usize, (dx + win) as usize);
                if i < size && j < size {
                    mask[i * size + j] = 0.0;
                }
            }
        }
    }
    mask
}

/// Refine `points` in place against `img`.
///
/// A marker whose estimate leaves the image stops iterating. A marker that
/// drifts further than the window half-size from its start is reset to the
/// start position.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, points, params), fields(markers = points.len()))
)]
pub fn refine_subpix(img: &GrayImageView<'_>, points: &mut [Point2<f32>], params: &SubPixParams) {
    let win = params.half_window as i64;
    let size = (2 * win + 1) as usize;
    let buf_size = size + 2;
    let mask = build_mask(params);
    let eps2 = (params.epsilon as f64) * (params.epsilon as f64);
    let mut buf = vec![0.0f64; buf_size * buf_size];

    for point in points.iter_mut() {
        let start = *point;
        let mut c = (start.x as f64, start.y as f64);

        for _ in 0..params.max_iterations.max(1) {
            // Patch of (size + 2)² samples centred on the current estimate.
            for r in 0..buf_size {
                for col in 0..buf_size {
                    let x = c.0 + col as f64 - (win + 1) as f64;
                    let y = c.1 + r as f64 - (win + 1) as f64;
                    buf[r * buf_size + col] = sample_bilinear_clamped(img, x as f32, y as f32) as f64;
                }
            }

            let (mut a, mut b, mut cc, mut bb1, mut bb2) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for i in 0..size {
                let py = i as f64 - win as f64;
                for j in 0..size {
                    let px = j as f64 - win as f64;
                    let m = mask[i * size + j];
                    let row = (i + 1) * buf_size;
                    let gx = buf[row + j + 2] - buf[row + j];
                    let gy = buf[(i + 2) * buf_size + j + 1] - buf[i * buf_size + j + 1];
                    let gxx = gx * gx * m;
                    let gxy = gx * gy * m;
                    let gyy = gy * gy * m;
                    a += gxx;
                    b += gxy;
                    cc += gyy;
                    bb1 += gxx * px + gxy * py;
                    bb2 += gxy * px + gyy * py;
                }
            }

            let det = a * cc - b * b;
            if det.abs() <= f64::EPSILON * f64::EPSILON {
                break;
            }
            let scale = 1.0 / det;
            let next = (
                c.0 + cc * scale * bb1 - b * scale * bb2,
                c.1 - b * scale * bb1 + a * scale * bb2,
            );
            let step2 = (next.0 - c.0).powi(2) + (next.1 - c.1).powi(2);
            c = next;

            if c.0 < 0.0 || c.0 >= img.width as f64 || c.1 < 0.0 || c.1 >= img.height as f64 {
                break;
            }
            if step2 <= eps2 {
                break;
            }
        }

        let refined = Point2::new(c.0 as f32, c.1 as f32);
        let limit = params.half_window as f32;
        *point = if (refined.x - start.x).abs() > limit || (refined.y - start.y).abs() > limit {
            log::debug!(
                "sub-pixel refinement of ({:.2}, {:.2}) diverged, keeping the input",
                start.x,
                start.y
            );
            start
        } else {
            refined
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use marker_motion_core::GrayImage;

    /// Checkerboard-style corner at (cx, cy): bright in two opposite quadrants.
    fn corner_image(w: usize, h: usize, cx: f64, cy: f64) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            // Average 4x4 supersamples per pixel to get sub-pixel edges.
            let mut acc = 0.0f64;
            for sy in 0..4 {
                for sx in 0..4 {
                    let xs = x as f64 + (sx as f64 + 0.5) / 4.0 - 0.5;
                    let ys = y as f64 + (sy as f64 + 0.5) / 4.0 - 0.5;
                    let bright = (xs < cx) == (ys < cy);
                    acc += if bright { 220.0 } else { 30.0 };
                }
            }
            (acc / 16.0).round() as u8
        })
    }

    #[test]
    fn converges_to_corner() {
        let img = corner_image(48, 48, 23.25, 24.5);
        let mut pts = [Point2::new(21.0_f32, 26.0)];
        refine_subpix(&img.view(), &mut pts, &SubPixParams::default());
        assert_abs_diff_eq!(pts[0].x, 23.25, epsilon = 0.15);
        assert_abs_diff_eq!(pts[0].y, 24.5, epsilon = 0.15);
    }

    #[test]
    fn corner_next_to_border_is_not_pulled_outward() {
        let img = corner_image(48, 48, 3.3, 20.0);
        let mut pts = [Point2::new(4.0_f32, 20.8)];
        refine_subpix(&img.view(), &mut pts, &SubPixParams::default());
        assert_abs_diff_eq!(pts[0].x, 3.3, epsilon = 0.2);
        assert_abs_diff_eq!(pts[0].y, 20.0, epsilon = 0.2);
    }

    #[test]
    fn flat_image_keeps_input() {
        let img = GrayImage::filled(32, 32, 90);
        let mut pts = [Point2::new(10.3_f32, 12.7)];
        refine_subpix(&img.view(), &mut pts, &SubPixParams::default());
        assert_eq!(pts[0], Point2::new(10.3, 12.7));
    }

    #[test]
    fn zero_zone_clears_centre_of_mask() {
        let params = SubPixParams {
            half_window: 3,
            zero_zone: Some(1),
            ..SubPixParams::default()
        };
        let mask = build_mask(&params);
        assert_eq!(mask.len(), 49);
        assert_eq!(mask[3 * 7 + 3], 0.0);
        assert_eq!(mask[2 * 7 + 4], 0.0);
        assert!(mask[0] > 0.0);
    }
}
