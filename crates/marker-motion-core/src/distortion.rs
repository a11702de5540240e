//! Brown–Conrady lens distortion and image undistortion.

use crate::image::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix3, Point2, SMatrix};
use serde::{Deserialize, Serialize};

/// Five distortion coefficients in `(k1, k2, p1, p2, k3)` order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl Distortion {
    pub fn from_row(row: &SMatrix<f64, 1, 5>) -> Self {
        Self {
            k1: row[0],
            k2: row[1],
            p1: row[2],
            p2: row[3],
            k3: row[4],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0 && self.k3 == 0.0
    }

    /// Apply the distortion to a point in normalized image coordinates.
    #[inline]
    pub fn distort(&self, p: Point2<f64>) -> Point2<f64> {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let xd = x * radial + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * radial + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        Point2::new(xd, yd)
    }
}

/// Remove lens distortion from `src`, keeping `k` as the output camera matrix.
///
/// Each output pixel is mapped through `k⁻¹`, distorted, mapped back through
/// `k` and sampled bilinearly from the source. Pixels that land outside the
/// source read as 0. Zero coefficients return an unchanged copy.
pub fn undistort_image(src: &GrayImageView<'_>, k: &Matrix3<f64>, dist: &Distortion) -> GrayImage {
    if dist.is_zero() {
        return GrayImage {
            width: src.width,
            height: src.height,
            data: src.data.to_vec(),
        };
    }

    let (fx, fy) = (k[(0, 0)], k[(1, 1)]);
    let (cx, cy) = (k[(0, 2)], k[(1, 2)]);
    let skew = k[(0, 1)];

    GrayImage::from_fn(src.width, src.height, |u, v| {
        let yn = (v as f64 - cy) / fy;
        let xn = (u as f64 - cx - skew * yn) / fx;
        let d = dist.distort(Point2::new(xn, yn));
        let us = fx * d.x + skew * d.y + cx;
        let vs = fy * d.y + cy;
        sample_bilinear_u8(src, us as f32, vs as f32)
    })
}
