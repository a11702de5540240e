//! Epipolar geometry helpers.

use nalgebra::{Matrix3, Matrix3x4, Point2, Vector3};

/// Pixel position as a homogeneous 3-vector `(x, y, 1)`.
#[inline]
pub fn homogeneous(p: Point2<f32>) -> Vector3<f64> {
    Vector3::new(p.x as f64, p.y as f64, 1.0)
}

/// Algebraic epipolar residual `candidateᵗ · F · anchor`.
///
/// `anchor` is a camera-A pixel, `candidate` a camera-B pixel. The value is
/// zero for a perfectly corresponding pair.
#[inline]
pub fn epipolar_residual(f: &Matrix3<f64>, candidate: Point2<f32>, anchor: Point2<f32>) -> f64 {
    homogeneous(candidate).dot(&(f * homogeneous(anchor)))
}

/// Cross-product matrix `[v]ₓ` with `[v]ₓ w = v × w`.
#[inline]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Fundamental matrix of a rig from intrinsics and the A→B extrinsics.
///
/// `F = K_b⁻ᵀ [t]ₓ R K_a⁻¹`, scaled so that `F[(2, 2)] = 1` when that entry
/// is not vanishing. Returns `None` if an intrinsic matrix is singular.
pub fn fundamental_from_rig(
    k_a: &Matrix3<f64>,
    k_b: &Matrix3<f64>,
    a_to_b: &Matrix3x4<f64>,
) -> Option<Matrix3<f64>> {
    let r = a_to_b.fixed_view::<3, 3>(0, 0).into_owned();
    let t = a_to_b.fixed_view::<3, 1>(0, 3).into_owned();
    let essential = skew(&t) * r;
    let f = k_b.try_inverse()?.transpose() * essential * k_a.try_inverse()?;
    let s = f[(2, 2)];
    Some(if s.abs() > 1e-12 { f / s } else { f })
}
