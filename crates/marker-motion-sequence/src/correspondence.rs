//! Cross-camera marker correspondence.
//!
//! Camera A's marker order is the reference. A resolver reorders camera B's
//! markers so that index `i` denotes the same physical marker in both cameras.

use marker_motion_core::epipolar_residual;
use nalgebra::{Matrix3, Point2};

/// Errors produced while matching markers across cameras.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrespondenceError {
    #[error("epipolar sorting supports exactly two markers per camera, got {0}")]
    UnsupportedMarkerCount(usize),
}

/// Reorders camera B's markers to match camera A's.
pub trait CorrespondenceResolver {
    fn resolve(
        &self,
        fundamental: &Matrix3<f64>,
        markers_a: &[Point2<f32>],
        markers_b: &mut [Point2<f32>],
    ) -> Result<(), CorrespondenceError>;
}

/// Keeps camera B's order untouched. For inputs that already correspond.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepOrder;

impl CorrespondenceResolver for KeepOrder {
    fn resolve(
        &self,
        _fundamental: &Matrix3<f64>,
        _markers_a: &[Point2<f32>],
        _markers_b: &mut [Point2<f32>],
    ) -> Result<(), CorrespondenceError> {
        Ok(())
    }
}

/// Two-marker epipolar sorting.
///
/// Camera A's marker 0 is the anchor. Of camera B's first two markers, the
/// one with the smaller `|xᵇᵀ F xᵃ|` is taken as its match and moved to
/// index 0. Zero or one marker needs no sorting; more than two is rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct EpipolarPairResolver;

impl CorrespondenceResolver for EpipolarPairResolver {
    fn resolve(
        &self,
        fundamental: &Matrix3<f64>,
        markers_a: &[Point2<f32>],
        markers_b: &mut [Point2<f32>],
    ) -> Result<(), CorrespondenceError> {
        match markers_b.len() {
            0 | 1 => return Ok(()),
            2 => {}
            n => return Err(CorrespondenceError::UnsupportedMarkerCount(n)),
        }
        let Some(&anchor) = markers_a.first() else {
            return Err(CorrespondenceError::UnsupportedMarkerCount(0));
        };

        let r0 = epipolar_residual(fundamental, markers_b[0], anchor).abs();
        let r1 = epipolar_residual(fundamental, markers_b[1], anchor).abs();
        log::debug!("epipolar residuals for anchor: candidate 0 = {r0:.6}, candidate 1 = {r1:.6}");
        if r1 < r0 {
            log::debug!("swapping camera B markers 0 and 1");
            markers_b.swap(0, 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Rectified rig: F maps a point to its horizontal epipolar line.
    fn rectified_f() -> Matrix3<f64> {
        Matrix3::new(0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0)
    }

    #[test]
    fn swaps_when_second_candidate_is_closer() {
        let a = [Point2::new(100.0, 50.0), Point2::new(200.0, 120.0)];
        let mut b = [Point2::new(160.0, 120.0), Point2::new(60.0, 50.0)];
        EpipolarPairResolver
            .resolve(&rectified_f(), &a, &mut b)
            .expect("resolve");
        assert_eq!(b, [Point2::new(60.0, 50.0), Point2::new(160.0, 120.0)]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let a = [Point2::new(100.0, 50.0), Point2::new(200.0, 120.0)];
        let mut b = [Point2::new(160.0, 120.0), Point2::new(60.0, 50.0)];
        EpipolarPairResolver.resolve(&rectified_f(), &a, &mut b).expect("first");
        let once = b;
        EpipolarPairResolver.resolve(&rectified_f(), &a, &mut b).expect("second");
        assert_eq!(b, once);
    }

    #[test]
    fn keeps_order_when_first_candidate_matches() {
        let a = [Point2::new(100.0, 50.0), Point2::new(200.0, 120.0)];
        let mut b = [Point2::new(60.0, 50.5), Point2::new(160.0, 120.0)];
        EpipolarPairResolver.resolve(&rectified_f(), &a, &mut b).expect("resolve");
        assert_eq!(b[0], Point2::new(60.0, 50.5));
    }

    #[test]
    fn rejects_more_than_two_markers() {
        let a = [Point2::origin(); 3];
        let mut b = [Point2::origin(); 3];
        assert_eq!(
            EpipolarPairResolver.resolve(&rectified_f(), &a, &mut b),
            Err(CorrespondenceError::UnsupportedMarkerCount(3))
        );
    }
}
