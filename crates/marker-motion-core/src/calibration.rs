//! Stereo rig calibration.

use crate::matrix_io::{check_dimensions, read_matrix, MatrixError};
use crate::{Camera, Distortion};
use nalgebra::{DMatrix, Matrix3, Matrix3x4, Matrix4, SMatrix};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The seven matrices that make up a rig calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigMatrix {
    IntrinsicsA,
    IntrinsicsB,
    DistortionA,
    DistortionB,
    Fundamental,
    CameraAToWorld,
    CameraAToCameraB,
}

impl RigMatrix {
    /// Load order. Dimension errors are reported in this order.
    pub const ALL: [RigMatrix; 7] = [
        RigMatrix::IntrinsicsA,
        RigMatrix::IntrinsicsB,
        RigMatrix::DistortionA,
        RigMatrix::DistortionB,
        RigMatrix::Fundamental,
        RigMatrix::CameraAToWorld,
        RigMatrix::CameraAToCameraB,
    ];

    /// Required `(rows, cols)`.
    pub fn shape(self) -> (usize, usize) {
        match self {
            RigMatrix::IntrinsicsA | RigMatrix::IntrinsicsB | RigMatrix::Fundamental => (3, 3),
            RigMatrix::DistortionA | RigMatrix::DistortionB => (1, 5),
            RigMatrix::CameraAToWorld | RigMatrix::CameraAToCameraB => (3, 4),
        }
    }

    /// Human readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            RigMatrix::IntrinsicsA => "intrinsics of first camera",
            RigMatrix::IntrinsicsB => "intrinsics of second camera",
            RigMatrix::DistortionA => "distortion coefficients of first camera",
            RigMatrix::DistortionB => "distortion coefficients of second camera",
            RigMatrix::Fundamental => "fundamental matrix",
            RigMatrix::CameraAToWorld => {
                "transformation from first camera to world coordinate system"
            }
            RigMatrix::CameraAToCameraB => "transformation from first camera to second camera",
        }
    }

    fn check(self, mat: &DMatrix<f64>) -> Result<(), MatrixError> {
        let (rows, cols) = self.shape();
        check_dimensions(mat, Some(rows), Some(cols), self.name())
    }
}

/// File names of the calibration matrices inside a calibration folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationLayout {
    pub intrinsics_a: String,
    pub intrinsics_b: String,
    pub distortion_a: String,
    pub distortion_b: String,
    pub fundamental: String,
    pub camera_a_to_world: String,
    pub camera_a_to_camera_b: String,
}

impl Default for CalibrationLayout {
    fn default() -> Self {
        Self {
            intrinsics_a: "K1.csv".to_string(),
            intrinsics_b: "K2.csv".to_string(),
            distortion_a: "D1.csv".to_string(),
            distortion_b: "D2.csv".to_string(),
            fundamental: "F.csv".to_string(),
            camera_a_to_world: "T_C1_W.csv".to_string(),
            camera_a_to_camera_b: "T_C1_C2.csv".to_string(),
        }
    }
}

impl CalibrationLayout {
    pub fn file_name(&self, which: RigMatrix) -> &str {
        match which {
            RigMatrix::IntrinsicsA => &self.intrinsics_a,
            RigMatrix::IntrinsicsB => &self.intrinsics_b,
            RigMatrix::DistortionA => &self.distortion_a,
            RigMatrix::DistortionB => &self.distortion_b,
            RigMatrix::Fundamental => &self.fundamental,
            RigMatrix::CameraAToWorld => &self.camera_a_to_world,
            RigMatrix::CameraAToCameraB => &self.camera_a_to_camera_b,
        }
    }
}

/// Constant geometric parameters of the two-camera rig.
///
/// Built once and shared read-only (typically behind an `Arc`). All
/// accessors return owned copies, so holders never observe each other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    intrinsics_a: Matrix3<f64>,
    intrinsics_b: Matrix3<f64>,
    distortion_a: Distortion,
    distortion_b: Distortion,
    fundamental: Matrix3<f64>,
    camera_a_to_world: Matrix3x4<f64>,
    camera_a_to_camera_b: Matrix3x4<f64>,
}

impl CalibrationData {
    /// Load all matrices from `folder` using the default file names.
    pub fn load_dir(folder: impl AsRef<Path>) -> Result<Self, MatrixError> {
        Self::load_dir_with_layout(folder, &CalibrationLayout::default())
    }

    /// Load all matrices from `folder` using custom file names.
    ///
    /// Every file is read first; shapes are then checked in
    /// [`RigMatrix::ALL`] order.
    pub fn load_dir_with_layout(
        folder: impl AsRef<Path>,
        layout: &CalibrationLayout,
    ) -> Result<Self, MatrixError> {
        let folder = folder.as_ref();
        let mut mats = Vec::with_capacity(RigMatrix::ALL.len());
        for which in RigMatrix::ALL {
            let path = folder.join(layout.file_name(which));
            log::debug!("reading {} from {}", which.name(), path.display());
            mats.push(read_matrix(&path)?);
        }
        // `ALL` follows declaration order, so the discriminant is the slot.
        Self::from_matrices(|which| mats[which as usize].clone())
    }

    /// Build from in-memory matrices supplied by `source`, validating shapes.
    pub fn from_matrices<F>(mut source: F) -> Result<Self, MatrixError>
    where
        F: FnMut(RigMatrix) -> DMatrix<f64>,
    {
        let intrinsics_a = source(RigMatrix::IntrinsicsA);
        let intrinsics_b = source(RigMatrix::IntrinsicsB);
        let distortion_a = source(RigMatrix::DistortionA);
        let distortion_b = source(RigMatrix::DistortionB);
        let fundamental = source(RigMatrix::Fundamental);
        let camera_a_to_world = source(RigMatrix::CameraAToWorld);
        let camera_a_to_camera_b = source(RigMatrix::CameraAToCameraB);

        RigMatrix::IntrinsicsA.check(&intrinsics_a)?;
        RigMatrix::IntrinsicsB.check(&intrinsics_b)?;
        RigMatrix::DistortionA.check(&distortion_a)?;
        RigMatrix::DistortionB.check(&distortion_b)?;
        RigMatrix::Fundamental.check(&fundamental)?;
        RigMatrix::CameraAToWorld.check(&camera_a_to_world)?;
        RigMatrix::CameraAToCameraB.check(&camera_a_to_camera_b)?;

        Ok(Self {
            intrinsics_a: fixed(&intrinsics_a),
            intrinsics_b: fixed(&intrinsics_b),
            distortion_a: Distortion::from_row(&fixed(&distortion_a)),
            distortion_b: Distortion::from_row(&fixed(&distortion_b)),
            fundamental: fixed(&fundamental),
            camera_a_to_world: fixed(&camera_a_to_world),
            camera_a_to_camera_b: fixed(&camera_a_to_camera_b),
        })
    }

    /// Build from already typed parts. Shapes are enforced by the types.
    pub fn new(
        intrinsics: [Matrix3<f64>; 2],
        distortion: [Distortion; 2],
        fundamental: Matrix3<f64>,
        camera_a_to_world: Matrix3x4<f64>,
        camera_a_to_camera_b: Matrix3x4<f64>,
    ) -> Self {
        let [intrinsics_a, intrinsics_b] = intrinsics;
        let [distortion_a, distortion_b] = distortion;
        Self {
            intrinsics_a,
            intrinsics_b,
            distortion_a,
            distortion_b,
            fundamental,
            camera_a_to_world,
            camera_a_to_camera_b,
        }
    }

    pub fn intrinsics_a(&self) -> Matrix3<f64> {
        self.intrinsics_a
    }

    pub fn intrinsics_b(&self) -> Matrix3<f64> {
        self.intrinsics_b
    }

    pub fn distortion_a(&self) -> Distortion {
        self.distortion_a
    }

    pub fn distortion_b(&self) -> Distortion {
        self.distortion_b
    }

    /// Intrinsics of the given camera.
    pub fn intrinsics(&self, camera: Camera) -> Matrix3<f64> {
        match camera {
            Camera::A => self.intrinsics_a,
            Camera::B => self.intrinsics_b,
        }
    }

    /// Distortion coefficients of the given camera.
    pub fn distortion(&self, camera: Camera) -> Distortion {
        match camera {
            Camera::A => self.distortion_a,
            Camera::B => self.distortion_b,
        }
    }

    /// Fundamental matrix with `x_bᵗ · F · x_a = 0` for corresponding points.
    pub fn fundamental(&self) -> Matrix3<f64> {
        self.fundamental
    }

    pub fn camera_a_to_world(&self) -> Matrix3x4<f64> {
        self.camera_a_to_world
    }

    pub fn camera_a_to_camera_b(&self) -> Matrix3x4<f64> {
        self.camera_a_to_camera_b
    }

    /// Camera-A-to-world transform extended with a `[0, 0, 0, 1]` row.
    pub fn camera_a_to_world_homogeneous(&self) -> Matrix4<f64> {
        let mut t = Matrix4::identity();
        t.fixed_view_mut::<3, 4>(0, 0)
            .copy_from(&self.camera_a_to_world);
        t
    }
}

fn fixed<const R: usize, const C: usize>(m: &DMatrix<f64>) -> SMatrix<f64, R, C> {
    m.fixed_view::<R, C>(0, 0).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(which: RigMatrix) -> DMatrix<f64> {
        let (rows, cols) = which.shape();
        match which {
            RigMatrix::IntrinsicsA | RigMatrix::IntrinsicsB => DMatrix::from_row_slice(
                3,
                3,
                &[800.0, 0.0, 320.0, 0.0, 800.0, 240.0, 0.0, 0.0, 1.0],
            ),
            _ => DMatrix::from_fn(rows, cols, |r, c| (r * cols + c) as f64),
        }
    }

    #[test]
    fn builds_from_valid_matrices() {
        let calib = CalibrationData::from_matrices(valid).expect("valid calibration");
        assert_eq!(calib.intrinsics_a()[(0, 2)], 320.0);
        assert_eq!(calib.camera_a_to_world()[(2, 3)], 11.0);
        assert_eq!(calib.distortion_b().p1, 2.0);
    }

    #[test]
    fn wrong_shape_names_the_matrix() {
        for bad in RigMatrix::ALL {
            let err = CalibrationData::from_matrices(|which| {
                if which == bad {
                    DMatrix::zeros(2, 2)
                } else {
                    valid(which)
                }
            })
            .unwrap_err();
            match err {
                MatrixError::Dimension { name, rows, cols, .. } => {
                    assert_eq!(name, bad.name());
                    assert_eq!((rows, cols), (2, 2));
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn first_offending_matrix_is_reported() {
        let err = CalibrationData::from_matrices(|which| match which {
            RigMatrix::DistortionB | RigMatrix::CameraAToCameraB => DMatrix::zeros(1, 1),
            other => valid(other),
        })
        .unwrap_err();
        assert!(err
            .to_string()
            .contains(RigMatrix::DistortionB.name()));
    }

    #[test]
    fn copies_are_independent() {
        let calib = CalibrationData::from_matrices(valid).expect("valid calibration");
        let mut k = calib.intrinsics_a();
        k[(0, 0)] = -1.0;
        assert_eq!(calib.intrinsics_a()[(0, 0)], 800.0);
    }

    #[test]
    fn homogeneous_world_transform_has_unit_last_row() {
        let calib = CalibrationData::from_matrices(valid).expect("valid calibration");
        let t = calib.camera_a_to_world_homogeneous();
        assert_eq!(t.row(3).iter().copied().collect::<Vec<_>>(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t[(1, 3)], 7.0);
    }
}
