use crate::correction::correct_match;
use crate::dlt::triangulate_dlt;
use marker_motion_core::{CalibrationData, Camera, CameraPair, Track2D, Track3D};
use nalgebra::{Matrix3, Matrix3x4, Matrix4, Point2, Point3, Vector4};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TriangulationError {
    #[error("both cameras must have the same number of frames (camera A: {a}, camera B: {b})")]
    FrameCountMismatch { a: usize, b: usize },
    #[error("frame {frame}: both cameras must have the same number of markers (camera A: {a}, camera B: {b})")]
    MarkerCountMismatch { frame: usize, a: usize, b: usize },
    #[error("frame {frame} has {found} markers, frame 0 has {expected}")]
    RaggedTrack {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("transformation from first camera to world coordinate system is not invertible")]
    SingularWorldTransform,
}

/// Stereo triangulation with the rig's projection matrices.
///
/// Camera A is the reference: `P_A = K_A [I | 0]` and `P_B = K_B T_A→B`.
/// Points are reported in world coordinates through `T_A→W`.
#[derive(Clone, Debug)]
pub struct Triangulator {
    calibration: Arc<CalibrationData>,
    projection: CameraPair<Matrix3x4<f64>>,
    fundamental: Matrix3<f64>,
    a_to_world: Matrix4<f64>,
}

impl Triangulator {
    pub fn new(calibration: Arc<CalibrationData>) -> Self {
        let projection = CameraPair::new(
            calibration.intrinsics_a() * Matrix3x4::<f64>::identity(),
            calibration.intrinsics_b() * calibration.camera_a_to_camera_b(),
        );
        let fundamental = calibration.fundamental();
        let a_to_world = calibration.camera_a_to_world_homogeneous();
        Self {
            calibration,
            projection,
            fundamental,
            a_to_world,
        }
    }

    pub fn calibration(&self) -> &Arc<CalibrationData> {
        &self.calibration
    }

    /// The 3×4 projection matrix of `camera` in camera-A coordinates.
    pub fn projection(&self, camera: Camera) -> Matrix3x4<f64> {
        self.projection[camera]
    }

    /// Triangulate one match into world coordinates.
    ///
    /// A point at infinity (homogeneous `w = 0`) is not an error; it is
    /// logged and yields non-finite coordinates.
    pub fn triangulate_point(&self, a: Point2<f32>, b: Point2<f32>) -> Point3<f64> {
        let a = Point2::new(a.x as f64, a.y as f64);
        let b = Point2::new(b.x as f64, b.y as f64);
        let (a, b) = correct_match(&self.fundamental, a, b);

        let Some(h) = triangulate_dlt(&self.projection.a, &self.projection.b, a, b) else {
            log::warn!("SVD failed while triangulating ({:.2}, {:.2})", a.x, a.y);
            return Point3::new(f64::NAN, f64::NAN, f64::NAN);
        };
        let w: Vector4<f64> = self.a_to_world * h;
        if w.w.abs() <= f64::EPSILON {
            log::warn!("triangulated point at infinity for ({:.2}, {:.2})", a.x, a.y);
        }
        Point3::new(w.x / w.w, w.y / w.w, w.z / w.w)
    }

    /// Triangulate the matched markers of one frame.
    pub fn triangulate_frame(
        &self,
        frame: usize,
        a: &[Point2<f32>],
        b: &[Point2<f32>],
    ) -> Result<Vec<Point3<f64>>, TriangulationError> {
        if a.len() != b.len() {
            return Err(TriangulationError::MarkerCountMismatch {
                frame,
                a: a.len(),
                b: b.len(),
            });
        }
        Ok(a.iter()
            .zip(b)
            .map(|(&pa, &pb)| self.triangulate_point(pa, pb))
            .collect())
    }

    /// Triangulate every frame of two tracks.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(frames = a.num_frames()))
    )]
    pub fn triangulate_sequence(&self, a: &Track2D, b: &Track2D) -> Result<Track3D, TriangulationError> {
        if a.num_frames() != b.num_frames() {
            return Err(TriangulationError::FrameCountMismatch {
                a: a.num_frames(),
                b: b.num_frames(),
            });
        }
        log::info!("triangulate {} frames", a.num_frames());

        let frames = a
            .frames()
            .iter()
            .zip(b.frames())
            .enumerate()
            .map(|(f, (pa, pb))| self.triangulate_frame(f, pa, pb))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Track3D::new(frames))
    }

    /// Per-frame RMS reprojection error in pixels over both cameras.
    ///
    /// `world` is re-expressed in camera A coordinates and projected with
    /// both projection matrices. Non-finite points contribute `NaN`.
    pub fn reprojection_error(
        &self,
        a: &Track2D,
        b: &Track2D,
        world: &Track3D,
    ) -> Result<Vec<f64>, TriangulationError> {
        let world_to_a = self
            .a_to_world
            .try_inverse()
            .ok_or(TriangulationError::SingularWorldTransform)?;
        if a.num_frames() != b.num_frames() || a.num_frames() != world.num_frames() {
            return Err(TriangulationError::FrameCountMismatch {
                a: a.num_frames(),
                b: b.num_frames(),
            });
        }

        let mut out = Vec::with_capacity(world.num_frames());
        for (f, pts) in world.frames().iter().enumerate() {
            let (obs_a, obs_b) = (&a.frames()[f], &b.frames()[f]);
            if obs_a.len() != pts.len() || obs_b.len() != pts.len() {
                return Err(TriangulationError::MarkerCountMismatch {
                    frame: f,
                    a: obs_a.len(),
                    b: obs_b.len(),
                });
            }
            if pts.is_empty() {
                out.push(0.0);
                continue;
            }

            let mut sum = 0.0;
            for (m, p) in pts.iter().enumerate() {
                let x = world_to_a * p.to_homogeneous();
                for (camera, obs) in [(Camera::A, obs_a[m]), (Camera::B, obs_b[m])] {
                    let h = self.projection[camera] * x;
                    let dx = h.x / h.z - obs.x as f64;
                    let dy = h.y / h.z - obs.y as f64;
                    sum += dx * dx + dy * dy;
                }
            }
            out.push((sum / (2 * pts.len()) as f64).sqrt());
        }
        Ok(out)
    }
}
