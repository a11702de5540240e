use crate::correspondence::{CorrespondenceError, CorrespondenceResolver, EpipolarPairResolver};
use crate::frames::{frame_source_at, FrameSource, FrameSourceError};
use crate::markers::{CsvMarkerSource, MarkerSource};
use crate::subpix::{refine_subpix, SubPixParams};
use marker_motion_core::{
    undistort_image, CalibrationData, Camera, CameraIndexError, CameraPair, GrayImage, MatrixError,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum SequenceError {
    #[error("failed to load frames of {camera}")]
    Frames {
        camera: Camera,
        #[source]
        source: FrameSourceError,
    },
    #[error("failed to load markers of {camera}")]
    Markers {
        camera: Camera,
        #[source]
        source: MatrixError,
    },
    #[error("both cameras must have the same number of frames (camera A: {a}, camera B: {b})")]
    FrameCountMismatch { a: usize, b: usize },
    #[error("both cameras must have the same number of markers (camera A: {a}, camera B: {b})")]
    MarkerCountMismatch { a: usize, b: usize },
    #[error(transparent)]
    Correspondence(#[from] CorrespondenceError),
}

/// File names inside a sequence folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceLayout {
    /// Frame directory of camera A.
    pub frames_a: String,
    pub frames_b: String,
    /// Initial markers of camera A.
    pub markers_a: String,
    pub markers_b: String,
}

impl Default for SequenceLayout {
    fn default() -> Self {
        Self {
            frames_a: "MarkerSequence_1".to_string(),
            frames_b: "MarkerSequence_2".to_string(),
            markers_a: "markers1.csv".to_string(),
            markers_b: "markers2.csv".to_string(),
        }
    }
}

impl SequenceLayout {
    pub fn frames_dir(&self, camera: Camera) -> &str {
        match camera {
            Camera::A => &self.frames_a,
            Camera::B => &self.frames_b,
        }
    }

    pub fn markers_file(&self, camera: Camera) -> &str {
        match camera {
            Camera::A => &self.markers_a,
            Camera::B => &self.markers_b,
        }
    }
}

/// Synchronized, undistorted frames of both cameras plus their initial
/// markers, refined to sub-pixel accuracy and sorted so that marker `i`
/// is the same physical marker in both cameras.
#[derive(Clone, Debug)]
pub struct SequencePair {
    calibration: Arc<CalibrationData>,
    frames: CameraPair<Vec<GrayImage>>,
    markers: CameraPair<Vec<Point2<f32>>>,
}

impl SequencePair {
    /// Load a sequence folder with the default layout and parameters.
    pub fn load_dir(
        folder: impl AsRef<Path>,
        calibration: Arc<CalibrationData>,
    ) -> Result<Self, SequenceError> {
        Self::load_dir_with(
            folder,
            calibration,
            &SequenceLayout::default(),
            &SubPixParams::default(),
        )
    }

    pub fn load_dir_with(
        folder: impl AsRef<Path>,
        calibration: Arc<CalibrationData>,
        layout: &SequenceLayout,
        subpix: &SubPixParams,
    ) -> Result<Self, SequenceError> {
        let folder = folder.as_ref();
        log::info!("load sequence data from {}", folder.display());

        let frame_sources = CameraPair::new((), ())
            .map(|camera, ()| frame_source_at(folder.join(layout.frames_dir(camera))));
        let marker_sources = CameraPair::new((), ())
            .map(|camera, ()| CsvMarkerSource::new(folder.join(layout.markers_file(camera))));

        Self::from_sources(
            calibration,
            frame_sources.as_ref().map(|_, s| &**s),
            marker_sources.as_ref().map(|_, s| s as &dyn MarkerSource),
            subpix,
            &EpipolarPairResolver,
        )
    }

    /// Assemble a sequence from arbitrary sources.
    ///
    /// Frame counts are compared before any marker source is read.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all)
    )]
    pub fn from_sources(
        calibration: Arc<CalibrationData>,
        frame_sources: CameraPair<&dyn FrameSource>,
        marker_sources: CameraPair<&dyn MarkerSource>,
        subpix: &SubPixParams,
        resolver: &dyn CorrespondenceResolver,
    ) -> Result<Self, SequenceError> {
        let frames = frame_sources.try_map(|camera, source| {
            let raw = source
                .load_frames()
                .map_err(|source| SequenceError::Frames { camera, source })?;
            if raw.is_empty() {
                return Err(SequenceError::Frames {
                    camera,
                    source: FrameSourceError::Empty(camera.to_string()),
                });
            }
            Ok(undistort_all(raw, &calibration, camera))
        })?;
        if frames.a.len() != frames.b.len() {
            return Err(SequenceError::FrameCountMismatch {
                a: frames.a.len(),
                b: frames.b.len(),
            });
        }
        log::info!("loaded {} frames per camera", frames.a.len());

        let mut markers = marker_sources.try_map(|camera, source| {
            let mut markers = source
                .load_markers()
                .map_err(|source| SequenceError::Markers { camera, source })?;
            if let Some(first) = frames[camera].first() {
                refine_subpix(&first.view(), &mut markers, subpix);
            }
            Ok::<_, SequenceError>(markers)
        })?;
        if markers.a.len() != markers.b.len() {
            return Err(SequenceError::MarkerCountMismatch {
                a: markers.a.len(),
                b: markers.b.len(),
            });
        }

        resolver.resolve(&calibration.fundamental(), &markers.a, &mut markers.b)?;
        log::info!("{} markers per camera after correspondence sorting", markers.a.len());

        Ok(Self {
            calibration,
            frames,
            markers,
        })
    }

    pub fn calibration(&self) -> &Arc<CalibrationData> {
        &self.calibration
    }

    pub fn num_frames(&self) -> usize {
        self.frames.a.len()
    }

    pub fn num_markers(&self) -> usize {
        self.markers.a.len()
    }

    pub fn frames(&self, camera: Camera) -> &[GrayImage] {
        &self.frames[camera]
    }

    /// Frames by numeric camera index (0 or 1).
    pub fn frames_at(&self, index: usize) -> Result<&[GrayImage], CameraIndexError> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// An owned copy of the camera's sorted initial markers.
    pub fn markers(&self, camera: Camera) -> Vec<Point2<f32>> {
        self.markers[camera].clone()
    }

    pub fn markers_at(&self, index: usize) -> Result<Vec<Point2<f32>>, CameraIndexError> {
        self.markers.get(index).cloned()
    }
}

fn undistort_all(raw: Vec<GrayImage>, calibration: &CalibrationData, camera: Camera) -> Vec<GrayImage> {
    let dist = calibration.distortion(camera);
    if dist.is_zero() {
        return raw;
    }
    let k = calibration.intrinsics(camera);
    log::debug!("undistorting {} frames of {camera}", raw.len());
    raw.iter()
        .map(|frame| undistort_image(&frame.view(), &k, &dist))
        .collect()
}
